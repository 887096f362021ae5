//! Policy privilege-escalation checker, core.
//!
//! Given a *current* and a *proposed* access policy for a secrets-management
//! system, proves or refutes: does the new policy admit any `(path,
//! capability)` pair the current policy does not? When an escalation
//! exists, [`check`] returns a concrete witness.
//!
//! The core is four pieces, leaves first:
//!
//! - [`prc`] — Path-to-Regex Compiler: wildcard pattern → Z3 regular expression.
//! - [`rpo`] — Rule Priority Oracle: the total order selecting which matching
//!   pattern governs a path.
//! - [`pfb`] — Policy Formula Builder: a policy's rules → `φ_P(path, cap)`.
//! - [`solver`] (private, re-exported result types) — Escalation Solver:
//!   discharges `φ_new ∧ ¬φ_current` via Z3 and extracts a witness.
//!
//! This crate has no knowledge of policy source-text formats, UI, or
//! persistence — those are external collaborators. See `SPEC_FULL.md` and
//! `DESIGN.md` in the workspace root for the full design.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod pattern;
pub mod pfb;
pub mod prc;
pub mod rpo;
mod solver;

pub use error::{CheckError, PatternError, PolicyError, SolverError};
pub use pattern::{Capability, PathPattern, Policy, Rule};
pub use solver::{FormulaDiagnostics, Witness};

/// The two policy snapshots under comparison.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    /// The policy currently in effect.
    pub current: Policy,
    /// The proposed replacement policy.
    pub new: Policy,
}

/// The result of one escalation check: either a proof of safety, or a
/// concrete witness disproving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationResult {
    /// No `(path, capability)` pair is admitted by the new policy but not
    /// the current one.
    NoEscalation,
    /// A concrete witness admitted by the new policy but not the current one.
    Escalation {
        /// The witness path.
        path: String,
        /// The witness capability.
        capability: String,
    },
}

impl EscalationResult {
    /// Whether this result represents an escalation.
    #[must_use]
    pub fn is_escalation(&self) -> bool {
        matches!(self, EscalationResult::Escalation { .. })
    }
}

/// Tunable, ambient knobs around the pure `check` query — the core
/// algorithm itself takes no configuration (see `SPEC_FULL.md` §4.7).
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Bounds the solver's resource usage in milliseconds; exceeding it
    /// surfaces as [`SolverError::Unknown`] instead of blocking forever.
    pub timeout_ms: Option<u32>,
    /// Whether to render and return both policies' formula text.
    pub include_diagnostics: bool,
}

/// Response returned by [`check`].
#[derive(Debug, Clone)]
pub struct CheckResponse {
    /// The verdict.
    pub result: EscalationResult,
    /// Present only when [`CheckOptions::include_diagnostics`] was set.
    pub diagnostics: Option<FormulaDiagnostics>,
}

/// Check whether `request.new` admits a `(path, capability)` pair that
/// `request.current` does not.
///
/// # Errors
///
/// Returns [`SolverError::Unknown`] if the solver cannot decide within its
/// resource limits, or [`SolverError::Internal`] on an implementation
/// defect (a `sat` result with no usable model).
pub fn check(request: &CheckRequest) -> Result<CheckResponse, CheckError> {
    check_with_options(request, CheckOptions::default())
}

/// As [`check`], with ambient solver/diagnostics options.
///
/// # Errors
///
/// See [`check`].
pub fn check_with_options(
    request: &CheckRequest,
    options: CheckOptions,
) -> Result<CheckResponse, CheckError> {
    let outcome = solver::check(&request.current, &request.new, options.timeout_ms)?;
    let result = match outcome.witness {
        Some(w) => EscalationResult::Escalation {
            path: w.path,
            capability: w.capability,
        },
        None => EscalationResult::NoEscalation,
    };
    let diagnostics = options.include_diagnostics.then_some(outcome.diagnostics);
    Ok(CheckResponse { result, diagnostics })
}

/// Convenience constructor: build both policies from raw rule iterators
/// and check in one call, surfacing [`PolicyError`] for malformed input
/// without ever invoking the solver.
///
/// # Errors
///
/// Returns [`CheckError::Policy`] if either policy's rules are malformed
/// (see [`Policy::new`]), or the solver errors described in [`check`].
pub fn check_policies(
    current_rules: impl IntoIterator<Item = (PathPattern, Vec<Capability>)>,
    new_rules: impl IntoIterator<Item = (PathPattern, Vec<Capability>)>,
) -> Result<CheckResponse, CheckError> {
    let current = Policy::new(current_rules)?;
    let new = Policy::new(new_rules)?;
    check(&CheckRequest { current, new })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn policy(rules: &[(&str, &[Capability])]) -> Policy {
        Policy::new(
            rules
                .iter()
                .map(|(p, c)| (PathPattern::new(*p).unwrap(), c.to_vec())),
        )
        .unwrap()
    }

    #[test]
    fn identical_policy_never_escalates() {
        let p = policy(&[("secret/app/*", &[Capability::Read])]);
        let response = check(&CheckRequest {
            current: p.clone(),
            new: p,
        })
        .unwrap();
        assert_eq!(response.result, EscalationResult::NoEscalation);
    }

    #[test]
    fn widening_literal_to_wildcard_escalates() {
        let current = policy(&[("secret/app/prod", &[Capability::Read])]);
        let new = policy(&[("secret/app/*", &[Capability::Read])]);
        let response = check(&CheckRequest { current, new }).unwrap();
        match response.result {
            EscalationResult::Escalation { path, capability } => {
                assert!(path.starts_with("secret/app/"));
                assert_ne!(path, "secret/app/prod");
                assert_eq!(capability, "read");
            }
            EscalationResult::NoEscalation => panic!("expected an escalation"),
        }
    }

    #[test]
    fn adding_a_capability_escalates() {
        let current = policy(&[("secret/app/db", &[Capability::Read])]);
        let new = policy(&[("secret/app/db", &[Capability::Read, Capability::Write])]);
        let response = check(&CheckRequest { current, new }).unwrap();
        assert_eq!(
            response.result,
            EscalationResult::Escalation {
                path: "secret/app/db".to_owned(),
                capability: "write".to_owned(),
            }
        );
    }

    #[test]
    fn narrowing_does_not_escalate() {
        let current = policy(&[("secret/app/*", &[Capability::Read])]);
        let new = policy(&[("secret/app/db", &[Capability::Read])]);
        let response = check(&CheckRequest { current, new }).unwrap();
        assert_eq!(response.result, EscalationResult::NoEscalation);
    }

    #[test]
    fn removing_a_deny_rule_escalates() {
        let current = policy(&[
            ("secret/app/cookiebot/*", &[Capability::Read]),
            ("secret/app/cookiebot/admin", &[Capability::Deny]),
        ]);
        let new = policy(&[("secret/app/cookiebot/*", &[Capability::Read])]);
        let response = check(&CheckRequest { current, new }).unwrap();
        assert_eq!(
            response.result,
            EscalationResult::Escalation {
                path: "secret/app/cookiebot/admin".to_owned(),
                capability: "read".to_owned(),
            }
        );
    }

    #[test]
    fn deny_added_to_close_an_already_implied_gap_does_not_escalate() {
        let rules: [(&str, &[Capability]); 3] = [
            ("secret/users", &[Capability::Read]),
            ("secret/posts/*", &[Capability::Read, Capability::Write]),
            ("secret/posts/admin", &[Capability::Deny]),
        ];
        let current = policy(&rules);
        let mut new_rules = rules.to_vec();
        new_rules.push(("secret/posts/ad", &[Capability::Read]));
        let new = policy(&new_rules);
        let response = check(&CheckRequest { current, new }).unwrap();
        assert_eq!(response.result, EscalationResult::NoEscalation);
    }

    #[test]
    fn segment_wildcard_widened_to_suffix_wildcard_escalates() {
        let current = policy(&[("secret/app/+", &[Capability::Read])]);
        let new = policy(&[("secret/app/*", &[Capability::Read])]);
        let response = check(&CheckRequest { current, new }).unwrap();
        match response.result {
            EscalationResult::Escalation { path, capability } => {
                assert!(path["secret/app/".len()..].contains('/'));
                assert_eq!(capability, "read");
            }
            EscalationResult::NoEscalation => panic!("expected an escalation"),
        }
    }

    #[test]
    fn diagnostics_present_only_when_requested() {
        let p = policy(&[("secret/app/*", &[Capability::Read])]);
        let request = CheckRequest {
            current: p.clone(),
            new: p,
        };
        let plain = check(&request).unwrap();
        assert!(plain.diagnostics.is_none());

        let with_diagnostics = check_with_options(
            &request,
            CheckOptions {
                timeout_ms: None,
                include_diagnostics: true,
            },
        )
        .unwrap();
        assert!(with_diagnostics.diagnostics.is_some());
    }
}
