//! Escalation Solver (ES).
//!
//! Composes the current and proposed policies' formulas into the
//! escalation query `φ_new ∧ ¬φ_current`, discharges it via Z3, and
//! extracts a witness `(path, capability)` when satisfiable. Each call
//! owns one fresh [`Context`]/[`Solver`] pair end to end; nothing here is
//! shared across concurrent checks (see `SPEC_FULL.md` §5).

use z3::ast::{Ast, String as AstString};
use z3::{Config, Context, SatResult, Solver};

use crate::error::SolverError;
use crate::pattern::Policy;
use crate::pfb;

/// A concrete `(path, capability)` pair admitted by the new policy but
/// not the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    /// The witness path.
    pub path: String,
    /// The witness capability.
    pub capability: String,
}

/// Textual rendering of both policies' formulas, for diagnostics.
#[derive(Debug, Clone)]
pub struct FormulaDiagnostics {
    /// S-expression rendering of `φ_current`.
    pub current_formula_text: String,
    /// S-expression rendering of `φ_new`.
    pub new_formula_text: String,
}

/// The full outcome of one escalation check.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// `Some` iff an escalation exists.
    pub witness: Option<Witness>,
    /// Rendered formula text for both policies.
    pub diagnostics: FormulaDiagnostics,
}

/// Discharge the escalation query for `current` vs `new`.
///
/// `timeout_ms`, if set, bounds the solver's resource usage; exceeding it
/// surfaces as [`SolverError::Unknown`] rather than silently blocking.
///
/// # Errors
///
/// Returns [`SolverError::Unknown`] if the solver cannot decide within its
/// resource limits, or [`SolverError::Internal`] if a `sat` result yields
/// no usable model (an implementation defect, not an expected outcome).
pub fn check(
    current: &Policy,
    new: &Policy,
    timeout_ms: Option<u32>,
) -> Result<CheckOutcome, SolverError> {
    let mut config = Config::new();
    if let Some(ms) = timeout_ms {
        config.set_param_value("timeout", &ms.to_string());
    }
    let ctx = Context::new(&config);

    let path = AstString::fresh_const(&ctx, "path");
    let cap = AstString::fresh_const(&ctx, "cap");

    let current_formula = pfb::build(&ctx, current, &path, &cap);
    let new_formula = pfb::build(&ctx, new, &path, &cap);
    let diagnostics = FormulaDiagnostics {
        current_formula_text: current_formula.formula.to_string(),
        new_formula_text: new_formula.formula.to_string(),
    };

    let solver = Solver::new(&ctx);
    solver.assert(&new_formula.formula);
    solver.assert(&current_formula.formula.not());

    let start = std::time::Instant::now();
    let result = solver.check();
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match result {
        SatResult::Unsat => {
            tracing::debug!(elapsed_ms, verdict = "no_escalation", "escalation check complete");
            Ok(CheckOutcome {
                witness: None,
                diagnostics,
            })
        }
        SatResult::Sat => {
            let model = solver.get_model().ok_or_else(|| SolverError::Internal {
                detail: "solver reported sat but produced no model".to_owned(),
            })?;
            let path_value = model
                .eval(&path, true)
                .and_then(|v| v.as_string())
                .ok_or_else(|| SolverError::Internal {
                    detail: "model did not assign a concrete string to `path`".to_owned(),
                })?;
            let cap_value = model
                .eval(&cap, true)
                .and_then(|v| v.as_string())
                .ok_or_else(|| SolverError::Internal {
                    detail: "model did not assign a concrete string to `cap`".to_owned(),
                })?;
            tracing::debug!(elapsed_ms, verdict = "escalation", "escalation check complete");
            Ok(CheckOutcome {
                witness: Some(Witness {
                    path: path_value,
                    capability: cap_value,
                }),
                diagnostics,
            })
        }
        SatResult::Unknown => {
            let reason = solver.get_reason_unknown();
            tracing::debug!(elapsed_ms, verdict = "unknown", reason = ?reason, "escalation check complete");
            Err(SolverError::Unknown { reason })
        }
    }
}
