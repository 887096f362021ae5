//! Policy Formula Builder (PFB).
//!
//! Given a policy and two free string-sorted variables `path` and `cap`,
//! builds the boolean formula `φ_P(path, cap)` that holds exactly when the
//! policy grants `cap` on `path`. Deny is composed as a layer outside the
//! priority cascade (see [`rpo`](crate::rpo) and the module-level notes
//! below) rather than folded into it — a lower-priority deny rule that
//! overlaps a higher-priority grant still vetoes the grant.

use z3::ast::{Ast, Bool, String as AstString};
use z3::Context;

use crate::pattern::{Capability, Policy, Rule};
use crate::prc;
use crate::rpo;

/// `φ_P(path, cap)` together with enough bookkeeping to render a
/// diagnostic rendering of the formula for [`crate::CheckResponse`].
pub struct PolicyFormula<'ctx> {
    /// The built formula.
    pub formula: Bool<'ctx>,
    /// Number of rules the policy contributed (for diagnostics/logging).
    pub rule_count: usize,
    /// Number of rules carrying `deny`.
    pub deny_count: usize,
}

/// Build `φ_P(path, cap)` for `policy`.
pub fn build<'ctx>(
    ctx: &'ctx Context,
    policy: &Policy,
    path: &AstString<'ctx>,
    cap: &AstString<'ctx>,
) -> PolicyFormula<'ctx> {
    let rules: Vec<Rule> = policy.rules().collect();

    let deny_rules: Vec<&Rule> = rules
        .iter()
        .filter(|r| r.capabilities.contains(&Capability::Deny))
        .collect();
    let mut allow_rules: Vec<&Rule> = rules
        .iter()
        .filter(|r| r.capabilities.iter().any(|c| *c != Capability::Deny))
        .collect();

    tracing::trace!(
        rule_count = rules.len(),
        deny_count = deny_rules.len(),
        allow_count = allow_rules.len(),
        "building policy formula"
    );

    let is_denied = build_is_denied(ctx, path, &deny_rules);

    // Sort descending by priority so that, once folded from the back, the
    // highest-priority rule's `ite` ends up outermost (see [`rpo::compare`]).
    allow_rules.sort_by(|a, b| rpo::compare(&a.pattern, &b.pattern).reverse());
    let is_allowed = allow_rules
        .iter()
        .rev()
        .fold(Bool::from_bool(ctx, false), |fallthrough, rule| {
            let path_match = path.regex_matches(&prc::compile(ctx, &rule.pattern));
            let cap_match = build_cap_match(ctx, cap, rule);
            path_match.ite(&cap_match, &fallthrough)
        });

    let formula = Bool::and(ctx, &[&is_allowed, &is_denied.not()]);

    PolicyFormula {
        formula,
        rule_count: rules.len(),
        deny_count: deny_rules.len(),
    }
}

fn build_is_denied<'ctx>(
    ctx: &'ctx Context,
    path: &AstString<'ctx>,
    deny_rules: &[&Rule],
) -> Bool<'ctx> {
    if deny_rules.is_empty() {
        return Bool::from_bool(ctx, false);
    }
    let clauses: Vec<Bool<'ctx>> = deny_rules
        .iter()
        .map(|rule| path.regex_matches(&prc::compile(ctx, &rule.pattern)))
        .collect();
    let refs: Vec<&Bool<'ctx>> = clauses.iter().collect();
    Bool::or(ctx, &refs)
}

/// `⋁_{c in rule.capabilities, c != deny} (cap = c)`.
///
/// Every `Rule` reaching here came from `allow_rules`, which is filtered
/// to rules with at least one non-`deny` capability, so this is never
/// empty.
fn build_cap_match<'ctx>(ctx: &'ctx Context, cap: &AstString<'ctx>, rule: &Rule) -> Bool<'ctx> {
    let clauses: Vec<Bool<'ctx>> = rule
        .capabilities
        .iter()
        .filter(|c| **c != Capability::Deny)
        .map(|c| {
            let literal =
                AstString::from_str(ctx, c.as_str()).expect("capability names contain no NUL bytes");
            cap._eq(&literal)
        })
        .collect();
    let refs: Vec<&Bool<'ctx>> = clauses.iter().collect();
    Bool::or(ctx, &refs)
}
