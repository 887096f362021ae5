//! Path-to-Regex Compiler (PRC).
//!
//! Maps a single wildcard [`PathPattern`] to a regular expression in Z3's
//! theory of regular expressions (`z3::ast::Regex`), so that path
//! membership can later be asserted as `str.in_re` constraints by
//! [`crate::pfb`].

use z3::ast::Regex;
use z3::Context;

use crate::pattern::PathPattern;

enum Token {
    Literal(String),
    SegmentWildcard,
    SuffixWildcard,
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let last = chars.len().saturating_sub(1);
    let mut tokens = Vec::new();
    let mut literal = String::new();
    for (i, &ch) in chars.iter().enumerate() {
        if ch == '+' {
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::SegmentWildcard);
        } else if ch == '*' && i == last {
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::SuffixWildcard);
        } else {
            literal.push(ch);
        }
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

/// `[a-zA-Z0-9\-_.]`, the literal alphabet with `/` excluded — the class a
/// `+` segment wildcard matches one-or-more of.
fn segment_class<'ctx>(ctx: &'ctx Context) -> Regex<'ctx> {
    Regex::union(
        ctx,
        &[
            &Regex::range(ctx, &'a', &'z'),
            &Regex::range(ctx, &'A', &'Z'),
            &Regex::range(ctx, &'0', &'9'),
            &Regex::literal(ctx, "-"),
            &Regex::literal(ctx, "_"),
            &Regex::literal(ctx, "."),
        ],
    )
}

/// The segment class plus `/`, the class a trailing `*` matches zero-or-more of.
fn suffix_class<'ctx>(ctx: &'ctx Context) -> Regex<'ctx> {
    Regex::union(ctx, &[&segment_class(ctx), &Regex::literal(ctx, "/")])
}

/// Compile a validated path pattern into a Z3 regular expression.
///
/// A `+` anywhere in the pattern becomes `[literal-alphabet]+` (excluding
/// `/`, enforcing single-segment matching). A trailing `*` becomes
/// `[literal-alphabet/]*`. Any other character, and any `*` that is not
/// the pattern's final character, is emitted as a literal.
pub fn compile<'ctx>(ctx: &'ctx Context, pattern: &PathPattern) -> Regex<'ctx> {
    let tokens = tokenize(pattern.as_str());
    let mut fragments: Vec<Regex<'ctx>> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let fragment = match token {
            Token::Literal(s) => Regex::literal(ctx, &s),
            Token::SegmentWildcard => segment_class(ctx).plus(),
            Token::SuffixWildcard => suffix_class(ctx).star(),
        };
        fragments.push(fragment);
    }

    match fragments.len() {
        // Unreachable in practice: PathPattern::new rejects the empty
        // string, so tokenize() always yields at least one token.
        0 => Regex::literal(ctx, ""),
        1 => fragments.swap_remove(0),
        _ => {
            let refs: Vec<&Regex<'ctx>> = fragments.iter().collect();
            Regex::concat(ctx, &refs)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pattern::PathPattern;
    use z3::ast::{Bool, String as AstString};
    use z3::{Config, Solver};

    fn matches(pattern: &str, candidate: &str) -> bool {
        let cfg = Config::new();
        let ctx = Context::new(&cfg);
        let pattern = PathPattern::new(pattern).unwrap();
        let regex = compile(&ctx, &pattern);
        let candidate_lit = AstString::from_str(&ctx, candidate).expect("no NUL bytes");
        let solver = Solver::new(&ctx);
        let membership: Bool = candidate_lit.regex_matches(&regex);
        solver.assert(&membership);
        matches!(solver.check(), z3::SatResult::Sat)
    }

    #[test]
    fn exact_literal_matches_only_itself() {
        assert!(matches("secret/app/prod", "secret/app/prod"));
        assert!(!matches("secret/app/prod", "secret/app/prod2"));
    }

    #[test]
    fn trailing_star_matches_descendants() {
        assert!(matches("secret/app/*", "secret/app/"));
        assert!(matches("secret/app/*", "secret/app/db"));
        assert!(matches("secret/app/*", "secret/app/db/nested"));
        assert!(!matches("secret/app/*", "secret/other"));
    }

    #[test]
    fn segment_wildcard_does_not_cross_slash() {
        assert!(matches("secret/app/+", "secret/app/db"));
        assert!(!matches("secret/app/+", "secret/app/db/nested"));
        assert!(!matches("secret/app/+", "secret/app/"));
    }

    #[test]
    fn interior_star_is_literal() {
        assert!(matches("secret/*/app", "secret/*/app"));
        assert!(!matches("secret/*/app", "secret/x/app"));
    }
}
