//! Error types for `escalation-core`.
//!
//! Each variant carries enough context to diagnose the problem without a
//! debugger. Input errors (malformed patterns, empty capability lists) are
//! reported before the solver is ever invoked; solver errors are reported
//! after resource cleanup. No partial result is ever returned alongside an
//! error.

/// Errors from compiling or validating a [`crate::pattern::PathPattern`].
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// The pattern string is empty.
    #[error("path pattern must not be empty")]
    Empty,

    /// The pattern contains a character outside the declared alphabet.
    #[error("path pattern '{pattern}' contains invalid character '{ch}' at byte {index}")]
    InvalidChar {
        /// The offending pattern.
        pattern: String,
        /// Byte offset of the invalid character.
        index: usize,
        /// The invalid character itself.
        ch: char,
    },
}

/// Errors from validating a [`crate::pattern::Policy`].
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// A rule's capability list was empty.
    ///
    /// The source policy format is ambiguous about whether an empty list
    /// means "no grant" or "implicit deny"; this crate takes the safer
    /// reading and rejects it outright (see `DESIGN.md`).
    #[error("rule for pattern '{pattern}' has an empty capability list")]
    EmptyCapabilities {
        /// The pattern whose capability list was empty.
        pattern: String,
    },

    /// A pattern failed validation.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Errors from the SMT decision procedure.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The solver returned `unknown` (e.g. resource limit or timeout
    /// reached before a verdict could be proven). Distinct from
    /// `NoEscalation` — an `unknown` result is not a proof of safety.
    #[error("solver returned unknown{}", reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    Unknown {
        /// Optional solver-provided reason string.
        reason: Option<String>,
    },

    /// An internal solver failure unrelated to satisfiability (e.g. a
    /// malformed AST node, or the solver process/library misbehaving).
    #[error("internal solver error: {detail}")]
    Internal {
        /// Description of the internal failure.
        detail: String,
    },
}

/// Top-level error returned by [`crate::check`].
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// One or both input policies failed validation.
    #[error("invalid policy: {0}")]
    Policy(#[from] PolicyError),

    /// The SMT solver could not produce a verdict.
    #[error("solver error: {0}")]
    Solver(#[from] SolverError),
}
