//! Data model: path patterns, capabilities, rules, and policies.
//!
//! Wildcards: `+` anywhere denotes one-or-more characters from the literal
//! alphabet (excluding `/`, enforcing single-segment matching); a trailing
//! `*` denotes zero-or-more characters including `/`. A `*` that is not the
//! final character of the pattern is treated as a literal — this is the
//! policy syntax's own contract, not a defect of the compiler in
//! [`crate::prc`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PatternError, PolicyError};

/// A single-segment wildcard: one-or-more literal-alphabet characters,
/// never `/`.
pub const SEGMENT_WILDCARD: char = '+';

/// A multi-segment wildcard, only meaningful as the final character.
pub const SUFFIX_WILDCARD: char = '*';

fn is_literal_alphabet(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/')
}

/// A wildcard path pattern over the alphabet `[a-zA-Z0-9\-_./]` plus the
/// wildcard markers `+` and trailing `*`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathPattern(String);

impl PathPattern {
    /// Validate and wrap a pattern string.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Empty`] for an empty string, or
    /// [`PatternError::InvalidChar`] if any character falls outside the
    /// declared alphabet `{lowercase, uppercase, digits, -, _, ., /, +, *}`.
    pub fn new(pattern: impl Into<String>) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        for (index, ch) in pattern.char_indices() {
            if !is_literal_alphabet(ch) && ch != SEGMENT_WILDCARD && ch != SUFFIX_WILDCARD {
                return Err(PatternError::InvalidChar { pattern, index, ch });
            }
        }
        Ok(Self(pattern))
    }

    /// Borrow the underlying pattern string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this pattern ends in the multi-segment wildcard.
    #[must_use]
    pub fn has_trailing_wildcard(&self) -> bool {
        self.0.ends_with(SUFFIX_WILDCARD)
    }

    /// Byte offset of the first wildcard marker (`+` or a trailing `*`),
    /// or `None` if the pattern has no wildcards. An interior `*` is not a
    /// wildcard marker — it is literal, per this type's documented
    /// contract — so it never counts here.
    #[must_use]
    pub fn first_wildcard_index(&self) -> Option<usize> {
        let plus = self.0.find(SEGMENT_WILDCARD);
        let trailing_star = if self.has_trailing_wildcard() {
            Some(self.0.len() - 1)
        } else {
            None
        };
        match (plus, trailing_star) {
            (Some(p), Some(s)) => Some(p.min(s)),
            (Some(p), None) => Some(p),
            (None, Some(s)) => Some(s),
            (None, None) => None,
        }
    }

    /// Count of `+` segment wildcards in the pattern.
    #[must_use]
    pub fn segment_wildcard_count(&self) -> usize {
        self.0.matches(SEGMENT_WILDCARD).count()
    }

    /// Length of the pattern's literal text, i.e. the whole string minus
    /// the wildcard markers (`+` occurrences and a trailing `*`).
    #[must_use]
    pub fn literal_len(&self) -> usize {
        let mut len = self.0.chars().filter(|&c| c != SEGMENT_WILDCARD).count();
        if self.has_trailing_wildcard() {
            len -= 1;
        }
        len
    }
}

impl TryFrom<String> for PathPattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PathPattern> for String {
    fn from(value: PathPattern) -> Self {
        value.0
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A permitted action on a path, or the distinguished `deny` veto marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Read a secret.
    Read,
    /// Write (create or overwrite) a secret.
    Write,
    /// Delete a secret.
    Delete,
    /// List keys under a prefix.
    List,
    /// Update an existing secret.
    Update,
    /// Create a new secret.
    Create,
    /// Administrative operations.
    Sudo,
    /// Explicit veto — overrides all grants on a matching path.
    Deny,
}

impl Capability {
    /// The string this capability serializes to, used when building the
    /// SMT formula's capability-equality literals.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Delete => "delete",
            Capability::List => "list",
            Capability::Update => "update",
            Capability::Create => "create",
            Capability::Sudo => "sudo",
            Capability::Deny => "deny",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single access rule: a pattern paired with its granted capabilities.
///
/// `deny` may coexist with other capabilities in the same rule; it is
/// still treated as a separate semantic marker when the policy formula is
/// built (see [`crate::pfb`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// The path pattern this rule matches.
    pub pattern: PathPattern,
    /// The capabilities granted (or denied) on matching paths.
    pub capabilities: Vec<Capability>,
}

/// A policy: a mapping from path patterns to capability sets.
///
/// Stored internally as a sorted map so that construction is
/// deterministic regardless of the order rules were supplied in; the
/// [`crate::rpo`] total order is applied separately, at formula-build
/// time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Policy {
    rules: BTreeMap<PathPattern, Vec<Capability>>,
}

impl Policy {
    /// Build a policy from pattern/capability pairs, validating every
    /// rule.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::EmptyCapabilities`] if any rule's capability
    /// list is empty — the safer reading of an ambiguous source format
    /// (see `DESIGN.md`'s resolution of this spec's Open Question).
    pub fn new(
        rules: impl IntoIterator<Item = (PathPattern, Vec<Capability>)>,
    ) -> Result<Self, PolicyError> {
        let mut map = BTreeMap::new();
        for (pattern, capabilities) in rules {
            if capabilities.is_empty() {
                return Err(PolicyError::EmptyCapabilities {
                    pattern: pattern.into(),
                });
            }
            map.insert(pattern, capabilities);
        }
        Ok(Self { rules: map })
    }

    /// Iterate the policy's rules in an arbitrary but stable order. Callers
    /// needing priority order must go through [`crate::rpo`].
    pub fn rules(&self) -> impl Iterator<Item = Rule> + '_ {
        self.rules.iter().map(|(pattern, capabilities)| Rule {
            pattern: pattern.clone(),
            capabilities: capabilities.clone(),
        })
    }

    /// Number of rules in the policy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the policy has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'de> Deserialize<'de> for Policy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: BTreeMap<String, Vec<Capability>> = BTreeMap::deserialize(deserializer)?;
        let mut rules = Vec::with_capacity(raw.len());
        for (pattern, capabilities) in raw {
            let pattern = PathPattern::new(pattern).map_err(serde::de::Error::custom)?;
            rules.push((pattern, capabilities));
        }
        Policy::new(rules).map_err(serde::de::Error::custom)
    }
}
