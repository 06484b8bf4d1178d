//! The uniform capability surface shared by classes, methods, and fields.
//!
//! The classifier framework, the matchable-set comparator, and the
//! orchestrator all operate generically over "some symbol kind with a name, a
//! reality flag, and a match slot". [`Matchable`] captures exactly that; the
//! per-kind specifics (access-flag bits, reference sets) stay on the concrete
//! definitions.

use std::fmt;
use std::hash::Hash;

use crate::model::{ClassId, FieldId, Matches, MatchEnv, MethodId, Side};
use crate::similarity;

/// The three symbol kinds the engine matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum SymbolKind {
    /// A class.
    #[strum(serialize = "classes")]
    Class,
    /// A method.
    #[strum(serialize = "methods")]
    Method,
    /// A field.
    #[strum(serialize = "fields")]
    Field,
}

/// Returns true if a symbol name looks vendor-generated.
///
/// A name is considered obfuscated iff it is at most two characters long, is
/// exactly three characters with an `aa` prefix, or carries one of the
/// deobfuscator's placeholder prefixes (`class`, `method`, `field`).
/// Non-obfuscated names survive across artifact revisions and anchor the
/// matching.
#[must_use]
pub fn is_name_obfuscated(name: &str) -> bool {
    name.len() <= 2
        || (name.len() == 3 && name.starts_with("aa"))
        || name.starts_with("class")
        || name.starts_with("method")
        || name.starts_with("field")
}

/// Capability surface over one symbol kind.
///
/// Implemented by the arena id types; every accessor borrows the environment
/// or the match table, which keeps the ids themselves `Copy` and freely
/// shareable across the worker pool.
pub trait Matchable:
    Copy + Eq + Ord + Hash + Send + Sync + fmt::Debug + Sized + 'static
{
    /// The symbol kind of this implementation.
    const KIND: SymbolKind;

    /// Returns the symbol's name.
    fn name(self, env: &MatchEnv) -> &str;

    /// Returns true if the symbol comes from a source artifact.
    fn is_real(self, env: &MatchEnv) -> bool;

    /// Returns the group the symbol belongs to, or `None` for shared synthetics.
    fn side(self, env: &MatchEnv) -> Option<Side>;

    /// Returns the symbol's matched partner, if any.
    fn get_match(self, matches: &Matches) -> Option<Self>;

    /// Records a match in both directions.
    fn set_match(a: Self, b: Self, matches: &mut Matches);

    /// Cheap filter deciding whether two symbols could ever be matched.
    ///
    /// This is the potential-equality predicate the ranking stage uses to
    /// prune candidates before any weighted scoring runs.
    fn potentially_equal(a: Self, b: Self, env: &MatchEnv, matches: &Matches) -> bool;

    /// Returns true if the symbol's name looks vendor-generated.
    fn is_name_obfuscated(self, env: &MatchEnv) -> bool {
        is_name_obfuscated(self.name(env))
    }
}

impl Matchable for ClassId {
    const KIND: SymbolKind = SymbolKind::Class;

    fn name(self, env: &MatchEnv) -> &str {
        &env.class(self).name
    }

    fn is_real(self, env: &MatchEnv) -> bool {
        env.class(self).real
    }

    fn side(self, env: &MatchEnv) -> Option<Side> {
        env.class(self).side
    }

    fn get_match(self, matches: &Matches) -> Option<Self> {
        matches.class_match(self)
    }

    fn set_match(a: Self, b: Self, matches: &mut Matches) {
        matches.set_class(a, b);
    }

    fn potentially_equal(a: Self, b: Self, env: &MatchEnv, matches: &Matches) -> bool {
        similarity::classes_potentially_equal(env, matches, a, b)
    }
}

impl Matchable for MethodId {
    const KIND: SymbolKind = SymbolKind::Method;

    fn name(self, env: &MatchEnv) -> &str {
        &env.method(self).name
    }

    fn is_real(self, env: &MatchEnv) -> bool {
        env.class(env.method(self).owner).real
    }

    fn side(self, env: &MatchEnv) -> Option<Side> {
        env.class(env.method(self).owner).side
    }

    fn get_match(self, matches: &Matches) -> Option<Self> {
        matches.method_match(self)
    }

    fn set_match(a: Self, b: Self, matches: &mut Matches) {
        matches.set_method(a, b);
    }

    fn potentially_equal(a: Self, b: Self, env: &MatchEnv, matches: &Matches) -> bool {
        similarity::methods_potentially_equal(env, matches, a, b)
    }
}

impl Matchable for FieldId {
    const KIND: SymbolKind = SymbolKind::Field;

    fn name(self, env: &MatchEnv) -> &str {
        &env.field(self).name
    }

    fn is_real(self, env: &MatchEnv) -> bool {
        env.class(env.field(self).owner).real
    }

    fn side(self, env: &MatchEnv) -> Option<Side> {
        env.class(env.field(self).owner).side
    }

    fn get_match(self, matches: &Matches) -> Option<Self> {
        matches.field_match(self)
    }

    fn set_match(a: Self, b: Self, matches: &mut Matches) {
        matches.set_field(a, b);
    }

    fn potentially_equal(a: Self, b: Self, env: &MatchEnv, matches: &Matches) -> bool {
        similarity::fields_potentially_equal(env, matches, a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_names_are_obfuscated() {
        assert!(is_name_obfuscated("a"));
        assert!(is_name_obfuscated("ab"));
        assert!(is_name_obfuscated("aaz"));
    }

    #[test]
    fn test_three_letter_names_need_aa_prefix() {
        assert!(!is_name_obfuscated("abc"));
        assert!(!is_name_obfuscated("foo"));
        assert!(is_name_obfuscated("aab"));
    }

    #[test]
    fn test_placeholder_prefixes_are_obfuscated() {
        assert!(is_name_obfuscated("class123"));
        assert!(is_name_obfuscated("method42"));
        assert!(is_name_obfuscated("field7"));
        assert!(!is_name_obfuscated("Player"));
        assert!(!is_name_obfuscated("net/example/Client"));
    }
}
