//! Class model and reference graph.
//!
//! This module provides the in-memory data structures the matching engine operates
//! on: two class groups backed by a shared arena, the hierarchy and cross-reference
//! graphs computed over them, and the mutable match table.
//!
//! # Architecture
//!
//! All symbols live in arenas owned by [`MatchEnv`]; cross-references between
//! symbols are typed indices ([`ClassId`], [`MethodId`], [`FieldId`]) rather than
//! owning pointers. This keeps the pervasive cycles of the reference graph (parent
//! and children, caller and callee, reader and owner) trivially representable and
//! makes concurrent read-only access during a matching pass safe by construction.
//!
//! The match back-pointers - the only state the engine mutates - are split out into
//! [`Matches`], a parallel table of nullable indices. Ranking tasks read it through
//! a shared borrow; the orchestrator commits through an exclusive borrow after all
//! tasks of a pass have joined.
//!
//! # Key Components
//!
//! - [`EnvBuilder`] - Parser-facing construction and reference-graph finalization
//! - [`MatchEnv`] - The immutable arena: classes, methods, fields, both groups
//! - [`Matches`] - The class/method/field match table
//! - [`Matchable`] - Uniform capability surface over the three symbol kinds
//! - [`resolve`] - Field and method resolution across the class hierarchy

mod builder;
mod class;
mod field;
mod flags;
mod group;
mod matchable;
mod method;
pub mod resolve;

pub use builder::{ClassSpec, EnvBuilder, FieldSpec, MethodSpec};
pub use class::ClassDef;
pub use field::FieldDef;
pub use flags::{ClassAccess, FieldAccess, MethodAccess};
pub use group::{MatchEnv, Matches};
pub use matchable::{is_name_obfuscated, Matchable, SymbolKind};
pub use method::MethodDef;

/// Identifies which of the two class groups a real class belongs to.
///
/// Group `A` is the named reference artifact, group `B` the obfuscated target.
/// Synthetic classes (referenced but not loaded, e.g. platform library types)
/// belong to neither side and are shared between the groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The named reference group.
    A,
    /// The obfuscated target group.
    B,
}

impl Side {
    /// Returns the array index backing this side.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    /// Returns the opposite side.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Returns a short lowercase label for diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }
}

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Creates an id from an arena index.
            #[must_use]
            pub const fn new(index: usize) -> Self {
                Self(index as u32)
            }

            /// Returns the arena index of this id.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id! {
    /// Index of a class in the environment's class arena.
    ClassId
}

arena_id! {
    /// Index of a method in the environment's method arena.
    MethodId
}

arena_id! {
    /// Index of a field in the environment's field arena.
    FieldId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_other() {
        assert_eq!(Side::A.other(), Side::B);
        assert_eq!(Side::B.other(), Side::A);
        assert_eq!(Side::A.index(), 0);
        assert_eq!(Side::B.index(), 1);
    }

    #[test]
    fn test_arena_id_roundtrip() {
        let id = ClassId::new(42);
        assert_eq!(id.index(), 42);
        assert!(ClassId::new(1) < ClassId::new(2));
    }
}
