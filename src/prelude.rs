//! # rematch Prelude
//!
//! Convenient re-exports of the types most integrations need: building an
//! environment, running the matcher, and reading the results.

/// The main error type for all rematch operations.
pub use crate::Error;

/// The result type used throughout rematch.
pub use crate::Result;

/// Environment construction and the class model.
pub use crate::model::{
    ClassId, ClassSpec, EnvBuilder, FieldId, FieldSpec, MatchEnv, Matchable, Matches, MethodId,
    MethodSpec, Side, SymbolKind,
};

/// Raw instruction forms the parser collaborator hands to the builder.
pub use crate::insn::{RawConst, RawHandle, RawInsn};

/// The engine, its configuration, and the report it produces.
pub use crate::matcher::{Matcher, MatcherConfig, MatchingStats};

/// Matching levels, for integrations that drive individual passes.
pub use crate::classifier::MatchLevel;
