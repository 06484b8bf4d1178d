#![deny(missing_docs)]
#![allow(dead_code)]

//! # rematch
//!
//! A matching engine that recovers human-readable symbol names for obfuscated Java
//! bytecode. Given two parsed class groups - a *reference* artifact whose symbols are
//! already named, and a *target* artifact whose symbols were renamed to short opaque
//! identifiers - `rematch` computes a consistent, bidirectional pairing of classes,
//! methods, and fields that survives the vendor's per-revision renaming.
//!
//! # Architecture
//!
//! The engine is organized into layered modules, leaves first:
//!
//! - **Model Layer**: Arena-backed class groups with hierarchy and cross-reference
//!   graphs, the match table, and hierarchy-aware member resolution
//! - **Instruction Layer**: JVM instruction representation and the per-instruction
//!   equivalence comparator
//! - **Similarity Layer**: Count, set, matchable-set, and edit-distance comparators
//!   that account for partial matches and obfuscated names
//! - **Classifier Layer**: A registry of named, weighted scoring functions grouped
//!   by matching level, with ranking and acceptance gating
//! - **Flow Layer**: A single-method execution walker and a lockstep parallel
//!   executor used to validate candidate method pairs at bytecode level
//! - **Matcher Layer**: The top-level orchestration - seeding, per-level iterative
//!   refinement to fixpoint, conflict resolution, and statistics
//!
//! ## Key Components
//!
//! - [`crate::model::EnvBuilder`] - Parser-facing construction of a [`crate::model::MatchEnv`]
//! - [`crate::model::MatchEnv`] - The two class groups and their reference graphs
//! - [`crate::model::Matches`] - The mutable class/method/field match table
//! - [`crate::matcher::Matcher`] - Main entry point for running the engine
//! - [`crate::matcher::MatcherConfig`] - Threshold and worker-pool configuration
//! - [`crate::matcher::MatchingStats`] - The user-visible matched-symbol report
//! - [`crate::prelude`] - Convenient re-exports of commonly used types
//! - [`crate::Error`] and [`crate::Result`] - Comprehensive error handling
//!
//! # Example
//!
//! ```rust,ignore
//! use rematch::prelude::*;
//!
//! // The parser collaborator populates a builder with both artifacts...
//! let mut builder = EnvBuilder::new();
//! builder.add_class(Side::A, reference_class);
//! builder.add_class(Side::B, target_class);
//! let env = builder.build()?;
//!
//! // ...and the engine pairs them up.
//! let mut matches = env.create_matches();
//! let matcher = Matcher::new(MatcherConfig::default())?;
//! let stats = matcher.run(&env, &mut matches)?;
//! println!("{stats}");
//! # Ok::<(), rematch::Error>(())
//! ```
//!
//! # Scope
//!
//! JAR reading, the deobfuscator pre-pass, mapping-file I/O, and the command-line
//! driver are external collaborators. They feed the engine through
//! [`crate::model::EnvBuilder`] and consume its output by walking the populated
//! [`crate::model::Matches`] table.

pub mod classifier;
mod error;
pub mod flow;
pub mod insn;
pub mod matcher;
pub mod model;
pub mod prelude;
pub mod similarity;

/// The main error type for all rematch operations.
pub use error::Error;

/// Standard result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
