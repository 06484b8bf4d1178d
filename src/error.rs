use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can
/// potentially return.
///
/// The engine itself is heuristic and never fails on a symbol it cannot pair; errors
/// are reserved for broken inputs (the parser collaborator is expected to hand over a
/// closed, well-formed reference graph) and for infrastructure failures inside a
/// matching pass.
///
/// # Error Categories
///
/// ## Input-integrity failures
/// - [`Error::DuplicateClass`] - Two classes with the same internal name in one group
/// - [`Error::DuplicateMember`] - Two members with the same name and descriptor on one class
/// - [`Error::MalformedDescriptor`] - A field or method descriptor that does not parse
/// - [`Error::BranchTargetOutOfRange`] - An instruction jumping outside its method
///
/// ## Pass execution
/// - [`Error::PassFailed`] - A worker task died inside a matching pass
/// - [`Error::ThreadPool`] - The bounded worker pool could not be constructed
#[derive(Error, Debug)]
pub enum Error {
    /// A class group contains two classes with the same internal name.
    ///
    /// Class names are the primary key within one group; the builder refuses
    /// to construct an environment where lookups would be ambiguous.
    #[error("duplicate class '{name}' in group {side}")]
    DuplicateClass {
        /// Internal name of the duplicated class.
        name: String,
        /// Group the duplicate was added to ("a" or "b").
        side: &'static str,
    },

    /// A class declares two members with the same name and descriptor.
    #[error("duplicate member {name}{desc} on class '{owner}'")]
    DuplicateMember {
        /// Internal name of the owning class.
        owner: String,
        /// Member name.
        name: String,
        /// Member descriptor.
        desc: String,
    },

    /// A field or method descriptor could not be parsed.
    ///
    /// Descriptors follow JVMS §4.3; anything else indicates the parser
    /// collaborator handed over a corrupted symbol table.
    #[error("malformed descriptor '{desc}'")]
    MalformedDescriptor {
        /// The offending descriptor string.
        desc: String,
    },

    /// A branch, switch, or increment edge points outside the method body.
    ///
    /// Branch targets are instruction indices resolved by the parser; an
    /// out-of-range index means the instruction stream is inconsistent.
    #[error("branch target {target} out of range in {owner}.{name}{desc} ({len} instructions)")]
    BranchTargetOutOfRange {
        /// Internal name of the owning class.
        owner: String,
        /// Method name.
        name: String,
        /// Method descriptor.
        desc: String,
        /// The out-of-range instruction index.
        target: usize,
        /// Number of instructions in the method body.
        len: usize,
    },

    /// A worker task failed inside a matching pass.
    ///
    /// The orchestrator joins the remaining tasks of the pass and discards
    /// all of its results before surfacing this error; no partial commits
    /// from the failed pass are retained.
    #[error("matching pass '{pass}' failed")]
    PassFailed {
        /// Name of the pass that failed.
        pass: &'static str,
    },

    /// The bounded worker pool could not be constructed.
    #[error("{0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
