//! The per-method record of the reference graph.

use rustc_hash::FxHashSet;

use crate::insn::Insn;
use crate::model::{ClassId, FieldId, MethodAccess, MethodId};

/// A single method in the environment arena.
#[derive(Debug)]
pub struct MethodDef {
    /// Owning class.
    pub owner: ClassId,
    /// Method name (`<init>` for constructors, `<clinit>` for class initializers).
    pub name: String,
    /// Method descriptor.
    pub desc: String,
    /// Access flags.
    pub access: MethodAccess,
    /// Resolved instruction sequence; empty for abstract and native methods
    /// and for methods of synthetic classes.
    pub insns: Vec<Insn>,
    /// Return type.
    pub ret: ClassId,
    /// Argument types, in order.
    pub args: Vec<ClassId>,
    /// Methods that invoke this method.
    pub in_refs: Vec<MethodId>,
    /// Methods this method invokes.
    pub out_refs: Vec<MethodId>,
    /// Fields this method reads.
    pub field_reads: Vec<FieldId>,
    /// Fields this method writes.
    pub field_writes: Vec<FieldId>,
    /// Classes this method references as types from its code.
    pub class_refs: Vec<ClassId>,
    /// Methods in ancestor and interface classes with equal signature that
    /// this method overrides (non-private, non-static on both ends).
    pub overrides: Vec<MethodId>,
    /// String constants appearing in the body.
    pub string_constants: FxHashSet<String>,
    /// Integer constants appearing in the body.
    pub int_constants: FxHashSet<i32>,
    /// Long constants appearing in the body.
    pub long_constants: FxHashSet<i64>,
    /// Float constants (bit patterns) appearing in the body.
    pub float_constants: FxHashSet<u32>,
    /// Double constants (bit patterns) appearing in the body.
    pub double_constants: FxHashSet<u64>,
}

impl MethodDef {
    /// Returns true if this method is static.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access.contains(MethodAccess::STATIC)
    }

    /// Returns true if this method is private.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.access.contains(MethodAccess::PRIVATE)
    }

    /// Returns true if this method is a constructor.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    /// Returns true if this method is the class initializer.
    #[must_use]
    pub fn is_class_initializer(&self) -> bool {
        self.name == "<clinit>"
    }

    /// Returns true if a body is available for instruction-level comparison.
    #[must_use]
    pub fn has_body(&self) -> bool {
        !self.insns.is_empty()
    }
}
