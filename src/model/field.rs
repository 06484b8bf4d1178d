//! The per-field record of the reference graph.

use crate::insn::Const;
use crate::model::{ClassId, FieldAccess, FieldId, MethodId};

/// A single field in the environment arena.
#[derive(Debug)]
pub struct FieldDef {
    /// Owning class.
    pub owner: ClassId,
    /// Field name.
    pub name: String,
    /// Field descriptor.
    pub desc: String,
    /// Access flags.
    pub access: FieldAccess,
    /// Declared type.
    pub ty: ClassId,
    /// Constant initializer, when the parser proved the field has a single
    /// writer assigning a constant.
    pub initializer: Option<Const>,
    /// Methods that read this field.
    pub read_refs: Vec<MethodId>,
    /// Methods that write this field.
    pub write_refs: Vec<MethodId>,
    /// Fields in ancestor classes with equal name and descriptor that this
    /// field hides.
    pub overrides: Vec<FieldId>,
}

impl FieldDef {
    /// Returns true if this field is static.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access.contains(FieldAccess::STATIC)
    }

    /// Returns true if this field is private.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.access.contains(FieldAccess::PRIVATE)
    }
}
