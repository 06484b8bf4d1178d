//! The per-class record of the reference graph.

use rustc_hash::FxHashSet;

use crate::model::{ClassAccess, ClassId, FieldId, MethodId, Side};

/// A single class in the environment arena.
///
/// Real classes come from one of the two source artifacts and carry full
/// bytecode-derived attributes; synthetic classes stand in for referenced but
/// unloaded types (platform library classes, primitives, array types) and are
/// shared between the groups.
///
/// All cross-references are arena ids; the derived attributes (hierarchy
/// closure, children, implementers, reference sets, constant pools) are
/// computed once by [`crate::model::EnvBuilder::build`] and never change for
/// the lifetime of an engine run.
#[derive(Debug)]
pub struct ClassDef {
    /// Internal (slash-separated) name, or the descriptor form for primitive
    /// and array stand-ins.
    pub name: String,
    /// Access flags.
    pub access: ClassAccess,
    /// Whether this class was loaded from a source artifact.
    pub real: bool,
    /// Which group a real class belongs to; `None` for shared synthetics.
    pub side: Option<Side>,
    /// Direct superclass, if any.
    pub superclass: Option<ClassId>,
    /// Directly implemented interfaces, in declaration order.
    pub interfaces: Vec<ClassId>,
    /// Classes whose direct superclass is this class.
    pub children: Vec<ClassId>,
    /// Classes that directly implement this interface.
    pub implementers: Vec<ClassId>,
    /// Hierarchy closure: this class plus all ancestors (superclasses and
    /// transitive interfaces), in DFS discovery order.
    pub hierarchy: Vec<ClassId>,
    /// Declared methods, in declaration order.
    pub methods: Vec<MethodId>,
    /// Declared fields, in declaration order.
    pub fields: Vec<FieldId>,
    /// String constants from code and field initializers.
    pub string_constants: FxHashSet<String>,
    /// Integer constants from code and field initializers.
    pub int_constants: FxHashSet<i32>,
    /// Long constants from code and field initializers.
    pub long_constants: FxHashSet<i64>,
    /// Float constants (bit patterns) from code and field initializers.
    pub float_constants: FxHashSet<u32>,
    /// Double constants (bit patterns) from code and field initializers.
    pub double_constants: FxHashSet<u64>,
    /// Classes that reference this class as a type.
    pub in_refs: Vec<ClassId>,
    /// Classes this class references as types.
    pub out_refs: Vec<ClassId>,
}

impl ClassDef {
    /// Returns true if this class is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.access.contains(ClassAccess::INTERFACE)
    }

    /// Returns true if this class is an enum.
    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.access.contains(ClassAccess::ENUM)
    }

    /// Looks up a declared method by name and descriptor.
    ///
    /// Declared methods only; use [`crate::model::resolve`] for lookups that
    /// follow the hierarchy.
    pub fn find_method(
        &self,
        env: &crate::model::MatchEnv,
        name: &str,
        desc: &str,
    ) -> Option<MethodId> {
        self.methods
            .iter()
            .copied()
            .find(|&m| env.method(m).name == name && env.method(m).desc == desc)
    }

    /// Looks up a declared field by name and descriptor.
    pub fn find_field(
        &self,
        env: &crate::model::MatchEnv,
        name: &str,
        desc: &str,
    ) -> Option<FieldId> {
        self.fields
            .iter()
            .copied()
            .find(|&f| env.field(f).name == name && env.field(f).desc == desc)
    }
}
