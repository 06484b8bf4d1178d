//! The match environment and the match table.
//!
//! [`MatchEnv`] owns the class, method, and field arenas plus the per-group
//! name indexes; it is immutable once built. [`Matches`] is the engine's only
//! mutable state: a table of nullable partner ids, one slot per symbol.

use rustc_hash::FxHashMap;

use crate::model::{ClassDef, ClassId, FieldDef, FieldId, MethodDef, MethodId, Side};

/// Per-group data: the real classes of one artifact and their name index.
#[derive(Debug, Default)]
pub(crate) struct GroupData {
    /// Real classes of this group, in registration order.
    pub classes: Vec<ClassId>,
    /// Name index over the group's real classes.
    pub by_name: FxHashMap<String, ClassId>,
}

/// The immutable matching environment: both class groups and their reference
/// graphs, backed by shared arenas.
///
/// Constructed by [`crate::model::EnvBuilder::build`]. All ids handed out by
/// an environment are valid for its lifetime; lookups through
/// [`class`](Self::class), [`method`](Self::method), and
/// [`field`](Self::field) are plain arena indexing.
///
/// # Thread Safety
///
/// `MatchEnv` is never mutated after construction, so sharing it across the
/// worker pool of a matching pass requires no synchronization.
#[derive(Debug)]
pub struct MatchEnv {
    pub(crate) classes: Vec<ClassDef>,
    pub(crate) methods: Vec<MethodDef>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) groups: [GroupData; 2],
    /// Shared synthetic classes, in creation order.
    pub(crate) shared: Vec<ClassId>,
}

impl MatchEnv {
    /// Returns the class with the given id.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.index()]
    }

    /// Returns the method with the given id.
    #[must_use]
    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index()]
    }

    /// Returns the field with the given id.
    #[must_use]
    pub fn field(&self, id: FieldId) -> &FieldDef {
        &self.fields[id.index()]
    }

    /// Returns the real classes of one group, in registration order.
    #[must_use]
    pub fn real_classes(&self, side: Side) -> &[ClassId] {
        &self.groups[side.index()].classes
    }

    /// Looks up a real class of one group by internal name.
    #[must_use]
    pub fn class_by_name(&self, side: Side, name: &str) -> Option<ClassId> {
        self.groups[side.index()].by_name.get(name).copied()
    }

    /// Returns the shared synthetic classes, in creation order.
    #[must_use]
    pub fn shared_classes(&self) -> &[ClassId] {
        &self.shared
    }

    /// Returns an iterator over the real methods of one group.
    pub fn real_methods(&self, side: Side) -> impl Iterator<Item = MethodId> + '_ {
        self.real_classes(side)
            .iter()
            .flat_map(|&c| self.class(c).methods.iter().copied())
    }

    /// Returns an iterator over the real fields of one group.
    pub fn real_fields(&self, side: Side) -> impl Iterator<Item = FieldId> + '_ {
        self.real_classes(side)
            .iter()
            .flat_map(|&c| self.class(c).fields.iter().copied())
    }

    /// Creates a fresh match table for this environment.
    ///
    /// Shared synthetic classes are self-matched from the start; every real
    /// symbol begins unmatched.
    #[must_use]
    pub fn create_matches(&self) -> Matches {
        let mut matches = Matches {
            classes: vec![None; self.classes.len()],
            methods: vec![None; self.methods.len()],
            fields: vec![None; self.fields.len()],
        };
        for &id in &self.shared {
            matches.classes[id.index()] = Some(id);
        }
        matches
    }
}

/// The match table: one nullable partner id per class, method, and field.
///
/// Matching is symmetric and monogamous. [`set_class`](Self::set_class) and
/// its siblings write both directions at once; re-matching an already-matched
/// symbol to a different partner is a bug in the caller and trips a debug
/// assertion (the engine never retracts a match).
#[derive(Debug, Clone)]
pub struct Matches {
    pub(crate) classes: Vec<Option<ClassId>>,
    pub(crate) methods: Vec<Option<MethodId>>,
    pub(crate) fields: Vec<Option<FieldId>>,
}

impl Matches {
    /// Returns the matched partner of a class, if any.
    #[must_use]
    pub fn class_match(&self, id: ClassId) -> Option<ClassId> {
        self.classes[id.index()]
    }

    /// Returns the matched partner of a method, if any.
    #[must_use]
    pub fn method_match(&self, id: MethodId) -> Option<MethodId> {
        self.methods[id.index()]
    }

    /// Returns the matched partner of a field, if any.
    #[must_use]
    pub fn field_match(&self, id: FieldId) -> Option<FieldId> {
        self.fields[id.index()]
    }

    /// Records a class match in both directions.
    pub fn set_class(&mut self, a: ClassId, b: ClassId) {
        debug_assert!(self.classes[a.index()].is_none_or(|x| x == b));
        debug_assert!(self.classes[b.index()].is_none_or(|x| x == a));
        self.classes[a.index()] = Some(b);
        self.classes[b.index()] = Some(a);
    }

    /// Records a method match in both directions.
    pub fn set_method(&mut self, a: MethodId, b: MethodId) {
        debug_assert!(self.methods[a.index()].is_none_or(|x| x == b));
        debug_assert!(self.methods[b.index()].is_none_or(|x| x == a));
        self.methods[a.index()] = Some(b);
        self.methods[b.index()] = Some(a);
    }

    /// Records a field match in both directions.
    pub fn set_field(&mut self, a: FieldId, b: FieldId) {
        debug_assert!(self.fields[a.index()].is_none_or(|x| x == b));
        debug_assert!(self.fields[b.index()].is_none_or(|x| x == a));
        self.fields[a.index()] = Some(b);
        self.fields[b.index()] = Some(a);
    }
}
