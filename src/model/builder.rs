//! Parser-facing construction of a [`MatchEnv`].
//!
//! The parser collaborator declares classes and members with plain strings and
//! raw instructions; [`EnvBuilder::build`] interns everything into the arena,
//! creates shared synthetic classes for types not loaded from either artifact,
//! and finalizes the reference graph the engine matches over:
//!
//! - hierarchy closure, children, and implementer sets
//! - method and field override sets
//! - string and numeric constant sets from code and field initializers
//! - class in/out type references
//! - method call references and field read/write references
//!
//! Builds fail only on input-integrity violations (duplicate symbols,
//! malformed descriptors, branch targets outside the method); a reference to
//! a class nobody loaded is not an error, it becomes a synthetic stand-in.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::insn::{Const, Handle, HandleTag, Insn, RawConst, RawHandle, RawInsn};
use crate::model::group::GroupData;
use crate::model::resolve;
use crate::model::{
    ClassAccess, ClassDef, ClassId, FieldAccess, FieldDef, FieldId, MatchEnv, MethodAccess,
    MethodDef, MethodId, Side,
};
use crate::{Error, Result};

/// A method as declared by the parser.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    /// Method name.
    pub name: String,
    /// Method descriptor.
    pub desc: String,
    /// Raw access flags.
    pub access: u16,
    /// Instruction sequence; empty for abstract and native methods.
    pub insns: Vec<RawInsn>,
}

impl MethodSpec {
    /// Creates a bodiless method spec.
    #[must_use]
    pub fn new(name: impl Into<String>, desc: impl Into<String>, access: u16) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            access,
            insns: Vec::new(),
        }
    }

    /// Attaches an instruction sequence.
    #[must_use]
    pub fn with_insns(mut self, insns: Vec<RawInsn>) -> Self {
        self.insns = insns;
        self
    }
}

/// A field as declared by the parser.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Field descriptor.
    pub desc: String,
    /// Raw access flags.
    pub access: u16,
    /// Constant initializer, when the parser proved a single constant writer.
    pub initializer: Option<RawConst>,
}

impl FieldSpec {
    /// Creates a field spec without an initializer.
    #[must_use]
    pub fn new(name: impl Into<String>, desc: impl Into<String>, access: u16) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            access,
            initializer: None,
        }
    }

    /// Attaches a constant initializer.
    #[must_use]
    pub fn with_initializer(mut self, cst: RawConst) -> Self {
        self.initializer = Some(cst);
        self
    }
}

/// A class as declared by the parser.
#[derive(Debug, Clone)]
pub struct ClassSpec {
    /// Internal (slash-separated) class name.
    pub name: String,
    /// Raw access flags.
    pub access: u16,
    /// Superclass internal name, if any.
    pub superclass: Option<String>,
    /// Implemented interfaces, in declaration order.
    pub interfaces: Vec<String>,
    /// Declared methods.
    pub methods: Vec<MethodSpec>,
    /// Declared fields.
    pub fields: Vec<FieldSpec>,
}

impl ClassSpec {
    /// Creates an empty class spec extending `java/lang/Object`.
    #[must_use]
    pub fn new(name: impl Into<String>, access: u16) -> Self {
        Self {
            name: name.into(),
            access,
            superclass: Some("java/lang/Object".to_owned()),
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Sets the superclass.
    #[must_use]
    pub fn extending(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Adds an implemented interface.
    #[must_use]
    pub fn implementing(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn with_method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }
}

/// Builder assembling a [`MatchEnv`] from two groups of class declarations.
#[derive(Debug, Default)]
pub struct EnvBuilder {
    specs: [Vec<ClassSpec>; 2],
}

/// A parsed descriptor token.
enum TypeName {
    Primitive(&'static str),
    Object(String),
    Array(String),
}

/// Working state while interning.
#[derive(Default)]
struct Build {
    classes: Vec<ClassDef>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
    groups: [GroupData; 2],
    shared: Vec<ClassId>,
    shared_by_name: FxHashMap<String, ClassId>,
}

impl EnvBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a class in one group.
    pub fn add_class(&mut self, side: Side, spec: ClassSpec) -> &mut Self {
        self.specs[side.index()].push(spec);
        self
    }

    /// Interns all declarations and finalizes the reference graph.
    ///
    /// # Errors
    ///
    /// Returns an input-integrity error on duplicate classes or members,
    /// malformed descriptors, or out-of-range branch targets.
    pub fn build(self) -> Result<MatchEnv> {
        let mut b = Build::default();

        // Register every real class before touching hierarchy or members so
        // that name interning sees the full group.
        for side in [Side::A, Side::B] {
            for spec in &self.specs[side.index()] {
                let id = ClassId::new(b.classes.len());
                let group = &mut b.groups[side.index()];
                if group.by_name.insert(spec.name.clone(), id).is_some() {
                    return Err(Error::DuplicateClass {
                        name: spec.name.clone(),
                        side: side.label(),
                    });
                }
                group.classes.push(id);
                b.classes.push(new_class(
                    spec.name.clone(),
                    ClassAccess::from_bits_truncate(spec.access),
                    true,
                    Some(side),
                ));
            }
        }

        // Hierarchy edges and members.
        for side in [Side::A, Side::B] {
            for spec in &self.specs[side.index()] {
                let id = b.groups[side.index()].by_name[&spec.name];
                let superclass = spec
                    .superclass
                    .as_deref()
                    .map(|n| b.intern_class(side, n));
                let interfaces: Vec<ClassId> = spec
                    .interfaces
                    .iter()
                    .map(|n| b.intern_class(side, n))
                    .collect();
                b.classes[id.index()].superclass = superclass;
                b.classes[id.index()].interfaces = interfaces;

                let mut seen_members: FxHashSet<(String, String)> = FxHashSet::default();
                for mspec in &spec.methods {
                    if !seen_members.insert((mspec.name.clone(), mspec.desc.clone())) {
                        return Err(Error::DuplicateMember {
                            owner: spec.name.clone(),
                            name: mspec.name.clone(),
                            desc: mspec.desc.clone(),
                        });
                    }
                    let mid = b.add_method(side, id, spec, mspec)?;
                    b.classes[id.index()].methods.push(mid);
                }
                for fspec in &spec.fields {
                    if !seen_members.insert((fspec.name.clone(), fspec.desc.clone())) {
                        return Err(Error::DuplicateMember {
                            owner: spec.name.clone(),
                            name: fspec.name.clone(),
                            desc: fspec.desc.clone(),
                        });
                    }
                    let fid = b.add_field(side, id, fspec)?;
                    b.classes[id.index()].fields.push(fid);
                }
            }
        }

        b.link_children();
        b.compute_hierarchy();
        b.extract_constants();

        let mut env = MatchEnv {
            classes: b.classes,
            methods: b.methods,
            fields: b.fields,
            groups: b.groups,
            shared: b.shared,
        };
        compute_overrides(&mut env);
        compute_refs(&mut env);
        Ok(env)
    }
}

fn new_class(name: String, access: ClassAccess, real: bool, side: Option<Side>) -> ClassDef {
    ClassDef {
        name,
        access,
        real,
        side,
        superclass: None,
        interfaces: Vec::new(),
        children: Vec::new(),
        implementers: Vec::new(),
        hierarchy: Vec::new(),
        methods: Vec::new(),
        fields: Vec::new(),
        string_constants: FxHashSet::default(),
        int_constants: FxHashSet::default(),
        long_constants: FxHashSet::default(),
        float_constants: FxHashSet::default(),
        double_constants: FxHashSet::default(),
        in_refs: Vec::new(),
        out_refs: Vec::new(),
    }
}

impl Build {
    /// Interns an object class name, creating a shared synthetic stand-in
    /// when neither the referencing group nor the shared pool knows it.
    fn intern_class(&mut self, side: Side, name: &str) -> ClassId {
        if let Some(&id) = self.groups[side.index()].by_name.get(name) {
            return id;
        }
        self.intern_shared(name)
    }

    /// Interns a name into the shared synthetic pool.
    fn intern_shared(&mut self, name: &str) -> ClassId {
        if let Some(&id) = self.shared_by_name.get(name) {
            return id;
        }
        let id = ClassId::new(self.classes.len());
        self.classes
            .push(new_class(name.to_owned(), ClassAccess::empty(), false, None));
        self.shared.push(id);
        self.shared_by_name.insert(name.to_owned(), id);
        id
    }

    /// Interns a type reference that may be an object name or array descriptor.
    fn intern_type_ref(&mut self, side: Side, name: &str) -> ClassId {
        if name.starts_with('[') {
            self.intern_shared(name)
        } else {
            self.intern_class(side, name)
        }
    }

    fn intern_token(&mut self, side: Side, token: &TypeName) -> ClassId {
        match token {
            TypeName::Primitive(name) => self.intern_shared(name),
            TypeName::Object(name) => self.intern_class(side, name),
            TypeName::Array(desc) => self.intern_shared(desc),
        }
    }

    fn add_method(
        &mut self,
        side: Side,
        owner: ClassId,
        owner_spec: &ClassSpec,
        spec: &MethodSpec,
    ) -> Result<MethodId> {
        let (arg_tokens, ret_token) = parse_method_desc(&spec.desc)?;
        let args: Vec<ClassId> = arg_tokens
            .iter()
            .map(|t| self.intern_token(side, t))
            .collect();
        let ret = self.intern_token(side, &ret_token);

        let mut insns = Vec::with_capacity(spec.insns.len());
        for raw in &spec.insns {
            insns.push(self.resolve_insn(side, owner_spec, spec, raw)?);
        }

        let mid = MethodId::new(self.methods.len());
        self.methods.push(MethodDef {
            owner,
            name: spec.name.clone(),
            desc: spec.desc.clone(),
            access: MethodAccess::from_bits_truncate(spec.access),
            insns,
            ret,
            args,
            in_refs: Vec::new(),
            out_refs: Vec::new(),
            field_reads: Vec::new(),
            field_writes: Vec::new(),
            class_refs: Vec::new(),
            overrides: Vec::new(),
            string_constants: FxHashSet::default(),
            int_constants: FxHashSet::default(),
            long_constants: FxHashSet::default(),
            float_constants: FxHashSet::default(),
            double_constants: FxHashSet::default(),
        });
        Ok(mid)
    }

    fn add_field(&mut self, side: Side, owner: ClassId, spec: &FieldSpec) -> Result<FieldId> {
        let token = parse_field_desc(&spec.desc)?;
        let ty = self.intern_token(side, &token);
        let initializer = spec
            .initializer
            .as_ref()
            .map(|c| self.resolve_const(side, c));
        let fid = FieldId::new(self.fields.len());
        self.fields.push(FieldDef {
            owner,
            name: spec.name.clone(),
            desc: spec.desc.clone(),
            access: FieldAccess::from_bits_truncate(spec.access),
            ty,
            initializer,
            read_refs: Vec::new(),
            write_refs: Vec::new(),
            overrides: Vec::new(),
        });
        Ok(fid)
    }

    fn resolve_const(&mut self, side: Side, raw: &RawConst) -> Const {
        match raw {
            RawConst::Int(v) => Const::Int(*v),
            RawConst::Long(v) => Const::Long(*v),
            RawConst::Float(v) => Const::Float(v.to_bits()),
            RawConst::Double(v) => Const::Double(v.to_bits()),
            RawConst::String(v) => Const::String(v.clone()),
            RawConst::Class(name) => Const::Class(self.intern_type_ref(side, name)),
            RawConst::MethodType(desc) => Const::MethodType(desc.clone()),
            RawConst::MethodHandle(h) => Const::MethodHandle(self.resolve_handle(side, h)),
        }
    }

    fn resolve_handle(&mut self, side: Side, raw: &RawHandle) -> Handle {
        Handle {
            tag: raw.tag,
            owner: self.intern_type_ref(side, &raw.owner),
            name: raw.name.clone(),
            desc: raw.desc.clone(),
            interface: raw.interface,
        }
    }

    fn resolve_insn(
        &mut self,
        side: Side,
        owner_spec: &ClassSpec,
        method_spec: &MethodSpec,
        raw: &RawInsn,
    ) -> Result<Insn> {
        let len = method_spec.insns.len();
        let check_target = |target: usize| -> Result<usize> {
            if target < len {
                Ok(target)
            } else {
                Err(Error::BranchTargetOutOfRange {
                    owner: owner_spec.name.clone(),
                    name: method_spec.name.clone(),
                    desc: method_spec.desc.clone(),
                    target,
                    len,
                })
            }
        };

        Ok(match raw {
            RawInsn::Plain { op } => Insn::Plain { op: *op },
            RawInsn::IntPush { op, value } => Insn::IntPush {
                op: *op,
                value: *value,
            },
            RawInsn::Var { op, var } => Insn::Var { op: *op, var: *var },
            RawInsn::Iinc { var, delta } => Insn::Iinc {
                var: *var,
                delta: *delta,
            },
            RawInsn::Jump { op, target } => Insn::Jump {
                op: *op,
                target: check_target(*target)?,
            },
            RawInsn::TableSwitch {
                low,
                high,
                targets,
                default,
            } => Insn::TableSwitch {
                low: *low,
                high: *high,
                targets: targets
                    .iter()
                    .map(|&t| check_target(t))
                    .collect::<Result<_>>()?,
                default: check_target(*default)?,
            },
            RawInsn::LookupSwitch {
                keys,
                targets,
                default,
            } => Insn::LookupSwitch {
                keys: keys.clone(),
                targets: targets
                    .iter()
                    .map(|&t| check_target(t))
                    .collect::<Result<_>>()?,
                default: check_target(*default)?,
            },
            RawInsn::Ldc { cst } => Insn::Ldc {
                cst: self.resolve_const(side, cst),
            },
            RawInsn::Type { op, class } => Insn::Type {
                op: *op,
                class: self.intern_type_ref(side, class),
            },
            RawInsn::Field {
                op,
                owner,
                name,
                desc,
            } => Insn::Field {
                op: *op,
                owner: self.intern_type_ref(side, owner),
                name: name.clone(),
                desc: desc.clone(),
            },
            RawInsn::Method {
                op,
                owner,
                name,
                desc,
                interface,
            } => Insn::Method {
                op: *op,
                owner: self.intern_type_ref(side, owner),
                name: name.clone(),
                desc: desc.clone(),
                interface: *interface,
            },
            RawInsn::InvokeDynamic {
                name,
                desc,
                bootstrap,
                args,
            } => Insn::InvokeDynamic {
                name: name.clone(),
                desc: desc.clone(),
                bootstrap: self.resolve_handle(side, bootstrap),
                args: args.iter().map(|c| self.resolve_const(side, c)).collect(),
            },
            RawInsn::MultiNewArray { desc, dims } => Insn::MultiNewArray {
                class: self.intern_shared(desc),
                dims: *dims,
            },
        })
    }

    /// Populates children and implementer sets from the hierarchy edges.
    fn link_children(&mut self) {
        for idx in 0..self.classes.len() {
            let id = ClassId::new(idx);
            if let Some(parent) = self.classes[idx].superclass {
                self.classes[parent.index()].children.push(id);
            }
            let interfaces = self.classes[idx].interfaces.clone();
            for itf in interfaces {
                self.classes[itf.index()].implementers.push(id);
            }
        }
    }

    /// Computes every class's hierarchy closure: self plus all ancestors,
    /// DFS discovery order over superclass and interface edges.
    fn compute_hierarchy(&mut self) {
        for idx in 0..self.classes.len() {
            let mut closure: Vec<ClassId> = Vec::new();
            let mut seen: FxHashSet<ClassId> = FxHashSet::default();
            let mut stack = vec![ClassId::new(idx)];
            while let Some(c) = stack.pop() {
                if !seen.insert(c) {
                    continue;
                }
                closure.push(c);
                let def = &self.classes[c.index()];
                // Push interfaces in reverse so DFS visits them in
                // declaration order before the superclass chain continues.
                for &itf in def.interfaces.iter().rev() {
                    stack.push(itf);
                }
                if let Some(parent) = def.superclass {
                    stack.push(parent);
                }
            }
            self.classes[idx].hierarchy = closure;
        }
    }

    /// Collects string and numeric constants per method, then aggregates
    /// them per class together with field initializers.
    fn extract_constants(&mut self) {
        for method in &mut self.methods {
            for insn in &method.insns {
                match insn {
                    Insn::IntPush { value, .. } => {
                        method.int_constants.insert(*value);
                    }
                    Insn::Ldc { cst } => match cst {
                        Const::Int(v) => {
                            method.int_constants.insert(*v);
                        }
                        Const::Long(v) => {
                            method.long_constants.insert(*v);
                        }
                        Const::Float(v) => {
                            method.float_constants.insert(*v);
                        }
                        Const::Double(v) => {
                            method.double_constants.insert(*v);
                        }
                        Const::String(v) => {
                            method.string_constants.insert(v.clone());
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }
        }

        for idx in 0..self.classes.len() {
            let method_ids = self.classes[idx].methods.clone();
            for mid in method_ids {
                let m = &self.methods[mid.index()];
                let strings: Vec<String> = m.string_constants.iter().cloned().collect();
                let ints: Vec<i32> = m.int_constants.iter().copied().collect();
                let longs: Vec<i64> = m.long_constants.iter().copied().collect();
                let floats: Vec<u32> = m.float_constants.iter().copied().collect();
                let doubles: Vec<u64> = m.double_constants.iter().copied().collect();
                let class = &mut self.classes[idx];
                class.string_constants.extend(strings);
                class.int_constants.extend(ints);
                class.long_constants.extend(longs);
                class.float_constants.extend(floats);
                class.double_constants.extend(doubles);
            }
            let field_ids = self.classes[idx].fields.clone();
            for fid in field_ids {
                let initializer = self.fields[fid.index()].initializer.clone();
                let class = &mut self.classes[idx];
                match initializer {
                    Some(Const::Int(v)) => {
                        class.int_constants.insert(v);
                    }
                    Some(Const::Long(v)) => {
                        class.long_constants.insert(v);
                    }
                    Some(Const::Float(v)) => {
                        class.float_constants.insert(v);
                    }
                    Some(Const::Double(v)) => {
                        class.double_constants.insert(v);
                    }
                    Some(Const::String(v)) => {
                        class.string_constants.insert(v);
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Computes method and field override sets over the finished hierarchy.
fn compute_overrides(env: &mut MatchEnv) {
    let mut method_overrides: Vec<Vec<MethodId>> = vec![Vec::new(); env.methods.len()];
    for (idx, method) in env.methods.iter().enumerate() {
        if method.is_private()
            || method.is_static()
            || method.is_constructor()
            || method.is_class_initializer()
        {
            continue;
        }
        let owner = env.class(method.owner);
        for &ancestor in owner.hierarchy.iter().skip(1) {
            if let Some(candidate) = env.class(ancestor).find_method(env, &method.name, &method.desc)
            {
                let access = env.method(candidate).access;
                if !access.contains(MethodAccess::PRIVATE) && !access.contains(MethodAccess::STATIC)
                {
                    method_overrides[idx].push(candidate);
                }
            }
        }
    }
    for (idx, overrides) in method_overrides.into_iter().enumerate() {
        env.methods[idx].overrides = overrides;
    }

    let mut field_overrides: Vec<Vec<FieldId>> = vec![Vec::new(); env.fields.len()];
    for (idx, field) in env.fields.iter().enumerate() {
        let owner = env.class(field.owner);
        for &ancestor in owner.hierarchy.iter().skip(1) {
            if let Some(candidate) = env.class(ancestor).find_field(env, &field.name, &field.desc) {
                field_overrides[idx].push(candidate);
            }
        }
    }
    for (idx, overrides) in field_overrides.into_iter().enumerate() {
        env.fields[idx].overrides = overrides;
    }
}

/// Per-method reference accumulation before it is written back to the arena.
#[derive(Default)]
struct MethodRefs {
    out: FxHashSet<MethodId>,
    reads: FxHashSet<FieldId>,
    writes: FxHashSet<FieldId>,
    classes: FxHashSet<ClassId>,
}

/// Computes call references, field access references, and class type
/// references by resolving every member instruction against the hierarchy.
fn compute_refs(env: &mut MatchEnv) {
    let mut per_method: Vec<MethodRefs> = Vec::with_capacity(env.methods.len());

    for method in &env.methods {
        let mut refs = MethodRefs::default();
        for insn in &method.insns {
            match insn {
                Insn::Type { class, .. } | Insn::MultiNewArray { class, .. } => {
                    refs.classes.insert(*class);
                }
                Insn::Ldc { cst } => {
                    record_const_refs(env, cst, &mut refs);
                }
                Insn::Field {
                    op,
                    owner,
                    name,
                    desc,
                } => {
                    refs.classes.insert(*owner);
                    if let Some(field) = resolve::resolve_field(env, *owner, name, desc) {
                        if matches!(*op, crate::insn::opcodes::GETSTATIC | crate::insn::opcodes::GETFIELD)
                        {
                            refs.reads.insert(field);
                        } else {
                            refs.writes.insert(field);
                        }
                    }
                }
                Insn::Method {
                    op,
                    owner,
                    name,
                    desc,
                    ..
                } => {
                    refs.classes.insert(*owner);
                    let to_interface = *op == crate::insn::opcodes::INVOKEINTERFACE;
                    if let Some(callee) =
                        resolve::resolve_method(env, *owner, name, desc, to_interface)
                    {
                        refs.out.insert(callee);
                    }
                }
                Insn::InvokeDynamic {
                    bootstrap, args, ..
                } => {
                    refs.classes.insert(bootstrap.owner);
                    for arg in args {
                        record_const_refs(env, arg, &mut refs);
                    }
                }
                _ => {}
            }
        }
        per_method.push(refs);
    }

    // Write back per-method references and build the inverse maps.
    let mut method_in: Vec<FxHashSet<MethodId>> = vec![FxHashSet::default(); env.methods.len()];
    let mut field_reads: Vec<FxHashSet<MethodId>> = vec![FxHashSet::default(); env.fields.len()];
    let mut field_writes: Vec<FxHashSet<MethodId>> = vec![FxHashSet::default(); env.fields.len()];
    for (idx, refs) in per_method.iter().enumerate() {
        let caller = MethodId::new(idx);
        for &callee in &refs.out {
            method_in[callee.index()].insert(caller);
        }
        for &field in &refs.reads {
            field_reads[field.index()].insert(caller);
        }
        for &field in &refs.writes {
            field_writes[field.index()].insert(caller);
        }
    }

    for (idx, refs) in per_method.into_iter().enumerate() {
        let method = &mut env.methods[idx];
        method.out_refs = sorted(refs.out);
        method.field_reads = sorted(refs.reads);
        method.field_writes = sorted(refs.writes);
        method.class_refs = sorted(refs.classes);
    }
    for (idx, set) in method_in.into_iter().enumerate() {
        env.methods[idx].in_refs = sorted(set);
    }
    for (idx, set) in field_reads.into_iter().enumerate() {
        env.fields[idx].read_refs = sorted(set);
    }
    for (idx, set) in field_writes.into_iter().enumerate() {
        env.fields[idx].write_refs = sorted(set);
    }

    // Class-level type references: code references of the class's methods
    // plus member signature types, excluding the class itself.
    let mut class_out: Vec<FxHashSet<ClassId>> = vec![FxHashSet::default(); env.classes.len()];
    for (idx, class) in env.classes.iter().enumerate() {
        let id = ClassId::new(idx);
        let out = &mut class_out[idx];
        for &mid in &class.methods {
            let m = env.method(mid);
            out.extend(m.class_refs.iter().copied());
            out.extend(m.args.iter().copied());
            out.insert(m.ret);
        }
        for &fid in &class.fields {
            out.insert(env.field(fid).ty);
        }
        out.remove(&id);
    }
    let mut class_in: Vec<FxHashSet<ClassId>> = vec![FxHashSet::default(); env.classes.len()];
    for (idx, out) in class_out.iter().enumerate() {
        for &target in out {
            class_in[target.index()].insert(ClassId::new(idx));
        }
    }
    for (idx, out) in class_out.into_iter().enumerate() {
        env.classes[idx].out_refs = sorted(out);
    }
    for (idx, set) in class_in.into_iter().enumerate() {
        env.classes[idx].in_refs = sorted(set);
    }
}

fn record_const_refs(env: &MatchEnv, cst: &Const, refs: &mut MethodRefs) {
    match cst {
        Const::Class(c) => {
            refs.classes.insert(*c);
        }
        Const::MethodHandle(h) => {
            refs.classes.insert(h.owner);
            if h.tag.is_method() {
                let to_interface = h.tag == HandleTag::InvokeInterface;
                if let Some(callee) =
                    resolve::resolve_method(env, h.owner, &h.name, &h.desc, to_interface)
                {
                    refs.out.insert(callee);
                }
            } else if let Some(field) = resolve::resolve_field(env, h.owner, &h.name, &h.desc) {
                match h.tag {
                    HandleTag::GetField | HandleTag::GetStatic => {
                        refs.reads.insert(field);
                    }
                    _ => {
                        refs.writes.insert(field);
                    }
                }
            }
        }
        _ => {}
    }
}

fn sorted<T: Ord + std::hash::Hash + Eq + Copy>(set: FxHashSet<T>) -> Vec<T> {
    let mut v: Vec<T> = set.into_iter().collect();
    v.sort_unstable();
    v
}

/// Parses a method descriptor into argument and return type tokens.
fn parse_method_desc(desc: &str) -> Result<(Vec<TypeName>, TypeName)> {
    let bytes = desc.as_bytes();
    if bytes.first() != Some(&b'(') {
        return Err(Error::MalformedDescriptor {
            desc: desc.to_owned(),
        });
    }
    let mut pos = 1;
    let mut args = Vec::new();
    while pos < bytes.len() && bytes[pos] != b')' {
        args.push(parse_type(desc, &mut pos)?);
    }
    if pos >= bytes.len() {
        return Err(Error::MalformedDescriptor {
            desc: desc.to_owned(),
        });
    }
    pos += 1; // skip ')'
    let ret = parse_type(desc, &mut pos)?;
    if pos != bytes.len() {
        return Err(Error::MalformedDescriptor {
            desc: desc.to_owned(),
        });
    }
    Ok((args, ret))
}

/// Parses a field descriptor into a single type token.
fn parse_field_desc(desc: &str) -> Result<TypeName> {
    let mut pos = 0;
    let ty = parse_type(desc, &mut pos)?;
    if pos != desc.len() {
        return Err(Error::MalformedDescriptor {
            desc: desc.to_owned(),
        });
    }
    Ok(ty)
}

fn parse_type(desc: &str, pos: &mut usize) -> Result<TypeName> {
    let bytes = desc.as_bytes();
    let start = *pos;
    let malformed = || Error::MalformedDescriptor {
        desc: desc.to_owned(),
    };

    let mut dims = 0;
    while *pos < bytes.len() && bytes[*pos] == b'[' {
        dims += 1;
        *pos += 1;
    }
    if *pos >= bytes.len() {
        return Err(malformed());
    }

    match bytes[*pos] {
        b'L' => {
            let name_start = *pos + 1;
            let end = desc[name_start..]
                .find(';')
                .map(|off| name_start + off)
                .ok_or_else(malformed)?;
            *pos = end + 1;
            if dims > 0 {
                Ok(TypeName::Array(desc[start..*pos].to_owned()))
            } else {
                Ok(TypeName::Object(desc[name_start..end].to_owned()))
            }
        }
        c => {
            let primitive = match c {
                b'V' => "void",
                b'Z' => "boolean",
                b'B' => "byte",
                b'C' => "char",
                b'S' => "short",
                b'I' => "int",
                b'J' => "long",
                b'F' => "float",
                b'D' => "double",
                _ => return Err(malformed()),
            };
            *pos += 1;
            if dims > 0 {
                Ok(TypeName::Array(desc[start..*pos].to_owned()))
            } else {
                Ok(TypeName::Primitive(primitive))
            }
        }
    }
}
