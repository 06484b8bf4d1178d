//! Design-level equivalence of instruction pairs.
//!
//! Two instructions are compared by opcode family: operands that survive
//! obfuscation (numbers, switch shapes, jump directions) must agree exactly,
//! while symbol operands (types, fields, methods) only need to be potentially
//! equal under the current match graph. Local-variable indices are
//! deliberately ignored - local slots do not survive recompilation.
//!
//! A comparator instance additionally accumulates the symbol pairs it judged
//! potentially equal. The lockstep flow comparison feeds these back so that a
//! pair agreed upon early in a walk keeps counting as equal later in the same
//! walk, even though nothing was committed to the global match table.

use rustc_hash::FxHashSet;

use crate::insn::{opcodes, Const, Handle, HandleTag, Insn};
use crate::model::resolve::ResolveCache;
use crate::model::{ClassId, FieldId, Matches, MatchEnv, MethodId};
use crate::similarity;

const LAMBDA_METAFACTORY_OWNER: &str = "java/lang/invoke/LambdaMetafactory";
const LAMBDA_METAFACTORY_NAME: &str = "metafactory";
const LAMBDA_METAFACTORY_DESC: &str = "(Ljava/lang/invoke/MethodHandles$Lookup;\
Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;\
Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)\
Ljava/lang/invoke/CallSite;";
const LAMBDA_ALT_METAFACTORY_NAME: &str = "altMetafactory";
const LAMBDA_ALT_METAFACTORY_DESC: &str = "(Ljava/lang/invoke/MethodHandles$Lookup;\
Ljava/lang/String;Ljava/lang/invoke/MethodType;[Ljava/lang/Object;)\
Ljava/lang/invoke/CallSite;";

/// Symbol pairs a comparator judged potentially equal.
///
/// These are *discovered* equivalences, scoped to one comparison run; they
/// are never written to the global match table.
#[derive(Debug, Default)]
pub struct LocalPairs {
    /// Class pairs.
    pub classes: FxHashSet<(ClassId, ClassId)>,
    /// Method pairs.
    pub methods: FxHashSet<(MethodId, MethodId)>,
    /// Field pairs.
    pub fields: FxHashSet<(FieldId, FieldId)>,
}

/// Stateful instruction-pair comparator.
///
/// Borrows the environment, the current match table, and the pass-wide
/// resolution cache; owns the [`LocalPairs`] accumulated over its lifetime.
pub struct InsnCompare<'a> {
    env: &'a MatchEnv,
    matches: &'a Matches,
    cache: &'a ResolveCache,
    local: LocalPairs,
}

impl<'a> InsnCompare<'a> {
    /// Creates a comparator with empty local state.
    #[must_use]
    pub fn new(env: &'a MatchEnv, matches: &'a Matches, cache: &'a ResolveCache) -> Self {
        Self {
            env,
            matches,
            cache,
            local: LocalPairs::default(),
        }
    }

    /// Returns the symbol pairs discovered so far.
    #[must_use]
    pub fn discovered(&self) -> &LocalPairs {
        &self.local
    }

    /// Compares two instructions at their positions in their streams.
    ///
    /// # Arguments
    ///
    /// * `a`, `b` - The instructions to compare
    /// * `pos_a`, `pos_b` - Their indices in their owning methods, used to
    ///   judge jump direction
    pub fn insns_equal(&mut self, a: &Insn, pos_a: usize, b: &Insn, pos_b: usize) -> bool {
        if a.opcode() != b.opcode() {
            return false;
        }
        match (a, b) {
            (Insn::IntPush { value: va, .. }, Insn::IntPush { value: vb, .. }) => va == vb,
            // Local-variable matching is deliberately omitted.
            (Insn::Var { .. }, Insn::Var { .. }) => true,
            (Insn::Iinc { delta: da, .. }, Insn::Iinc { delta: db, .. }) => da == db,
            (Insn::Type { class: ca, .. }, Insn::Type { class: cb, .. }) => {
                self.classes_eq(*ca, *cb)
            }
            (
                Insn::Field {
                    owner: oa,
                    name: na,
                    desc: da,
                    ..
                },
                Insn::Field {
                    owner: ob,
                    name: nb,
                    desc: db,
                    ..
                },
            ) => {
                let fa = self.cache.field(self.env, *oa, na, da);
                let fb = self.cache.field(self.env, *ob, nb, db);
                match (fa, fb) {
                    (None, None) => true,
                    (Some(x), Some(y)) => self.fields_eq(x, y),
                    _ => false,
                }
            }
            (
                Insn::Method {
                    op,
                    owner: oa,
                    name: na,
                    desc: da,
                    ..
                },
                Insn::Method {
                    owner: ob,
                    name: nb,
                    desc: db,
                    ..
                },
            ) => {
                let to_interface = *op == opcodes::INVOKEINTERFACE;
                let ma = self.cache.method(self.env, *oa, na, da, to_interface);
                let mb = self.cache.method(self.env, *ob, nb, db, to_interface);
                match (ma, mb) {
                    (None, None) => true,
                    (Some(x), Some(y)) => self.methods_eq(x, y),
                    _ => false,
                }
            }
            (
                Insn::InvokeDynamic {
                    bootstrap: ba,
                    args: args_a,
                    ..
                },
                Insn::InvokeDynamic {
                    bootstrap: bb,
                    args: args_b,
                    ..
                },
            ) => self.invoke_dynamics_equal(ba, args_a, bb, args_b),
            (Insn::Jump { target: ta, .. }, Insn::Jump { target: tb, .. }) => {
                // Both forward, both backward, or both to self.
                ta.cmp(&pos_a) == tb.cmp(&pos_b)
            }
            (
                Insn::TableSwitch {
                    low: la, high: ha, ..
                },
                Insn::TableSwitch {
                    low: lb, high: hb, ..
                },
            ) => la == lb && ha == hb,
            (Insn::LookupSwitch { keys: ka, .. }, Insn::LookupSwitch { keys: kb, .. }) => ka == kb,
            (Insn::Ldc { cst: ca }, Insn::Ldc { cst: cb }) => self.consts_equal(ca, cb),
            (
                Insn::MultiNewArray {
                    class: ca,
                    dims: da,
                },
                Insn::MultiNewArray {
                    class: cb,
                    dims: db,
                },
            ) => da == db && self.classes_eq(*ca, *cb),
            (Insn::Plain { .. }, Insn::Plain { .. }) => true,
            _ => false,
        }
    }

    fn classes_eq(&mut self, a: ClassId, b: ClassId) -> bool {
        if a == b || self.local.classes.contains(&(a, b)) {
            return true;
        }
        if similarity::classes_potentially_equal(self.env, self.matches, a, b) {
            self.local.classes.insert((a, b));
            true
        } else {
            false
        }
    }

    fn methods_eq(&mut self, a: MethodId, b: MethodId) -> bool {
        if a == b || self.local.methods.contains(&(a, b)) {
            return true;
        }
        if similarity::methods_potentially_equal(self.env, self.matches, a, b) {
            self.local.methods.insert((a, b));
            true
        } else {
            false
        }
    }

    fn fields_eq(&mut self, a: FieldId, b: FieldId) -> bool {
        if a == b || self.local.fields.contains(&(a, b)) {
            return true;
        }
        if similarity::fields_potentially_equal(self.env, self.matches, a, b) {
            self.local.fields.insert((a, b));
            true
        } else {
            false
        }
    }

    /// ASM-style handle equality: everything must agree at the string level.
    fn handles_strictly_equal(&self, a: &Handle, b: &Handle) -> bool {
        a.tag == b.tag
            && self.env.class(a.owner).name == self.env.class(b.owner).name
            && a.name == b.name
            && a.desc == b.desc
            && a.interface == b.interface
    }

    fn is_lambda_metafactory(&self, handle: &Handle) -> bool {
        handle.tag == HandleTag::InvokeStatic
            && self.env.class(handle.owner).name == LAMBDA_METAFACTORY_OWNER
            && ((handle.name == LAMBDA_METAFACTORY_NAME
                && handle.desc == LAMBDA_METAFACTORY_DESC)
                || (handle.name == LAMBDA_ALT_METAFACTORY_NAME
                    && handle.desc == LAMBDA_ALT_METAFACTORY_DESC))
    }

    fn invoke_dynamics_equal(
        &mut self,
        bootstrap_a: &Handle,
        args_a: &[Const],
        bootstrap_b: &Handle,
        args_b: &[Const],
    ) -> bool {
        if !self.handles_strictly_equal(bootstrap_a, bootstrap_b) {
            return false;
        }
        if !self.is_lambda_metafactory(bootstrap_a) {
            return true;
        }
        // The second static argument of the metafactory is the implementation
        // handle; its target is what the lambda actually does.
        match (args_a.get(1), args_b.get(1)) {
            (Some(Const::MethodHandle(ha)), Some(Const::MethodHandle(hb))) => {
                self.impl_handles_equal(ha, hb)
            }
            _ => false,
        }
    }

    /// Compares lambda implementation handles by their resolved targets.
    fn impl_handles_equal(&mut self, a: &Handle, b: &Handle) -> bool {
        if a.tag != b.tag {
            return false;
        }
        let to_interface = a.tag == HandleTag::InvokeInterface;
        let ma = self
            .cache
            .method(self.env, a.owner, &a.name, &a.desc, to_interface);
        let mb = self
            .cache
            .method(self.env, b.owner, &b.name, &b.desc, to_interface);
        match (ma, mb) {
            (None, None) => true,
            (Some(x), Some(y)) => self.methods_eq(x, y),
            _ => false,
        }
    }

    fn consts_equal(&mut self, a: &Const, b: &Const) -> bool {
        if a.kind() != b.kind() {
            return false;
        }
        match (a, b) {
            (Const::Class(ca), Const::Class(cb)) => self.classes_eq(*ca, *cb),
            (Const::MethodHandle(ha), Const::MethodHandle(hb)) => {
                self.handles_strictly_equal(ha, hb)
            }
            _ => a == b,
        }
    }
}

/// Instruction-stream similarity between two methods.
///
/// Applies [`crate::similarity::compare_lists`] over the per-instruction
/// predicate. Methods without a body (abstract, native, synthetic owners)
/// compare vacuously equal.
#[must_use]
pub fn compare_insns(
    env: &MatchEnv,
    matches: &Matches,
    cache: &ResolveCache,
    a: MethodId,
    b: MethodId,
) -> f64 {
    let (ma, mb) = (env.method(a), env.method(b));
    if !ma.has_body() || !mb.has_body() {
        return 1.0;
    }
    let indexed_a: Vec<(usize, &Insn)> = ma.insns.iter().enumerate().collect();
    let indexed_b: Vec<(usize, &Insn)> = mb.insns.iter().enumerate().collect();
    let mut cmp = InsnCompare::new(env, matches, cache);
    similarity::compare_lists(&indexed_a, &indexed_b, |(pa, x), (pb, y)| {
        cmp.insns_equal(x, *pa, y, *pb)
    })
}
