//! Method classifiers.
//!
//! Signature and reference evidence scores at every level; the
//! instruction-stream edit distance joins at `Secondary` and the lockstep
//! flow comparison, by far the most expensive classifier, only at `Extra`.

use crate::classifier::{Classifier, ClassifierCtx, MatchLevel};
use crate::flow::{Execution, ParallelExecutor};
use crate::insn::{compare_insns, InsnCompare};
use crate::model::{MethodAccess, MethodId};
use crate::similarity;

/// The method classifier registry, in registration order.
#[must_use]
pub fn classifiers() -> &'static [Classifier<MethodId>] {
    &CLASSIFIERS
}

const fn cls(
    name: &'static str,
    weight: f64,
    min_level: MatchLevel,
    score: fn(MethodId, MethodId, &ClassifierCtx<'_>) -> f64,
) -> Classifier<MethodId> {
    Classifier {
        name,
        weight,
        min_level,
        score,
    }
}

static CLASSIFIERS: [Classifier<MethodId>; 14] = [
    cls("method type check", 10.0, MatchLevel::Initial, method_type_check),
    cls("access flags", 4.0, MatchLevel::Initial, access_flags),
    cls("argument types", 10.0, MatchLevel::Initial, arg_types),
    cls("return type", 5.0, MatchLevel::Initial, ret_type),
    cls("class references", 3.0, MatchLevel::Initial, class_refs),
    cls("string constants", 5.0, MatchLevel::Initial, string_constants),
    cls("numeric constants", 5.0, MatchLevel::Initial, numeric_constants),
    cls("hierarchy members", 10.0, MatchLevel::Initial, parent_members),
    cls("call in references", 6.0, MatchLevel::Initial, in_refs),
    cls("call out references", 6.0, MatchLevel::Initial, out_refs),
    cls("field read references", 5.0, MatchLevel::Initial, field_reads),
    cls("field write references", 5.0, MatchLevel::Initial, field_writes),
    cls("code", 10.0, MatchLevel::Secondary, code),
    cls("flow comparison", 12.0, MatchLevel::Extra, flow_comparison),
];

fn method_type_check(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    const MASK: u16 = MethodAccess::STATIC.bits()
        | MethodAccess::ABSTRACT.bits()
        | MethodAccess::NATIVE.bits();
    similarity::compare_bits(
        ctx.env.method(a).access.bits(),
        ctx.env.method(b).access.bits(),
        MASK,
    )
}

fn access_flags(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    const MASK: u16 = MethodAccess::PUBLIC.bits()
        | MethodAccess::PROTECTED.bits()
        | MethodAccess::PRIVATE.bits()
        | MethodAccess::FINAL.bits()
        | MethodAccess::SYNCHRONIZED.bits()
        | MethodAccess::BRIDGE.bits()
        | MethodAccess::VARARGS.bits()
        | MethodAccess::STRICT.bits()
        | MethodAccess::SYNTHETIC.bits();
    similarity::compare_bits(
        ctx.env.method(a).access.bits(),
        ctx.env.method(b).access.bits(),
        MASK,
    )
}

fn arg_types(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.method(a).args,
        &ctx.env.method(b).args,
    )
}

fn ret_type(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    if similarity::classes_potentially_equal(
        ctx.env,
        ctx.matches,
        ctx.env.method(a).ret,
        ctx.env.method(b).ret,
    ) {
        1.0
    } else {
        0.0
    }
}

fn class_refs(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.method(a).class_refs,
        &ctx.env.method(b).class_refs,
    )
}

fn string_constants(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_sets(
        &ctx.env.method(a).string_constants,
        &ctx.env.method(b).string_constants,
    )
}

fn numeric_constants(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    let (ma, mb) = (ctx.env.method(a), ctx.env.method(b));
    (similarity::compare_sets(&ma.int_constants, &mb.int_constants)
        + similarity::compare_sets(&ma.long_constants, &mb.long_constants)
        + similarity::compare_sets(&ma.float_constants, &mb.float_constants)
        + similarity::compare_sets(&ma.double_constants, &mb.double_constants))
        / 4.0
}

fn parent_members(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.method(a).overrides,
        &ctx.env.method(b).overrides,
    )
}

fn in_refs(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.method(a).in_refs,
        &ctx.env.method(b).in_refs,
    )
}

fn out_refs(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.method(a).out_refs,
        &ctx.env.method(b).out_refs,
    )
}

fn field_reads(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.method(a).field_reads,
        &ctx.env.method(b).field_reads,
    )
}

fn field_writes(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.method(a).field_writes,
        &ctx.env.method(b).field_writes,
    )
}

/// Instruction-stream edit distance under the per-instruction predicate.
fn code(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    compare_insns(ctx.env, ctx.matches, ctx.cache, a, b)
}

/// Lockstep flow comparison.
///
/// Walks both methods in parallel, pausing at comparable instructions. Every
/// agreement scores; the first disagreement ends the walk. The result is the
/// agreement count normalized by the larger comparable-instruction count.
fn flow_comparison(a: MethodId, b: MethodId, ctx: &ClassifierCtx<'_>) -> f64 {
    let (ma, mb) = (ctx.env.method(a), ctx.env.method(b));
    if !ma.has_body() || !mb.has_body() {
        return 1.0;
    }
    let comparable = |m: &crate::model::MethodDef| {
        m.insns.iter().filter(|i| i.is_comparable()).count()
    };
    let denom = comparable(ma).max(comparable(mb));
    if denom == 0 {
        return 1.0;
    }

    let exec_a = Execution::new(ctx.env, a, ctx.config.inline_static_calls);
    let exec_b = Execution::new(ctx.env, b, ctx.config.inline_static_calls);
    let mut cmp = InsnCompare::new(ctx.env, ctx.matches, ctx.cache);
    let mut agreements = 0usize;

    let mut executor = ParallelExecutor::new(exec_a, exec_b, |_, insn| insn.is_comparable());
    executor.execute(|ea, eb| {
        let (Some(ia), Some(ib)) = (ea.current_insn(), eb.current_insn()) else {
            return false;
        };
        if cmp.insns_equal(ia, ea.position(), ib, eb.position()) {
            agreements += 1;
            ea.unpause();
            eb.unpause();
            true
        } else {
            false
        }
    });

    (agreements as f64 / denom as f64).min(1.0)
}
