//! Field classifiers.

use crate::classifier::{Classifier, ClassifierCtx, MatchLevel};
use crate::insn::Const;
use crate::model::{FieldAccess, FieldId};
use crate::similarity;

/// The field classifier registry, in registration order.
#[must_use]
pub fn classifiers() -> &'static [Classifier<FieldId>] {
    &CLASSIFIERS
}

const fn cls(
    name: &'static str,
    weight: f64,
    min_level: MatchLevel,
    score: fn(FieldId, FieldId, &ClassifierCtx<'_>) -> f64,
) -> Classifier<FieldId> {
    Classifier {
        name,
        weight,
        min_level,
        score,
    }
}

static CLASSIFIERS: [Classifier<FieldId>; 7] = [
    cls("field type check", 10.0, MatchLevel::Initial, field_type_check),
    cls("access flags", 4.0, MatchLevel::Initial, access_flags),
    cls("types", 10.0, MatchLevel::Initial, value_type),
    cls("read references", 6.0, MatchLevel::Initial, read_refs),
    cls("write references", 6.0, MatchLevel::Initial, write_refs),
    cls("initializer", 7.0, MatchLevel::Initial, initializer),
    cls("hierarchy members", 10.0, MatchLevel::Initial, parent_members),
];

fn field_type_check(a: FieldId, b: FieldId, ctx: &ClassifierCtx<'_>) -> f64 {
    const MASK: u16 = FieldAccess::STATIC.bits();
    similarity::compare_bits(
        ctx.env.field(a).access.bits(),
        ctx.env.field(b).access.bits(),
        MASK,
    )
}

fn access_flags(a: FieldId, b: FieldId, ctx: &ClassifierCtx<'_>) -> f64 {
    const MASK: u16 = FieldAccess::PUBLIC.bits()
        | FieldAccess::PROTECTED.bits()
        | FieldAccess::PRIVATE.bits()
        | FieldAccess::FINAL.bits()
        | FieldAccess::VOLATILE.bits()
        | FieldAccess::TRANSIENT.bits()
        | FieldAccess::SYNTHETIC.bits();
    similarity::compare_bits(
        ctx.env.field(a).access.bits(),
        ctx.env.field(b).access.bits(),
        MASK,
    )
}

fn value_type(a: FieldId, b: FieldId, ctx: &ClassifierCtx<'_>) -> f64 {
    if similarity::classes_potentially_equal(
        ctx.env,
        ctx.matches,
        ctx.env.field(a).ty,
        ctx.env.field(b).ty,
    ) {
        1.0
    } else {
        0.0
    }
}

fn read_refs(a: FieldId, b: FieldId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.field(a).read_refs,
        &ctx.env.field(b).read_refs,
    )
}

fn write_refs(a: FieldId, b: FieldId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.field(a).write_refs,
        &ctx.env.field(b).write_refs,
    )
}

/// Constant-initializer agreement; class literals compare by potential
/// equality, everything else exactly.
fn initializer(a: FieldId, b: FieldId, ctx: &ClassifierCtx<'_>) -> f64 {
    match (&ctx.env.field(a).initializer, &ctx.env.field(b).initializer) {
        (None, None) => 1.0,
        (Some(Const::Class(ca)), Some(Const::Class(cb))) => {
            if similarity::classes_potentially_equal(ctx.env, ctx.matches, *ca, *cb) {
                1.0
            } else {
                0.0
            }
        }
        (Some(x), Some(y)) if x == y => 1.0,
        _ => 0.0,
    }
}

fn parent_members(a: FieldId, b: FieldId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.field(a).overrides,
        &ctx.env.field(b).overrides,
    )
}
