//! Class classifiers.
//!
//! Weights and levels follow the tuned production configuration: cheap
//! structural evidence at `Initial`, member cross-references from `Secondary`,
//! and the recursive full-member scoring from `Tertiary`.

use rustc_hash::FxHashSet;

use crate::classifier::{found_match, max_score, method, rank, Classifier, ClassifierCtx, MatchLevel};
use crate::model::{ClassAccess, ClassId, FieldId, MethodDef, MethodId};
use crate::similarity;

/// The class classifier registry, in registration order.
#[must_use]
pub fn classifiers() -> &'static [Classifier<ClassId>] {
    &CLASSIFIERS
}

const fn cls(
    name: &'static str,
    weight: f64,
    min_level: MatchLevel,
    score: fn(ClassId, ClassId, &ClassifierCtx<'_>) -> f64,
) -> Classifier<ClassId> {
    Classifier {
        name,
        weight,
        min_level,
        score,
    }
}

static CLASSIFIERS: [Classifier<ClassId>; 19] = [
    cls("class type check", 20.0, MatchLevel::Initial, class_type_check),
    cls("hierarchy depth", 1.0, MatchLevel::Initial, hierarchy_depth),
    cls("hierarchy siblings", 2.0, MatchLevel::Initial, hierarchy_siblings),
    cls("parent class", 4.0, MatchLevel::Initial, parent_class),
    cls("child classes", 3.0, MatchLevel::Initial, child_classes),
    cls("interfaces", 3.0, MatchLevel::Initial, interfaces),
    cls("implementers", 2.0, MatchLevel::Initial, implementers),
    cls("method count", 3.0, MatchLevel::Initial, method_count),
    cls("field count", 3.0, MatchLevel::Initial, field_count),
    cls("similar methods", 10.0, MatchLevel::Initial, similar_methods),
    cls("string constants", 8.0, MatchLevel::Initial, string_constants),
    cls("numeric constants", 6.0, MatchLevel::Initial, numeric_constants),
    cls("out references", 6.0, MatchLevel::Initial, out_refs),
    cls("in references", 6.0, MatchLevel::Initial, in_refs),
    cls("method out references", 5.0, MatchLevel::Secondary, method_out_refs),
    cls("method in references", 6.0, MatchLevel::Secondary, method_in_refs),
    cls("field read references", 5.0, MatchLevel::Secondary, field_read_refs),
    cls("field write references", 5.0, MatchLevel::Secondary, field_write_refs),
    cls("members full", 10.0, MatchLevel::Tertiary, members_full),
];

fn score_bool(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn class_type_check(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    const MASK: u16 = ClassAccess::ENUM.bits()
        | ClassAccess::INTERFACE.bits()
        | ClassAccess::ANNOTATION.bits()
        | ClassAccess::ABSTRACT.bits();
    similarity::compare_bits(
        ctx.env.class(a).access.bits(),
        ctx.env.class(b).access.bits(),
        MASK,
    )
}

fn hierarchy_depth(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_counts(
        ctx.env.class(a).hierarchy.len(),
        ctx.env.class(b).hierarchy.len(),
    )
}

fn hierarchy_siblings(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    let siblings = |id: ClassId| {
        ctx.env
            .class(id)
            .superclass
            .map_or(0, |p| ctx.env.class(p).children.len().saturating_sub(1))
    };
    similarity::compare_counts(siblings(a), siblings(b))
}

fn parent_class(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    match (ctx.env.class(a).superclass, ctx.env.class(b).superclass) {
        (Some(pa), Some(pb)) => score_bool(similarity::classes_potentially_equal(
            ctx.env,
            ctx.matches,
            pa,
            pb,
        )),
        (None, None) => 1.0,
        _ => 0.0,
    }
}

fn child_classes(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.class(a).children,
        &ctx.env.class(b).children,
    )
}

fn interfaces(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.class(a).interfaces,
        &ctx.env.class(b).interfaces,
    )
}

fn implementers(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.class(a).implementers,
        &ctx.env.class(b).implementers,
    )
}

fn method_count(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_counts(ctx.env.class(a).methods.len(), ctx.env.class(b).methods.len())
}

fn field_count(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_counts(ctx.env.class(a).fields.len(), ctx.env.class(b).fields.len())
}

/// For every method of `a`, finds the most plausible counterpart among `b`'s
/// methods by cheap signature evidence and averages the best scores.
fn similar_methods(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    let methods_a = &ctx.env.class(a).methods;
    let methods_b = &ctx.env.class(b).methods;
    if methods_a.is_empty() || methods_b.is_empty() {
        return score_bool(methods_a.is_empty() && methods_b.is_empty());
    }

    let mut total = 0.0;
    for &ma in methods_a {
        let mut best: f64 = 0.0;
        for &mb in methods_b {
            if !similarity::methods_potentially_equal(ctx.env, ctx.matches, ma, mb) {
                continue;
            }
            best = best.max(method_affinity(ctx, ctx.env.method(ma), ctx.env.method(mb)));
        }
        total += best;
    }
    total / methods_a.len() as f64
}

/// Cheap affinity between two methods: return type, argument types, and
/// instruction-count similarity when both bodies are available.
fn method_affinity(ctx: &ClassifierCtx<'_>, a: &MethodDef, b: &MethodDef) -> f64 {
    let ret = score_bool(similarity::classes_potentially_equal(
        ctx.env,
        ctx.matches,
        a.ret,
        b.ret,
    ));
    let args = score_bool(similarity::types_potentially_equal(
        ctx.env,
        ctx.matches,
        &a.args,
        &b.args,
    ));
    let insns = if a.has_body() && b.has_body() {
        similarity::compare_counts(a.insns.len(), b.insns.len())
    } else {
        1.0
    };
    (ret + args + insns) / 3.0
}

fn string_constants(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_sets(
        &ctx.env.class(a).string_constants,
        &ctx.env.class(b).string_constants,
    )
}

fn numeric_constants(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    let (ca, cb) = (ctx.env.class(a), ctx.env.class(b));
    (similarity::compare_sets(&ca.int_constants, &cb.int_constants)
        + similarity::compare_sets(&ca.long_constants, &cb.long_constants)
        + similarity::compare_sets(&ca.float_constants, &cb.float_constants)
        + similarity::compare_sets(&ca.double_constants, &cb.double_constants))
        / 4.0
}

fn out_refs(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.class(a).out_refs,
        &ctx.env.class(b).out_refs,
    )
}

fn in_refs(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    similarity::compare_matchable_sets(
        ctx.env,
        ctx.matches,
        &ctx.env.class(a).in_refs,
        &ctx.env.class(b).in_refs,
    )
}

fn aggregate_method_refs(
    ctx: &ClassifierCtx<'_>,
    id: ClassId,
    pick: fn(&MethodDef) -> &[MethodId],
) -> Vec<MethodId> {
    let mut set: FxHashSet<MethodId> = FxHashSet::default();
    for &m in &ctx.env.class(id).methods {
        set.extend(pick(ctx.env.method(m)).iter().copied());
    }
    let mut refs: Vec<MethodId> = set.into_iter().collect();
    refs.sort_unstable();
    refs
}

fn aggregate_field_refs(
    ctx: &ClassifierCtx<'_>,
    id: ClassId,
    pick: fn(&MethodDef) -> &[FieldId],
) -> Vec<FieldId> {
    let mut set: FxHashSet<FieldId> = FxHashSet::default();
    for &m in &ctx.env.class(id).methods {
        set.extend(pick(ctx.env.method(m)).iter().copied());
    }
    let mut refs: Vec<FieldId> = set.into_iter().collect();
    refs.sort_unstable();
    refs
}

fn method_out_refs(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    let refs_a = aggregate_method_refs(ctx, a, |m| &m.out_refs);
    let refs_b = aggregate_method_refs(ctx, b, |m| &m.out_refs);
    similarity::compare_matchable_sets(ctx.env, ctx.matches, &refs_a, &refs_b)
}

fn method_in_refs(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    let refs_a = aggregate_method_refs(ctx, a, |m| &m.in_refs);
    let refs_b = aggregate_method_refs(ctx, b, |m| &m.in_refs);
    similarity::compare_matchable_sets(ctx.env, ctx.matches, &refs_a, &refs_b)
}

fn field_read_refs(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    let reads_a = aggregate_field_refs(ctx, a, |m| &m.field_reads);
    let reads_b = aggregate_field_refs(ctx, b, |m| &m.field_reads);
    similarity::compare_matchable_sets(ctx.env, ctx.matches, &reads_a, &reads_b)
}

fn field_write_refs(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    let writes_a = aggregate_field_refs(ctx, a, |m| &m.field_writes);
    let writes_b = aggregate_field_refs(ctx, b, |m| &m.field_writes);
    similarity::compare_matchable_sets(ctx.env, ctx.matches, &writes_a, &writes_b)
}

/// Runs the full method classifier on every non-static method of `a` against
/// `b`'s non-static methods and averages the scores of accepted matches.
fn members_full(a: ClassId, b: ClassId, ctx: &ClassifierCtx<'_>) -> f64 {
    let pool = |id: ClassId| -> Vec<MethodId> {
        ctx.env
            .class(id)
            .methods
            .iter()
            .copied()
            .filter(|&m| !ctx.env.method(m).is_static())
            .collect()
    };
    let methods_a = pool(a);
    let methods_b = pool(b);
    if methods_a.is_empty() || methods_b.is_empty() {
        return score_bool(methods_a.is_empty() && methods_b.is_empty());
    }

    let registry = method::classifiers();
    let method_max = max_score(registry, ctx.level);
    let max_mismatch = ctx.config.max_mismatch(method_max);

    let mut total = 0.0;
    for &ma in &methods_a {
        let ranking = rank(registry, ma, &methods_b, ctx, max_mismatch);
        if found_match(&ranking, method_max, ctx.config) {
            total += ranking[0].score / method_max;
        }
    }
    total / methods_a.len() as f64
}
