//! Top-level matching orchestration.
//!
//! The [`Matcher`] drives the engine to fixpoint:
//!
//! 1. **Seed pass** - classes whose non-obfuscated names agree are matched
//!    outright, with member propagation through names and matched overrides.
//! 2. **Initial class pass** - ranked class matching on structural evidence;
//!    run a second time when the first run made progress, since hierarchy
//!    evidence stabilizes after the first commits.
//! 3. **Per-level refinement** - at `Secondary`, `Tertiary`, and `Extra`,
//!    alternate static/non-static method and field passes with class passes
//!    until a full iteration adds nothing.
//!
//! Every pass ranks its sources on the worker pool against an immutable
//! snapshot of the match table, publishes proposals into a concurrent sorted
//! map, resolves conflicts (a destination claimed twice drops every claimant
//! for the pass), and commits the survivors serially. Commit order follows
//! the sorted source ids, so runs are deterministic for identical inputs.

mod config;
mod stats;

pub use config::MatcherConfig;
pub use stats::{KindStats, MatchingStats};

use crossbeam_skiplist::SkipMap;
use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::classifier::{
    class, field, found_match, max_score, method, rank, Classifier, ClassifierCtx, MatchLevel,
};
use crate::model::resolve::ResolveCache;
use crate::model::{
    is_name_obfuscated, ClassId, FieldId, Matchable, Matches, MatchEnv, MethodId, Side,
};
use crate::{Error, Result};

/// The matching engine.
///
/// Owns the configuration and the bounded worker pool; the environment and
/// match table are borrowed per run, so one matcher can serve many inputs.
pub struct Matcher {
    config: MatcherConfig,
    pool: rayon::ThreadPool,
}

impl Matcher {
    /// Creates a matcher with its worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadPool`] when the pool cannot be constructed.
    pub fn new(config: MatcherConfig) -> Result<Self> {
        let threads = config.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
                .max(1)
        });
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?;
        Ok(Self { config, pool })
    }

    /// Returns the configuration this matcher runs with.
    #[must_use]
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Runs the engine to fixpoint.
    ///
    /// The match table grows monotonically; running again on the produced
    /// table adds nothing and retracts nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PassFailed`] when a worker task dies; no partial
    /// results of the failed pass are committed.
    pub fn run(&self, env: &MatchEnv, matches: &mut Matches) -> Result<MatchingStats> {
        seed_matches(env, matches);
        debug!("seed pass done: {}", MatchingStats::compute(env, matches));

        let added = self.match_classes(MatchLevel::Initial, env, matches)?;
        if added > 0 {
            self.match_classes(MatchLevel::Initial, env, matches)?;
        }

        for level in [MatchLevel::Secondary, MatchLevel::Tertiary, MatchLevel::Extra] {
            let mut class_pass_added = true;
            loop {
                let mut members = 0;
                members += self.match_methods(level, env, matches, true)?;
                members += self.match_fields(level, env, matches, true)?;
                members += self.match_methods(level, env, matches, false)?;
                members += self.match_fields(level, env, matches, false)?;
                if members == 0 && !class_pass_added {
                    break;
                }
                class_pass_added = self.match_classes(level, env, matches)? > 0;
                if members == 0 && !class_pass_added {
                    break;
                }
            }
            debug!("level {level} done: {}", MatchingStats::compute(env, matches));
        }

        let stats = MatchingStats::compute(env, matches);
        info!("matching done: {stats}");
        Ok(stats)
    }

    /// One ranked class pass at a level. Returns the number of new matches.
    fn match_classes(
        &self,
        level: MatchLevel,
        env: &MatchEnv,
        matches: &mut Matches,
    ) -> Result<usize> {
        let sources: Vec<ClassId> = env
            .real_classes(Side::A)
            .iter()
            .copied()
            .filter(|&c| matches.class_match(c).is_none())
            .collect();
        let candidates: Vec<ClassId> = env
            .real_classes(Side::B)
            .iter()
            .copied()
            .filter(|&c| matches.class_match(c).is_none())
            .collect();

        let proposals =
            self.rank_pass("classes", level, env, matches, class::classifiers(), |_| {
                sources.iter().map(|&s| (s, s)).collect()
            }, &candidates)?;

        let mut added = 0;
        for (source, dest) in resolve_conflicts(&proposals) {
            // An earlier commit of this pass may have claimed either side
            // through hierarchy or member propagation.
            if matches.class_match(source).is_some() || matches.class_match(dest).is_some() {
                continue;
            }
            commit_class_match(env, matches, source, dest);
            added += 1;
        }
        debug!("class pass at {level}: {added} new matches");
        Ok(added)
    }

    /// One ranked method pass at a level over one static category.
    fn match_methods(
        &self,
        level: MatchLevel,
        env: &MatchEnv,
        matches: &mut Matches,
        static_only: bool,
    ) -> Result<usize> {
        let candidates: Vec<MethodId> = env
            .real_methods(Side::B)
            .filter(|&m| {
                matches.method_match(m).is_none() && env.method(m).is_static() == static_only
            })
            .collect();

        let proposals = self.rank_pass(
            "methods",
            level,
            env,
            matches,
            method::classifiers(),
            |matches| {
                env.real_classes(Side::A)
                    .iter()
                    .flat_map(|&c| env.class(c).methods.iter().copied().map(move |m| (c, m)))
                    .filter(|&(_, m)| {
                        matches.method_match(m).is_none()
                            && env.method(m).is_static() == static_only
                    })
                    .collect()
            },
            &candidates,
        )?;

        let mut added = 0;
        for (source, dest) in resolve_conflicts(&proposals) {
            if matches.method_match(source).is_some() || matches.method_match(dest).is_some() {
                continue;
            }
            commit_method_match(env, matches, source, dest, true);
            added += 1;
        }
        debug!(
            "method pass at {level} (static: {static_only}): {added} new matches"
        );
        Ok(added)
    }

    /// One ranked field pass at a level over one static category.
    fn match_fields(
        &self,
        level: MatchLevel,
        env: &MatchEnv,
        matches: &mut Matches,
        static_only: bool,
    ) -> Result<usize> {
        let candidates: Vec<FieldId> = env
            .real_fields(Side::B)
            .filter(|&f| {
                matches.field_match(f).is_none() && env.field(f).is_static() == static_only
            })
            .collect();

        let proposals = self.rank_pass(
            "fields",
            level,
            env,
            matches,
            field::classifiers(),
            |matches| {
                env.real_classes(Side::A)
                    .iter()
                    .flat_map(|&c| env.class(c).fields.iter().copied().map(move |f| (c, f)))
                    .filter(|&(_, f)| {
                        matches.field_match(f).is_none()
                            && env.field(f).is_static() == static_only
                    })
                    .collect()
            },
            &candidates,
        )?;

        let mut added = 0;
        for (source, dest) in resolve_conflicts(&proposals) {
            if matches.field_match(source).is_some() || matches.field_match(dest).is_some() {
                continue;
            }
            commit_field_match(env, matches, source, dest);
            added += 1;
        }
        debug!(
            "field pass at {level} (static: {static_only}): {added} new matches"
        );
        Ok(added)
    }

    /// Runs the parallel ranking phase of one pass.
    ///
    /// Sources are grouped by owning class (one task per source class) and
    /// ranked against the shared candidate pool on the worker pool; accepted
    /// proposals land in a sorted concurrent map keyed by source id. The
    /// match table is only read during this phase; commits happen serially
    /// in the caller after the pool has joined.
    fn rank_pass<S: Matchable>(
        &self,
        pass: &'static str,
        level: MatchLevel,
        env: &MatchEnv,
        matches: &Matches,
        registry: &'static [Classifier<S>],
        sources: impl FnOnce(&Matches) -> Vec<(ClassId, S)>,
        candidates: &[S],
    ) -> Result<SkipMap<S, S>> {
        let proposals: SkipMap<S, S> = SkipMap::new();
        let sources = sources(matches);
        if sources.is_empty() || candidates.is_empty() {
            return Ok(proposals);
        }

        let mut by_class: FxHashMap<ClassId, Vec<S>> = FxHashMap::default();
        for (owner, source) in sources {
            by_class.entry(owner).or_default().push(source);
        }
        let mut tasks: Vec<(ClassId, Vec<S>)> = by_class.into_iter().collect();
        tasks.sort_unstable_by_key(|(owner, _)| *owner);

        let max = max_score(registry, level);
        let max_mismatch = self.config.max_mismatch(max);
        let cache = ResolveCache::new();
        let config = &self.config;

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.pool.install(|| {
                tasks.par_iter().for_each(|(_, task_sources)| {
                    let ctx = ClassifierCtx {
                        env,
                        matches,
                        config,
                        cache: &cache,
                        level,
                    };
                    for &source in task_sources {
                        let ranking = rank(registry, source, candidates, &ctx, max_mismatch);
                        if found_match(&ranking, max, config) {
                            proposals.insert(source, ranking[0].subject);
                        }
                    }
                });
            });
        }));
        match outcome {
            Ok(()) => Ok(proposals),
            Err(_) => Err(Error::PassFailed { pass }),
        }
    }
}

/// Drops every proposal whose destination is claimed more than once and
/// returns the survivors in source order.
fn resolve_conflicts<S: Matchable>(proposals: &SkipMap<S, S>) -> Vec<(S, S)> {
    let mut claims: FxHashMap<S, usize> = FxHashMap::default();
    for entry in proposals.iter() {
        *claims.entry(*entry.value()).or_default() += 1;
    }
    proposals
        .iter()
        .filter(|entry| claims[entry.value()] == 1)
        .map(|entry| (*entry.key(), *entry.value()))
        .collect()
}

/// Seeds matches from surviving names and matched overrides.
fn seed_matches(env: &MatchEnv, matches: &mut Matches) {
    for &a in env.real_classes(Side::A) {
        if matches.class_match(a).is_some() {
            continue;
        }
        let name = &env.class(a).name;
        if is_name_obfuscated(name) {
            continue;
        }
        if let Some(b) = env.class_by_name(Side::B, name) {
            if matches.class_match(b).is_none() {
                commit_class_match(env, matches, a, b);
            }
        }
    }

    // Members whose signatures agree through an already-matched override.
    for &a in env.real_classes(Side::A) {
        let Some(b) = matches.class_match(a) else {
            continue;
        };
        for &ma in &env.class(a).methods {
            if matches.method_match(ma).is_some() {
                continue;
            }
            for &oa in &env.method(ma).overrides {
                let Some(ob) = matches.method_match(oa) else {
                    continue;
                };
                let partner_sig = env.method(ob);
                if let Some(mb) =
                    env.class(b)
                        .find_method(env, &partner_sig.name, &partner_sig.desc)
                {
                    if matches.method_match(mb).is_none()
                        && env.method(mb).overrides.contains(&ob)
                    {
                        commit_method_match(env, matches, ma, mb, true);
                        break;
                    }
                }
            }
        }
        for &fa in &env.class(a).fields {
            if matches.field_match(fa).is_some() {
                continue;
            }
            for &oa in &env.field(fa).overrides {
                let Some(ob) = matches.field_match(oa) else {
                    continue;
                };
                let partner_sig = env.field(ob);
                if let Some(fb) =
                    env.class(b)
                        .find_field(env, &partner_sig.name, &partner_sig.desc)
                {
                    if matches.field_match(fb).is_none() {
                        commit_field_match(env, matches, fa, fb);
                        break;
                    }
                }
            }
        }
    }
}

/// Commits a class match and propagates into members with surviving names.
fn commit_class_match(env: &MatchEnv, matches: &mut Matches, a: ClassId, b: ClassId) {
    matches.set_class(a, b);
    debug!(
        "matched class {} -> {}",
        env.class(a).name,
        env.class(b).name
    );

    for &ma in &env.class(a).methods {
        if matches.method_match(ma).is_some() {
            continue;
        }
        let def = env.method(ma);
        if is_name_obfuscated(&def.name) {
            continue;
        }
        if let Some(mb) = env.class(b).find_method(env, &def.name, &def.desc) {
            if matches.method_match(mb).is_none() && !is_name_obfuscated(&env.method(mb).name) {
                commit_method_match(env, matches, ma, mb, true);
            }
        }
    }
    for &fa in &env.class(a).fields {
        if matches.field_match(fa).is_some() {
            continue;
        }
        let def = env.field(fa);
        if is_name_obfuscated(&def.name) {
            continue;
        }
        if let Some(fb) = env.class(b).find_field(env, &def.name, &def.desc) {
            if matches.field_match(fb).is_none() && !is_name_obfuscated(&env.field(fb).name) {
                commit_field_match(env, matches, fa, fb);
            }
        }
    }
}

/// Commits a method match; when `match_hierarchy` is set, also pairs the
/// override counterparts in matched ancestor classes. The recursive call
/// passes `match_hierarchy = false`, which is what bounds the recursion.
fn commit_method_match(
    env: &MatchEnv,
    matches: &mut Matches,
    a: MethodId,
    b: MethodId,
    match_hierarchy: bool,
) {
    matches.set_method(a, b);
    debug!(
        "matched method {}.{}{} -> {}.{}{}",
        env.class(env.method(a).owner).name,
        env.method(a).name,
        env.method(a).desc,
        env.class(env.method(b).owner).name,
        env.method(b).name,
        env.method(b).desc
    );

    if !match_hierarchy {
        return;
    }
    let partner_sig = env.method(b);
    for &oa in &env.method(a).overrides {
        if matches.method_match(oa).is_some() {
            continue;
        }
        let Some(owner_partner) = matches.class_match(env.method(oa).owner) else {
            continue;
        };
        if let Some(ob) =
            env.class(owner_partner)
                .find_method(env, &partner_sig.name, &partner_sig.desc)
        {
            if matches.method_match(ob).is_none() {
                commit_method_match(env, matches, oa, ob, false);
            }
        }
    }
}

/// Commits a field match.
fn commit_field_match(env: &MatchEnv, matches: &mut Matches, a: FieldId, b: FieldId) {
    matches.set_field(a, b);
    debug!(
        "matched field {}.{}:{} -> {}.{}:{}",
        env.class(env.field(a).owner).name,
        env.field(a).name,
        env.field(a).desc,
        env.class(env.field(b).owner).name,
        env.field(b).name,
        env.field(b).desc
    );
}
