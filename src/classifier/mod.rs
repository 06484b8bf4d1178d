//! The weighted classifier framework.
//!
//! A classifier is a named, weighted scoring function over a pair of same-kind
//! symbols, annotated with the earliest [`MatchLevel`] it participates at.
//! Ranking a source against a candidate pool runs every active classifier in
//! registration order, accumulating a weighted score and a weighted mismatch;
//! a candidate whose mismatch crosses the caller-supplied budget is abandoned
//! without finishing the remaining classifiers.
//!
//! Acceptance ([`found_match`]) squares the normalized top score before
//! thresholding, which biases the gate toward confident winners, and then
//! demands a relative margin over the runner-up.
//!
//! # Key Components
//!
//! - [`Classifier`] - One named, weighted scoring function
//! - [`ClassifierCtx`] - The borrowed state scores are computed against
//! - [`rank`] - Per-source candidate ranking with early pruning
//! - [`found_match`] - The acceptance gate
//! - [`class`], [`method`], [`field`] - The three registries

pub mod class;
pub mod field;
pub mod method;

use crate::matcher::MatcherConfig;
use crate::model::resolve::ResolveCache;
use crate::model::{Matchable, Matches, MatchEnv};

/// The four matching levels, in strict order.
///
/// A classifier is active at its minimum level and every later one; later
/// levels therefore rank with strictly more evidence.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumIter,
)]
pub enum MatchLevel {
    /// Structure-only evidence: names, hierarchy, signatures, constants.
    Initial,
    /// Adds member cross-reference evidence.
    Secondary,
    /// Adds recursive full-member scoring.
    Tertiary,
    /// Adds the expensive lockstep flow comparison.
    Extra,
}

/// Borrowed state a classifier scores against.
pub struct ClassifierCtx<'a> {
    /// The immutable environment.
    pub env: &'a MatchEnv,
    /// The current match table.
    pub matches: &'a Matches,
    /// Engine configuration (thresholds, inlining).
    pub config: &'a MatcherConfig,
    /// Pass-wide member resolution cache.
    pub cache: &'a ResolveCache,
    /// The level the current pass ranks at.
    pub level: MatchLevel,
}

/// A named, weighted scoring function over a pair of same-kind symbols.
pub struct Classifier<S: Matchable> {
    /// Name used in rank traces and diagnostics.
    pub name: &'static str,
    /// Weight applied to this classifier's score.
    pub weight: f64,
    /// Earliest level this classifier participates at.
    pub min_level: MatchLevel,
    /// The scoring function; returns a value in `[0.0, 1.0]`.
    pub score: fn(S, S, &ClassifierCtx<'_>) -> f64,
}

impl<S: Matchable> Classifier<S> {
    /// Returns true if this classifier participates at `level`.
    #[must_use]
    pub fn active_at(&self, level: MatchLevel) -> bool {
        level >= self.min_level
    }
}

/// One ranked candidate.
#[derive(Debug, Clone)]
pub struct RankResult<S> {
    /// The candidate symbol.
    pub subject: S,
    /// Accumulated weighted score.
    pub score: f64,
    /// Per-classifier trace: `(name, raw score)` in registration order.
    pub trace: Vec<(&'static str, f64)>,
}

/// Sum of the weights active at a level; the ceiling a score is normalized by.
#[must_use]
pub fn max_score<S: Matchable>(classifiers: &[Classifier<S>], level: MatchLevel) -> f64 {
    classifiers
        .iter()
        .filter(|c| c.active_at(level))
        .map(|c| c.weight)
        .sum()
}

/// Ranks a source symbol against a candidate pool.
///
/// Candidates failing the potential-equality filter are skipped outright;
/// candidates whose accumulated weighted mismatch reaches `max_mismatch` are
/// abandoned mid-scoring. Results are sorted by score descending, ties broken
/// by candidate id so that ranking is deterministic.
#[must_use]
pub fn rank<S: Matchable>(
    classifiers: &[Classifier<S>],
    source: S,
    candidates: &[S],
    ctx: &ClassifierCtx<'_>,
    max_mismatch: f64,
) -> Vec<RankResult<S>> {
    let mut results: Vec<RankResult<S>> = Vec::new();

    'candidates: for &candidate in candidates {
        if !S::potentially_equal(source, candidate, ctx.env, ctx.matches) {
            continue;
        }
        let mut score = 0.0;
        let mut mismatch = 0.0;
        let mut trace = Vec::new();
        for classifier in classifiers.iter().filter(|c| c.active_at(ctx.level)) {
            let raw = (classifier.score)(source, candidate, ctx);
            score += classifier.weight * raw;
            mismatch += classifier.weight * (1.0 - raw);
            if mismatch >= max_mismatch {
                continue 'candidates;
            }
            trace.push((classifier.name, raw));
        }
        results.push(RankResult {
            subject: candidate,
            score,
            trace,
        });
    }

    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.subject.cmp(&b.subject))
    });
    results
}

/// The acceptance gate over a ranking.
///
/// With `s_n = (rank[n].score / max_score)^2`: reject when `s_1` falls below
/// the absolute threshold; accept a sole candidate; otherwise accept iff
/// `s_2 < s_1 * (1 - relative_threshold)`.
#[must_use]
pub fn found_match<S>(ranking: &[RankResult<S>], max_score: f64, config: &MatcherConfig) -> bool {
    let Some(first) = ranking.first() else {
        return false;
    };
    if max_score <= 0.0 {
        return false;
    }
    let s1 = (first.score / max_score).powi(2);
    if s1 < config.absolute_threshold {
        return false;
    }
    match ranking.get(1) {
        None => true,
        Some(second) => {
            let s2 = (second.score / max_score).powi(2);
            s2 < s1 * (1.0 - config.relative_threshold)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassId;

    fn result(subject: usize, score: f64) -> RankResult<ClassId> {
        RankResult {
            subject: ClassId::new(subject),
            score,
            trace: Vec::new(),
        }
    }

    #[test]
    fn test_found_match_empty_ranking() {
        let config = MatcherConfig::default();
        assert!(!found_match::<ClassId>(&[], 10.0, &config));
    }

    #[test]
    fn test_found_match_absolute_threshold() {
        let config = MatcherConfig::default();
        // (4/10)^2 = 0.16 < 0.25: rejected even as sole candidate.
        assert!(!found_match(&[result(0, 4.0)], 10.0, &config));
        // (6/10)^2 = 0.36 >= 0.25: accepted as sole candidate.
        assert!(found_match(&[result(0, 6.0)], 10.0, &config));
    }

    #[test]
    fn test_found_match_relative_margin() {
        let config = MatcherConfig::default();
        // s1 = 0.81, s2 = 0.7921: 0.7921 >= 0.81 * 0.975, too close.
        assert!(!found_match(&[result(0, 9.0), result(1, 8.9)], 10.0, &config));
        // s1 = 0.81, s2 = 0.36: clear margin.
        assert!(found_match(&[result(0, 9.0), result(1, 6.0)], 10.0, &config));
    }

    #[test]
    fn test_level_ordering() {
        assert!(MatchLevel::Initial < MatchLevel::Secondary);
        assert!(MatchLevel::Tertiary < MatchLevel::Extra);
        let c = Classifier::<ClassId> {
            name: "test",
            weight: 1.0,
            min_level: MatchLevel::Secondary,
            score: |_, _, _| 0.0,
        };
        assert!(!c.active_at(MatchLevel::Initial));
        assert!(c.active_at(MatchLevel::Secondary));
        assert!(c.active_at(MatchLevel::Extra));
    }
}
