//! The user-visible matched-symbol report.

use std::fmt;

use crate::model::{Matchable, Matches, MatchEnv, Side};

/// Matched/total counts for one symbol kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindStats {
    /// Symbols with a partner.
    pub matched: usize,
    /// Real symbols on the reference side.
    pub total: usize,
}

impl KindStats {
    /// Matched fraction in `[0.0, 1.0]`; `1.0` for an empty kind.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

impl fmt::Display for KindStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({:.1}%)",
            self.matched,
            self.total,
            self.ratio() * 100.0
        )
    }
}

/// Matched/total counts over the reference group's real symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingStats {
    /// Class counts.
    pub classes: KindStats,
    /// Method counts.
    pub methods: KindStats,
    /// Field counts.
    pub fields: KindStats,
}

impl MatchingStats {
    /// Computes the report over group A's real symbols.
    #[must_use]
    pub fn compute(env: &MatchEnv, matches: &Matches) -> Self {
        let classes = KindStats {
            matched: env
                .real_classes(Side::A)
                .iter()
                .filter(|&&c| matches.class_match(c).is_some())
                .count(),
            total: env.real_classes(Side::A).len(),
        };
        let (mut methods_matched, mut methods_total) = (0, 0);
        for m in env.real_methods(Side::A) {
            methods_total += 1;
            if m.get_match(matches).is_some() {
                methods_matched += 1;
            }
        }
        let (mut fields_matched, mut fields_total) = (0, 0);
        for f in env.real_fields(Side::A) {
            fields_total += 1;
            if f.get_match(matches).is_some() {
                fields_matched += 1;
            }
        }
        Self {
            classes,
            methods: KindStats {
                matched: methods_matched,
                total: methods_total,
            },
            fields: KindStats {
                matched: fields_matched,
                total: fields_total,
            },
        }
    }
}

impl fmt::Display for MatchingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "classes: {}, methods: {}, fields: {}",
            self.classes, self.methods, self.fields
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_of_empty_kind() {
        let stats = KindStats {
            matched: 0,
            total: 0,
        };
        assert_eq!(stats.ratio(), 1.0);
        assert_eq!(stats.to_string(), "0/0 (100.0%)");
    }

    #[test]
    fn test_display() {
        let stats = KindStats {
            matched: 3,
            total: 4,
        };
        assert_eq!(stats.to_string(), "3/4 (75.0%)");
    }
}
