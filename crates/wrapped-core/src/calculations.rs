use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::ToolUsage;
use crate::time_utils::parse_date_key;

// ── StreakCalculator ──────────────────────────────────────────────────────────

/// Longest run of consecutive active calendar days.
pub struct StreakCalculator;

impl StreakCalculator {
    /// Compute the longest streak from a `YYYY-MM-DD` → count histogram.
    ///
    /// Only keys with a positive count are active. Keys that are not valid
    /// dates are ignored. Returns `0` when nothing is active.
    pub fn longest_streak(daily: &BTreeMap<String, u64>) -> u64 {
        let mut days: Vec<NaiveDate> = daily
            .iter()
            .filter(|(_, count)| **count > 0)
            .filter_map(|(key, _)| parse_date_key(key))
            .collect();
        days.sort_unstable();
        days.dedup();

        Self::longest_run(&days)
    }

    /// Longest run in a sorted, deduplicated list of dates.
    fn longest_run(days: &[NaiveDate]) -> u64 {
        let Some(first) = days.first() else {
            return 0;
        };

        let mut longest = 1u64;
        let mut current = 1u64;
        let mut previous = *first;

        for day in &days[1..] {
            if previous.succ_opt() == Some(*day) {
                current += 1;
                longest = longest.max(current);
            } else {
                current = 1;
            }
            previous = *day;
        }

        longest
    }
}

// ── HighlightCalculator ───────────────────────────────────────────────────────

/// Picks the extreme entries of count maps.
///
/// All functions iterate in key order and only replace the current pick on a
/// strict improvement, so ties resolve to the lexicographically first key.
pub struct HighlightCalculator;

impl HighlightCalculator {
    /// The key with the highest positive count.
    pub fn busiest<K: Clone + Ord>(counts: &BTreeMap<K, u64>) -> Option<(K, u64)> {
        let mut best: Option<(&K, u64)> = None;
        for (key, &count) in counts {
            if count == 0 {
                continue;
            }
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((key, count)),
            }
        }
        best.map(|(k, c)| (k.clone(), c))
    }

    /// The tool with the lowest positive invocation count.
    pub fn least_used_tool(tools: &BTreeMap<String, u64>) -> Option<ToolUsage> {
        let mut least: Option<(&String, u64)> = None;
        for (name, &count) in tools {
            if count == 0 {
                continue;
            }
            match least {
                Some((_, least_count)) if count >= least_count => {}
                _ => least = Some((name, count)),
            }
        }
        least.map(|(name, count)| ToolUsage {
            name: name.clone(),
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar(days: &[(&str, u64)]) -> BTreeMap<String, u64> {
        days.iter().map(|(d, c)| (d.to_string(), *c)).collect()
    }

    // ── StreakCalculator ──────────────────────────────────────────────────────

    #[test]
    fn test_streak_with_gap() {
        let daily = calendar(&[
            ("2024-01-01", 1),
            ("2024-01-02", 1),
            ("2024-01-03", 1),
            ("2024-01-05", 1),
        ]);
        assert_eq!(StreakCalculator::longest_streak(&daily), 3);
    }

    #[test]
    fn test_streak_empty() {
        assert_eq!(StreakCalculator::longest_streak(&BTreeMap::new()), 0);
    }

    #[test]
    fn test_streak_single_day() {
        let daily = calendar(&[("2024-06-10", 7)]);
        assert_eq!(StreakCalculator::longest_streak(&daily), 1);
    }

    #[test]
    fn test_streak_crosses_month_and_leap_day() {
        let daily = calendar(&[
            ("2024-02-28", 1),
            ("2024-02-29", 2),
            ("2024-03-01", 1),
            ("2024-03-02", 1),
        ]);
        assert_eq!(StreakCalculator::longest_streak(&daily), 4);
    }

    #[test]
    fn test_streak_crosses_year_boundary() {
        let daily = calendar(&[("2023-12-31", 1), ("2024-01-01", 1)]);
        assert_eq!(StreakCalculator::longest_streak(&daily), 2);
    }

    #[test]
    fn test_streak_ignores_zero_counts_and_bad_keys() {
        let daily = calendar(&[
            ("2024-01-01", 1),
            ("2024-01-02", 0),
            ("2024-01-03", 1),
            ("not-a-date", 9),
        ]);
        assert_eq!(StreakCalculator::longest_streak(&daily), 1);
    }

    #[test]
    fn test_streak_later_run_is_longer() {
        let daily = calendar(&[
            ("2024-01-01", 1),
            ("2024-01-02", 1),
            ("2024-01-10", 1),
            ("2024-01-11", 1),
            ("2024-01-12", 1),
            ("2024-01-13", 1),
        ]);
        assert_eq!(StreakCalculator::longest_streak(&daily), 4);
    }

    // ── HighlightCalculator ───────────────────────────────────────────────────

    #[test]
    fn test_busiest_picks_max() {
        let daily = calendar(&[("2024-01-01", 3), ("2024-01-02", 9), ("2024-01-03", 4)]);
        assert_eq!(
            HighlightCalculator::busiest(&daily),
            Some(("2024-01-02".to_string(), 9))
        );
    }

    #[test]
    fn test_busiest_tie_prefers_first_key() {
        let daily = calendar(&[("2024-01-05", 4), ("2024-01-01", 4)]);
        assert_eq!(
            HighlightCalculator::busiest(&daily),
            Some(("2024-01-01".to_string(), 4))
        );
    }

    #[test]
    fn test_busiest_empty_or_all_zero() {
        assert_eq!(HighlightCalculator::busiest::<String>(&BTreeMap::new()), None);
        assert_eq!(
            HighlightCalculator::busiest(&calendar(&[("2024-01-01", 0)])),
            None
        );
    }

    #[test]
    fn test_least_used_tool() {
        let tools = calendar(&[("Bash", 40), ("Glob", 2), ("Read", 2), ("Write", 5)]);
        assert_eq!(
            HighlightCalculator::least_used_tool(&tools),
            Some(ToolUsage {
                name: "Glob".to_string(),
                count: 2
            })
        );
    }

    #[test]
    fn test_least_used_tool_none_when_empty() {
        assert_eq!(HighlightCalculator::least_used_tool(&BTreeMap::new()), None);
    }
}
