//! Streak length to title lookup.

/// A title earned once a streak reaches `threshold` days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    pub threshold: u32,
    pub title: &'static str,
}

/// Titles in descending threshold order. The last entry must start at 0.
pub const TIERS: [Tier; 6] = [
    Tier { threshold: 50, title: "👹 DEMON" },
    Tier { threshold: 25, title: "👑 WARLORD" },
    Tier { threshold: 15, title: "🎖️ Commander" },
    Tier { threshold: 8, title: "🛡️ Veteran" },
    Tier { threshold: 4, title: "⚔️ Soldier" },
    Tier { threshold: 0, title: "🌱 Initiate" },
];

/// Where a streak sits on the title ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    pub title: &'static str,
    pub next_title: Option<&'static str>,
    /// Days until `next_title`; 0 at the top tier.
    pub days_until_next: u32,
}

impl Rank {
    pub const fn is_max(&self) -> bool {
        self.next_title.is_none()
    }
}

/// Look up the title for a streak of `days`.
pub fn rank(days: u32) -> Rank {
    let idx = TIERS
        .iter()
        .position(|tier| days >= tier.threshold)
        .unwrap_or(TIERS.len() - 1);

    match idx.checked_sub(1).map(|next| TIERS[next]) {
        Some(next) => Rank {
            title: TIERS[idx].title,
            next_title: Some(next.title),
            days_until_next: next.threshold - days,
        },
        None => Rank {
            title: TIERS[idx].title,
            next_title: None,
            days_until_next: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier_position(title: &str) -> usize {
        TIERS.iter().rev().position(|t| t.title == title).unwrap()
    }

    #[test]
    fn thresholds_are_strictly_descending_and_start_at_zero() {
        for pair in TIERS.windows(2) {
            assert!(pair[0].threshold > pair[1].threshold);
        }
        assert_eq!(TIERS[TIERS.len() - 1].threshold, 0);
    }

    #[test]
    fn boundaries() {
        assert_eq!(rank(0).title, "🌱 Initiate");
        assert_eq!(rank(3).title, "🌱 Initiate");
        assert_eq!(rank(4).title, "⚔️ Soldier");
        assert_eq!(rank(7).title, "⚔️ Soldier");
        assert_eq!(rank(14).title, "🛡️ Veteran");
        assert_eq!(rank(15).title, "🎖️ Commander");
        assert_eq!(rank(24).title, "🎖️ Commander");
        assert_eq!(rank(25).title, "👑 WARLORD");
        assert_eq!(rank(49).title, "👑 WARLORD");
    }

    #[test]
    fn veteran_at_eight() {
        assert_eq!(
            rank(8),
            Rank {
                title: "🛡️ Veteran",
                next_title: Some("🎖️ Commander"),
                days_until_next: 7,
            }
        );
    }

    #[test]
    fn top_tier_has_no_next() {
        for days in [50, 51, 365, u32::MAX] {
            let r = rank(days);
            assert_eq!(r.title, "👹 DEMON");
            assert_eq!(r.next_title, None);
            assert_eq!(r.days_until_next, 0);
            assert!(r.is_max());
        }
    }

    #[test]
    fn fresh_streak_needs_four_days() {
        let r = rank(0);
        assert_eq!(r.next_title, Some("⚔️ Soldier"));
        assert_eq!(r.days_until_next, 4);
    }

    #[test]
    fn never_regresses_and_stays_within_tier_width() {
        let mut previous = 0;
        for days in 0..200 {
            let r = rank(days);
            let position = tier_position(r.title);
            assert!(position >= previous, "title regressed at {days}");
            previous = position;

            let idx = TIERS.iter().position(|t| t.title == r.title).unwrap();
            if idx > 0 {
                let width = TIERS[idx - 1].threshold - TIERS[idx].threshold;
                assert!(r.days_until_next >= 1 && r.days_until_next <= width);
            } else {
                assert_eq!(r.days_until_next, 0);
            }
        }
    }
}
