use crate::mode::GameMode;

/// Floor on base points so slow-but-correct presses still count
pub const MIN_BASE_POINTS: u64 = 10;

/// Points a reaction is worth before the combo multiplier
pub fn base_points(reaction_time_ms: u64) -> u64 {
    1_000u64.saturating_sub(reaction_time_ms).max(MIN_BASE_POINTS)
}

/// Time-attack points for a correct press.
///
/// `combo` is the streak length including this press, so the first hit of
/// a streak scores at 1.0x and every further hit adds 0.1x. Integer math
/// keeps `floor(base * (1 + (combo - 1) * 0.1))` exact.
pub fn points(reaction_time_ms: u64, combo: u32) -> u64 {
    let combo = u64::from(combo.max(1));
    base_points(reaction_time_ms) * (9 + combo) / 10
}

/// Points awarded in a given mode; only time attack scores
pub fn points_for_mode(mode: GameMode, reaction_time_ms: u64, combo: u32) -> u64 {
    if mode.awards_points() {
        points(reaction_time_ms, combo)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_hit_is_unmultiplied() {
        assert_eq!(points(500, 1), 500);
        assert_eq!(points(250, 1), 750);
    }

    #[test]
    fn combo_sequence_of_three() {
        let awarded: Vec<u64> = (1..=3).map(|combo| points(500, combo)).collect();
        assert_eq!(awarded, vec![500, 550, 600]);
    }

    #[test]
    fn slow_reactions_hit_the_floor() {
        assert_eq!(base_points(995), MIN_BASE_POINTS);
        assert_eq!(base_points(5_000), MIN_BASE_POINTS);
        assert_eq!(points(5_000, 1), 10);
        assert_eq!(points(5_000, 11), 20);
    }

    #[test]
    fn points_non_increasing_in_reaction_time() {
        for combo in [1, 2, 5, 20] {
            let mut last = u64::MAX;
            for rt in (100..=1_500).step_by(7) {
                let p = points(rt, combo);
                assert!(p <= last, "combo {combo}: {rt}ms gave {p} > {last}");
                last = p;
            }
        }
    }

    #[test]
    fn points_non_decreasing_in_combo() {
        for rt in [100, 333, 640, 999, 2_000] {
            let mut last = 0;
            for combo in 1..=30 {
                let p = points(rt, combo);
                assert!(p >= last);
                last = p;
            }
        }
    }

    #[test]
    fn zero_combo_treated_as_first_hit() {
        assert_eq!(points(400, 0), points(400, 1));
    }

    #[test]
    fn non_scoring_modes_award_nothing() {
        assert_eq!(points_for_mode(GameMode::Endurance, 200, 3), 0);
        assert_eq!(points_for_mode(GameMode::Unlimited, 200, 3), 0);
        assert_eq!(points_for_mode(GameMode::TimeAttack, 200, 1), 800);
    }
}
