use rand::Rng;

use crate::mode::{Difficulty, DifficultySettings, GameMode};

/// Shortest stimulus delay time pressure may produce
pub const MIN_SCALED_DELAY_MS: u64 = 200;

/// Fraction of the base delay shaved off once the time-attack clock is spent
pub const TIME_PRESSURE_FACTOR: f64 = 0.4;

/// Uniform integer in the tier's `[min, max]` delay window
pub fn sample_base_delay<R: Rng + ?Sized>(rng: &mut R, settings: &DifficultySettings) -> u64 {
    rng.gen_range(settings.min_delay_ms..=settings.max_delay_ms)
}

/// How much of the time-attack clock has elapsed, clamped to `[0, 1]`
pub fn time_progress(time_remaining_ms: u64, time_limit_ms: u64) -> f64 {
    if time_limit_ms == 0 {
        return 1.0;
    }
    let elapsed = time_limit_ms.saturating_sub(time_remaining_ms) as f64;
    (elapsed / time_limit_ms as f64).clamp(0.0, 1.0)
}

/// Apply time-attack pressure to a sampled base delay.
///
/// Outside time attack the base delay is returned untouched. In time attack
/// the delay shrinks linearly with elapsed time, never below
/// [`MIN_SCALED_DELAY_MS`].
pub fn scaled_delay(
    base_delay_ms: u64,
    mode: GameMode,
    time_remaining_ms: Option<u64>,
    time_limit_ms: u64,
) -> u64 {
    match (mode, time_remaining_ms) {
        (GameMode::TimeAttack, Some(remaining)) => {
            let progress = time_progress(remaining, time_limit_ms);
            let multiplier = 1.0 - TIME_PRESSURE_FACTOR * progress;
            let scaled = (base_delay_ms as f64 * multiplier).floor() as u64;
            scaled.max(MIN_SCALED_DELAY_MS)
        }
        _ => base_delay_ms,
    }
}

/// Delay before the next stimulus is armed
pub fn next_delay<R: Rng + ?Sized>(
    rng: &mut R,
    mode: GameMode,
    difficulty: Difficulty,
    time_remaining_ms: Option<u64>,
) -> u64 {
    let settings = difficulty.settings();
    let base = sample_base_delay(rng, &settings);
    scaled_delay(base, mode, time_remaining_ms, settings.time_limit_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn base_delay_stays_inside_tier_window() {
        let mut rng = StdRng::seed_from_u64(7);
        for difficulty in [
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Hell,
        ] {
            let settings = difficulty.settings();
            for _ in 0..500 {
                let d = sample_base_delay(&mut rng, &settings);
                assert!(d >= settings.min_delay_ms && d <= settings.max_delay_ms);
            }
        }
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(time_progress(60_000, 60_000), 0.0);
        assert_eq!(time_progress(0, 60_000), 1.0);
        assert_eq!(time_progress(30_000, 60_000), 0.5);
        // remaining above the limit counts as no progress
        assert_eq!(time_progress(90_000, 60_000), 0.0);
        assert_eq!(time_progress(0, 0), 1.0);
    }

    #[test]
    fn non_time_attack_modes_are_unscaled() {
        assert_eq!(scaled_delay(3_000, GameMode::Endurance, None, 60_000), 3_000);
        assert_eq!(
            scaled_delay(3_000, GameMode::Unlimited, Some(0), 60_000),
            3_000
        );
    }

    #[test]
    fn time_attack_full_clock_keeps_base_delay() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let d = next_delay(&mut rng, GameMode::TimeAttack, Difficulty::Easy, Some(60_000));
            assert!((2_000..=4_000).contains(&d), "delay {d} outside easy window");
        }
    }

    #[test]
    fn time_attack_spent_clock_shrinks_delay() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..200 {
            let d = next_delay(&mut rng, GameMode::TimeAttack, Difficulty::Easy, Some(0));
            assert!((1_200..=2_400).contains(&d), "delay {d} not scaled by 0.6");
            assert!(d >= MIN_SCALED_DELAY_MS);
        }
    }

    #[test]
    fn scaled_delay_clamps_to_floor() {
        assert_eq!(
            scaled_delay(300, GameMode::TimeAttack, Some(0), 30_000),
            MIN_SCALED_DELAY_MS
        );
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..200 {
            let d = next_delay(&mut rng, GameMode::TimeAttack, Difficulty::Hell, Some(0));
            assert!(d >= MIN_SCALED_DELAY_MS);
            assert!(d <= 480);
        }
    }

    #[test]
    fn delay_is_non_increasing_as_clock_runs_down() {
        let mut last = u64::MAX;
        for remaining in (0..=60_000).rev().step_by(5_000) {
            let d = scaled_delay(4_000, GameMode::TimeAttack, Some(remaining), 60_000);
            assert!(d <= last);
            last = d;
        }
    }
}
