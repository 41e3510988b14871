use glowtap::RoundOutcome;

/// (round, reaction ms) for every correct press
pub fn reaction_points(outcomes: &[RoundOutcome]) -> Vec<(f64, f64)> {
    outcomes
        .iter()
        .filter_map(|o| {
            o.reaction_time_ms()
                .map(|ms| (o.round_index() as f64, ms as f64))
        })
        .collect()
}

/// X (last round) and Y (slowest reaction, rounded up to 100ms) bounds
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let last_round = points.iter().map(|&(x, _)| x).fold(1.0, f64::max);
    let slowest = points.iter().map(|&(_, y)| y).fold(0.0, f64::max);

    (last_round, ((slowest / 100.0).ceil() * 100.0).max(100.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glowtap::Classification;

    #[test]
    fn test_reaction_points_skip_misses() {
        let outcomes = vec![
            RoundOutcome::correct(1, 300, 0),
            RoundOutcome::missed(2, Classification::Wrong),
            RoundOutcome::correct(3, 250, 0),
        ];
        assert_eq!(
            reaction_points(&outcomes),
            vec![(1.0, 300.0), (3.0, 250.0)]
        );
    }

    #[test]
    fn test_compute_chart_params() {
        assert_eq!(compute_chart_params(&[]), (1.0, 100.0));
        assert_eq!(
            compute_chart_params(&[(1.0, 310.0), (4.0, 280.0)]),
            (4.0, 400.0)
        );
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
