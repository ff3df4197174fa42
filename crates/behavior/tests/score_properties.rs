use behavior::{BehaviorAnalyzer, BehaviorRiskLevel, EventSeverity};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use telemetry::TelemetrySample;

fn build(readings: &[(f64, Option<f64>, i64)]) -> Vec<TelemetrySample> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut offset = 0;
    readings
        .iter()
        .map(|&(speed, steering, step)| {
            offset += step;
            let sample = TelemetrySample::new(start + Duration::milliseconds(offset), speed, 12.9, 77.6);
            match steering {
                Some(angle) => sample.with_steering_angle(angle),
                None => sample,
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn overall_score_stays_in_range(
        readings in prop::collection::vec(
            (0.0f64..220.0, prop::option::of(-90.0f64..90.0), 0i64..3000),
            0..150,
        )
    ) {
        let window = build(&readings);
        let result = BehaviorAnalyzer::default().analyze_behavior(&window);

        prop_assert!((0.0..=100.0).contains(&result.overall_score));
        prop_assert!((0.0..=100.0).contains(&result.insights.aggressive_driving_score));
        prop_assert!(!result.insights.phone_usage_detected);
        prop_assert!(result.recommendations.len() <= 7);

        if result.events.iter().any(|e| e.severity == EventSeverity::Critical) {
            prop_assert_eq!(result.risk_level, BehaviorRiskLevel::Dangerous);
        }
    }

    #[test]
    fn events_never_precede_window(
        readings in prop::collection::vec((0.0f64..160.0, prop::option::of(-60.0f64..60.0), 1i64..2000), 2..60)
    ) {
        let window = build(&readings);
        let result = BehaviorAnalyzer::default().analyze_behavior(&window);
        for event in &result.events {
            prop_assert!(event.timestamp > window[0].timestamp);
        }
    }
}
