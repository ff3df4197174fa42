use behavior::BehaviorAnalyzer;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use safety_report::{ReportRequest, ReportType, SafetyReportGenerator, TripRecord};
use telemetry::TelemetrySample;

fn window(speeds: &[f64]) -> Vec<TelemetrySample> {
    let start = Utc.with_ymd_and_hms(2024, 5, 6, 7, 0, 0).unwrap();
    speeds
        .iter()
        .enumerate()
        .map(|(i, &speed)| TelemetrySample::new(start + Duration::seconds(i as i64), speed, 12.9, 77.6))
        .collect()
}

proptest! {
    #[test]
    fn report_scores_stay_in_range(
        windows in prop::collection::vec(prop::collection::vec(0.0f64..200.0, 2..40), 0..6),
        trip_scores in prop::collection::vec(0.0f64..100.0, 0..25),
        previous in prop::option::of(0.0f64..100.0),
    ) {
        let analyzer = BehaviorAnalyzer::default();
        let analyses: Vec<_> = windows.iter().map(|w| analyzer.analyze_behavior(&window(w))).collect();
        let events = analyses.iter().flat_map(|a| a.events.clone()).collect();
        let now = Utc.with_ymd_and_hms(2024, 5, 7, 0, 0, 0).unwrap();

        let request = ReportRequest {
            customer_id: "cust".into(),
            vehicle_id: "veh".into(),
            report_type: ReportType::Weekly,
            behavior_analyses: analyses,
            accident_predictions: vec![],
            driving_events: events,
            trip_data: trip_scores
                .iter()
                .map(|&score| TripRecord { distance: 5.0, duration: 10.0, safety_score: score, timestamp: now })
                .collect(),
            previous_period_score: previous,
        };

        let report = SafetyReportGenerator::default().generate_report_at(&request, now);

        prop_assert!((0.0..=100.0).contains(&report.overall_safety_score));
        prop_assert_eq!(report.overall_safety_score.fract(), 0.0);
        prop_assert!((0.0..=100.0).contains(&report.summary.safe_driving_percentage));
        prop_assert!(report.improvement_areas.iter().all(|a| a.current_score >= 0.0));
        prop_assert!(report.period_start < report.period_end);
        prop_assert_eq!(report.total_trips, trip_scores.len());
    }
}
