use chrono::{Duration, TimeZone, Utc};
use data_validator::{ValidationError, Validator};
use proptest::prelude::*;
use telemetry::TelemetrySample;

proptest! {
    #[test]
    fn in_range_samples_validate(
        speed in 0.0f64..300.0,
        lat in -90.0f64..90.0,
        lng in -180.0f64..180.0,
        ax in -50.0f64..50.0,
    ) {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let sample = TelemetrySample::new(t, speed, lat, lng).with_acceleration(ax, 0.0, 9.81);
        prop_assert!(Validator::default().validate_sample(&sample).is_ok());
    }

    #[test]
    fn ascending_windows_validate(steps in prop::collection::vec(0i64..5, 1..60)) {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut offset = 0;
        let window: Vec<_> = steps
            .iter()
            .map(|step| {
                offset += step;
                TelemetrySample::new(base + Duration::seconds(offset), 40.0, 12.9, 77.6)
            })
            .collect();
        prop_assert!(Validator::default().validate_window(&window).is_ok());
    }

    #[test]
    fn speeds_above_limit_rejected(speed in 300.0001f64..1e6) {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let sample = TelemetrySample::new(t, speed, 0.0, 0.0);
        let is_out_of_range = matches!(
            Validator::default().validate_sample(&sample),
            Err(ValidationError::OutOfRange { field: "speed", .. })
        );
        prop_assert!(is_out_of_range);
    }
}
