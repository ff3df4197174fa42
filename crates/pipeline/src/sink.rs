//! Alert persistence

use alerting::Alert;
use storage::{AlertRecord, Repository, StorageError};

/// Store alerts under the vehicle and customer that produced them.
///
/// Every insert is attempted; the failures are returned.
pub fn store_alerts(
    repository: &Repository,
    vehicle_id: &str,
    customer_id: &str,
    alerts: &[Alert],
) -> Vec<StorageError> {
    alerts
        .iter()
        .filter_map(|alert| {
            repository
                .insert_alert(AlertRecord::new(vehicle_id, customer_id, alert.clone()))
                .err()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::{AlertDispatcher, AlertSeverity, AlertType, CustomAlert};
    use telemetry::GeoPoint;

    fn alert(dispatcher: &AlertDispatcher) -> Alert {
        dispatcher.create_custom_alert(CustomAlert {
            alert_type: AlertType::Fatigue,
            severity: AlertSeverity::Danger,
            location: GeoPoint::default(),
            message: "😴 Driver Fatigue Detected".into(),
            explanation: String::new(),
            factors: vec![],
            data: serde_json::Value::Null,
        })
    }

    #[test]
    fn test_alerts_stored_per_vehicle() {
        let dispatcher = AlertDispatcher::default();
        let repository = Repository::default();

        let errors = store_alerts(&repository, "veh-1", "cust-1", &[alert(&dispatcher)]);
        assert!(errors.is_empty());
        let errors = store_alerts(&repository, "veh-2", "cust-1", &[alert(&dispatcher)]);
        assert!(errors.is_empty());

        let mut vehicles: Vec<String> = repository
            .get_unread_alerts("cust-1")
            .unwrap()
            .into_iter()
            .map(|record| record.vehicle_id)
            .collect();
        vehicles.sort();
        assert_eq!(vehicles, vec!["veh-1", "veh-2"]);
    }
}
