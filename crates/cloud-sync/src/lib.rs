//! Cloud Synchronization Module
//!
//! MQTT alert forwarding with:
//! - Severity-based QoS
//! - Upload scheduling (immediate, opportunistic, nightly, manual)
//! - A daily payload quota that critical alerts bypass
//! - Dispatcher subscription for fire-and-forget forwarding

use alerting::{Alert, AlertDispatcher, AlertSeverity, SubscriptionId};
use chrono::{DateTime, Datelike, Timelike, Utc};
use rumqttc::{AsyncClient, Event, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Cloud sync error types
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Daily upload quota exceeded")]
    QuotaExceeded,

    #[error("Upload deferred by {0:?} schedule")]
    Deferred(UploadSchedule),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Upload schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadSchedule {
    /// Upload immediately
    Immediate,
    /// Upload whenever connected
    Opportunistic,
    /// Upload during night hours (02:00 to 06:59 UTC)
    Nightly,
    /// Upload only when triggered by an operator
    Manual,
}

/// Cloud sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// MQTT broker host
    pub broker_url: String,
    /// MQTT port
    pub broker_port: u16,
    /// Vehicle ID
    pub vehicle_id: String,
    /// Daily upload quota (MB)
    pub daily_quota_mb: u32,
    /// Upload schedule
    pub schedule: UploadSchedule,
    pub keep_alive_secs: u64,
    /// Pause before the event loop retries a failed connection
    pub reconnect_backoff_secs: u64,
    /// Outgoing requests buffered by the client
    pub request_capacity: usize,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            broker_url: "localhost".to_string(),
            broker_port: 1883,
            vehicle_id: "unknown".to_string(),
            daily_quota_mb: 500,
            schedule: UploadSchedule::Opportunistic,
            keep_alive_secs: 30,
            reconnect_backoff_secs: 5,
            request_capacity: 64,
        }
    }
}

/// Alert message published to the broker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertMessage {
    pub message_id: Uuid,
    pub message_type: String,
    pub vehicle_id: String,
    pub published_at: DateTime<Utc>,
    pub alert: Alert,
}

/// QoS for an alert: anything that asks the driver to act is delivered at least once
pub fn qos_for(severity: AlertSeverity) -> QoS {
    match severity {
        AlertSeverity::Critical | AlertSeverity::Danger => QoS::AtLeastOnce,
        AlertSeverity::Warning | AlertSeverity::Info => QoS::AtMostOnce,
    }
}

/// Cloud sync manager
pub struct CloudSync {
    config: CloudConfig,
    client: Option<AsyncClient>,
    event_loop: Option<JoinHandle<()>>,
    used_today_bytes: AtomicU64,
    /// UTC day the byte counter belongs to, as days from CE
    quota_day: AtomicI32,
}

impl CloudSync {
    /// Create new cloud sync manager
    pub fn new(config: CloudConfig) -> Self {
        Self {
            config,
            client: None,
            event_loop: None,
            used_today_bytes: AtomicU64::new(0),
            quota_day: AtomicI32::new(Utc::now().date_naive().num_days_from_ce()),
        }
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    pub fn topic(&self) -> String {
        format!("vehicles/{}/alerts", self.config.vehicle_id)
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Create the client and spawn its event loop. Must be called inside a tokio runtime.
    pub async fn connect(&mut self) -> Result<(), CloudError> {
        if self.config.broker_url.is_empty() {
            return Err(CloudError::Connection("broker url is empty".to_string()));
        }

        let mut options = MqttOptions::new(
            format!("vehicle-{}", self.config.vehicle_id),
            self.config.broker_url.clone(),
            self.config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs.max(5)));

        let (client, mut eventloop) = AsyncClient::new(options, self.config.request_capacity.max(1));
        let backoff = Duration::from_secs(self.config.reconnect_backoff_secs);

        // The event loop reconnects on its next poll after an error
        let task = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(incoming)) => {
                        debug!("MQTT incoming: {:?}", incoming);
                    }
                    Err(e) => {
                        error!("MQTT error: {}", e);
                        tokio::time::sleep(backoff).await;
                    }
                    _ => {}
                }
            }
        });

        if let Some(previous) = self.event_loop.replace(task) {
            previous.abort();
        }
        self.client = Some(client);
        info!(
            "MQTT client for {} targeting {}:{}",
            self.config.vehicle_id, self.config.broker_url, self.config.broker_port
        );
        Ok(())
    }

    fn encode(&self, alert: &Alert) -> Result<(QoS, Vec<u8>), CloudError> {
        self.check_upload(alert.severity, Utc::now())?;

        let message = AlertMessage {
            message_id: Uuid::new_v4(),
            message_type: "alert".to_string(),
            vehicle_id: self.config.vehicle_id.clone(),
            published_at: Utc::now(),
            alert: alert.clone(),
        };
        let payload =
            serde_json::to_vec(&message).map_err(|e| CloudError::Serialization(e.to_string()))?;

        Ok((qos_for(alert.severity), payload))
    }

    fn client(&self) -> Result<&AsyncClient, CloudError> {
        self.client
            .as_ref()
            .ok_or_else(|| CloudError::Connection("Not connected".to_string()))
    }

    /// Publish an alert to `vehicles/{id}/alerts`
    pub async fn publish_alert(&self, alert: &Alert) -> Result<(), CloudError> {
        let client = self.client()?;
        let (qos, payload) = self.encode(alert)?;
        let size = payload.len() as u64;

        client
            .publish(self.topic(), qos, false, payload)
            .await
            .map_err(|e| CloudError::Publish(e.to_string()))?;

        self.used_today_bytes.fetch_add(size, Ordering::Relaxed);
        Ok(())
    }

    /// Queue an alert without waiting; fails if the client's request buffer is full
    pub fn try_publish_alert(&self, alert: &Alert) -> Result<(), CloudError> {
        let client = self.client()?;
        let (qos, payload) = self.encode(alert)?;
        let size = payload.len() as u64;

        client
            .try_publish(self.topic(), qos, false, payload)
            .map_err(|e| CloudError::Publish(e.to_string()))?;

        self.used_today_bytes.fetch_add(size, Ordering::Relaxed);
        Ok(())
    }

    /// Critical alerts always go out; everything else respects quota and schedule
    pub fn check_upload(&self, severity: AlertSeverity, now: DateTime<Utc>) -> Result<(), CloudError> {
        self.roll_quota_day(now);
        if severity == AlertSeverity::Critical {
            return Ok(());
        }

        let quota = u64::from(self.config.daily_quota_mb) * 1024 * 1024;
        if self.used_today_bytes.load(Ordering::Relaxed) >= quota {
            return Err(CloudError::QuotaExceeded);
        }

        let allowed = match self.config.schedule {
            UploadSchedule::Immediate | UploadSchedule::Opportunistic => true,
            UploadSchedule::Nightly => is_nightly_window(now),
            UploadSchedule::Manual => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(CloudError::Deferred(self.config.schedule))
        }
    }

    pub fn used_today_bytes(&self) -> u64 {
        self.used_today_bytes.load(Ordering::Relaxed)
    }

    /// Reset daily quota
    pub fn reset_daily_quota(&self) {
        self.used_today_bytes.store(0, Ordering::Relaxed);
    }

    /// Start a fresh counter once `now` falls on a later UTC day
    fn roll_quota_day(&self, now: DateTime<Utc>) {
        let today = now.date_naive().num_days_from_ce();
        let previous = self.quota_day.fetch_max(today, Ordering::Relaxed);
        if today > previous {
            debug!("Daily upload quota rolled over to {}", now.date_naive());
            self.reset_daily_quota();
        }
    }

    /// Forward every alert the dispatcher emits.
    ///
    /// Deferred and over-quota alerts are skipped quietly; publish failures
    /// are reported back to the dispatcher.
    pub fn forward_alerts(self: &Arc<Self>, dispatcher: &AlertDispatcher) -> SubscriptionId {
        let publisher = Arc::clone(self);
        dispatcher.subscribe(move |alert| match publisher.try_publish_alert(alert) {
            Ok(()) => Ok(()),
            Err(CloudError::Deferred(_)) | Err(CloudError::QuotaExceeded) => {
                debug!("Alert {} not uploaded under current schedule", alert.id);
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e)),
        })
    }
}

impl Drop for CloudSync {
    fn drop(&mut self) {
        if let Some(task) = self.event_loop.take() {
            debug!("Stopping MQTT event loop for {}", self.config.vehicle_id);
            task.abort();
        }
    }
}

fn is_nightly_window(now: DateTime<Utc>) -> bool {
    (2..=6).contains(&now.hour())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use telemetry::GeoPoint;

    fn alert(severity: AlertSeverity) -> Alert {
        AlertDispatcher::default().create_custom_alert(alerting::CustomAlert {
            alert_type: alerting::AlertType::Overspeeding,
            severity,
            location: GeoPoint::new(12.97, 77.59),
            message: "Overspeeding Detected".into(),
            explanation: "Speed 95 km/h".into(),
            factors: vec!["speed_limit_violation".into()],
            data: serde_json::Value::Null,
        })
    }

    fn config(schedule: UploadSchedule) -> CloudConfig {
        CloudConfig {
            vehicle_id: "veh-7".into(),
            schedule,
            ..Default::default()
        }
    }

    #[test]
    fn test_topic_and_qos() {
        let sync = CloudSync::new(config(UploadSchedule::Immediate));
        assert_eq!(sync.topic(), "vehicles/veh-7/alerts");
        assert_eq!(qos_for(AlertSeverity::Critical), QoS::AtLeastOnce);
        assert_eq!(qos_for(AlertSeverity::Info), QoS::AtMostOnce);
    }

    #[test]
    fn test_schedule_gating() {
        let noon = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap();

        let nightly = CloudSync::new(config(UploadSchedule::Nightly));
        assert!(matches!(
            nightly.check_upload(AlertSeverity::Warning, noon),
            Err(CloudError::Deferred(UploadSchedule::Nightly))
        ));
        assert!(nightly.check_upload(AlertSeverity::Warning, night).is_ok());

        let manual = CloudSync::new(config(UploadSchedule::Manual));
        assert!(manual.check_upload(AlertSeverity::Danger, noon).is_err());
        assert!(manual.check_upload(AlertSeverity::Critical, noon).is_ok());
    }

    #[test]
    fn test_critical_bypasses_quota() {
        let sync = CloudSync::new(CloudConfig {
            daily_quota_mb: 0,
            ..config(UploadSchedule::Immediate)
        });
        let now = Utc::now();
        assert!(matches!(
            sync.check_upload(AlertSeverity::Danger, now),
            Err(CloudError::QuotaExceeded)
        ));
        assert!(sync.check_upload(AlertSeverity::Critical, now).is_ok());
    }

    #[test]
    fn test_quota_rolls_over_at_midnight() {
        let sync = CloudSync::new(CloudConfig {
            daily_quota_mb: 1,
            ..config(UploadSchedule::Immediate)
        });
        let today = Utc::now().date_naive();
        let before = Utc.from_utc_datetime(&today.and_hms_opt(23, 59, 59).unwrap());
        let after = before + chrono::Duration::seconds(2);

        sync.used_today_bytes.store(2 * 1024 * 1024, Ordering::Relaxed);
        assert!(matches!(
            sync.check_upload(AlertSeverity::Warning, before),
            Err(CloudError::QuotaExceeded)
        ));

        assert!(sync.check_upload(AlertSeverity::Warning, after).is_ok());
        assert_eq!(sync.used_today_bytes(), 0);

        // A late timestamp from the previous day does not reset again
        sync.used_today_bytes.store(2 * 1024 * 1024, Ordering::Relaxed);
        assert!(sync.check_upload(AlertSeverity::Warning, before).is_err());
        assert!(sync.check_upload(AlertSeverity::Warning, after).is_err());
    }

    #[test]
    fn test_publish_requires_connection() {
        let sync = CloudSync::new(config(UploadSchedule::Immediate));
        assert!(!sync.is_connected());
        assert!(matches!(
            sync.try_publish_alert(&alert(AlertSeverity::Critical)),
            Err(CloudError::Connection(_))
        ));
    }

    #[test]
    fn test_message_payload() {
        let sync = CloudSync::new(config(UploadSchedule::Immediate));
        let (qos, payload) = sync.encode(&alert(AlertSeverity::Danger)).unwrap();
        assert_eq!(qos, QoS::AtLeastOnce);

        let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(json["messageType"], "alert");
        assert_eq!(json["vehicleId"], "veh-7");
        assert_eq!(json["alert"]["severity"], "danger");
        assert_eq!(json["alert"]["type"], "overspeeding");
    }

    #[tokio::test]
    async fn test_queued_publish_counts_bytes() {
        let mut sync = CloudSync::new(config(UploadSchedule::Immediate));
        sync.connect().await.unwrap();

        // Queued into the client buffer; no broker needed
        sync.try_publish_alert(&alert(AlertSeverity::Warning)).unwrap();
        assert!(sync.used_today_bytes() > 0);

        sync.reset_daily_quota();
        assert_eq!(sync.used_today_bytes(), 0);
    }

    #[tokio::test]
    async fn test_forwarding_skips_deferred_alerts() {
        let dispatcher = AlertDispatcher::default();
        let mut sync = CloudSync::new(config(UploadSchedule::Manual));
        sync.connect().await.unwrap();
        let sync = Arc::new(sync);
        sync.forward_alerts(&dispatcher);

        dispatcher.create_custom_alert(alerting::CustomAlert {
            alert_type: alerting::AlertType::Anomaly,
            severity: AlertSeverity::Warning,
            location: GeoPoint::default(),
            message: "⚠️ DRIVING ANOMALY DETECTED".into(),
            explanation: String::new(),
            factors: vec![],
            data: serde_json::Value::Null,
        });
        assert_eq!(sync.used_today_bytes(), 0);
    }
}
