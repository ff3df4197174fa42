//! Alert Dispatcher Implementation

use behavior::DrivingEvent;
use chrono::Utc;
use ring_buffer::RingBuffer;
use risk_predictor::{AccidentPrediction, AccidentRiskLevel, AnomalyType};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use telemetry::GeoPoint;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::alert::{AiReasoning, Alert, AlertFilter, AlertSeverity, AlertType, CustomAlert};

/// Subscriber invoked synchronously for every emitted alert.
///
/// Callbacks must not emit alerts themselves.
pub type AlertCallback = Arc<dyn Fn(&Alert) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by [`AlertDispatcher::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Alerts kept in history (default: 100)
    pub history_capacity: usize,
    /// Confidence attached to driving-event alerts
    pub event_confidence: f64,
    /// Confidence attached to custom alerts
    pub custom_confidence: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            event_confidence: 0.9,
            custom_confidence: 0.85,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Alert dispatcher: creation rules, bounded history and subscriber fan-out
pub struct AlertDispatcher {
    config: AlertConfig,
    history: Mutex<RingBuffer<Alert>>,
    subscribers: RwLock<Vec<(SubscriptionId, AlertCallback)>>,
    next_subscription: AtomicU64,
    /// Serializes emission so history order matches delivery order
    emit_lock: Mutex<()>,
}

impl AlertDispatcher {
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert dispatcher with config: {:?}", config);
        Self {
            history: Mutex::new(RingBuffer::new(config.history_capacity)),
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            emit_lock: Mutex::new(()),
            config,
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Alert) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.push((id, Arc::new(callback)));
        debug!("Alert subscriber {:?} added ({} total)", id, subscribers.len());
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Emit an accident-risk alert for high/critical predictions and an
    /// anomaly alert when an anomaly was detected. Returns what was emitted.
    pub fn process_accident_prediction(
        &self,
        prediction: &AccidentPrediction,
        location: GeoPoint,
    ) -> Vec<Alert> {
        let mut emitted = Vec::new();

        if prediction.risk_level >= AccidentRiskLevel::High {
            emitted.push(self.emit(accident_risk_alert(prediction, location)));
        }
        if prediction.anomaly_detected {
            emitted.push(self.emit(anomaly_alert(prediction, location)));
        }

        emitted
    }

    /// Emit an alert for a high or critical driving event
    pub fn process_driving_event(&self, event: &DrivingEvent) -> Option<Alert> {
        if !event.severity.is_severe() {
            return None;
        }
        Some(self.emit(self.driving_event_alert(event)))
    }

    pub fn create_custom_alert(&self, params: CustomAlert) -> Alert {
        let recommended_action = params.alert_type.recommended_action(params.severity);
        let alert = Alert {
            id: new_alert_id(),
            alert_type: params.alert_type,
            severity: params.severity,
            timestamp: Utc::now(),
            location: params.location,
            message: params.message,
            explanation: params.explanation,
            ai_reasoning: AiReasoning {
                primary_factors: params.factors,
                contributing_elements: params.data,
                risk_score: None,
                confidence_level: self.config.custom_confidence,
            },
            recommended_action: recommended_action.to_string(),
            is_read: false,
            is_acknowledged: false,
        };
        self.emit(alert)
    }

    /// Newest-first history, filtered
    pub fn alerts(&self, filter: AlertFilter) -> Vec<Alert> {
        lock(&self.history)
            .iter_recent()
            .filter(|alert| filter.matches(alert))
            .cloned()
            .collect()
    }

    /// Returns false for an unknown id
    pub fn mark_as_read(&self, id: &str) -> bool {
        match lock(&self.history).find_mut(|a| a.id == id) {
            Some(alert) => {
                alert.is_read = true;
                true
            }
            None => false,
        }
    }

    /// Acknowledge (and read) an alert. Returns false for an unknown id.
    pub fn acknowledge(&self, id: &str) -> bool {
        match lock(&self.history).find_mut(|a| a.id == id) {
            Some(alert) => {
                alert.is_acknowledged = true;
                alert.is_read = true;
                info!("Alert acknowledged: {}", id);
                true
            }
            None => false,
        }
    }

    /// Unacknowledged critical alerts, newest first
    pub fn critical_alerts(&self) -> Vec<Alert> {
        lock(&self.history)
            .iter_recent()
            .filter(|a| a.severity == AlertSeverity::Critical && !a.is_acknowledged)
            .cloned()
            .collect()
    }

    pub fn unread_count(&self) -> usize {
        lock(&self.history).iter().filter(|a| !a.is_read).count()
    }

    pub fn clear(&self) {
        lock(&self.history).clear();
    }

    fn emit(&self, alert: Alert) -> Alert {
        let _emitting = lock(&self.emit_lock);

        lock(&self.history).push(alert.clone());

        metrics::counter!("alerts_emitted_total", "severity" => alert.severity.as_str())
            .increment(1);
        debug!("Emitting {} alert {} ({})", alert.alert_type, alert.id, alert.severity);

        let subscribers: Vec<(SubscriptionId, AlertCallback)> = self
            .subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        for (id, callback) in subscribers {
            match catch_unwind(AssertUnwindSafe(|| callback(&alert))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    metrics::counter!("alert_subscriber_failures_total").increment(1);
                    error!("Alert subscriber {:?} failed on {}: {:#}", id, alert.id, err);
                }
                Err(_) => {
                    metrics::counter!("alert_subscriber_failures_total").increment(1);
                    error!("Alert subscriber {:?} panicked on {}", id, alert.id);
                }
            }
        }

        alert
    }

    fn driving_event_alert(&self, event: &DrivingEvent) -> Alert {
        use behavior::EventType;

        let (message, action) = match event.event_type {
            EventType::HarshBraking => (
                "🛑 Harsh Braking Detected",
                "Maintain safe following distance and anticipate traffic flow",
            ),
            EventType::RapidAcceleration => (
                "⚡ Rapid Acceleration Detected",
                "Apply gradual acceleration for better fuel efficiency and safety",
            ),
            EventType::SharpTurn => (
                "↪️ Sharp Turn at High Speed",
                "Reduce speed before turns to prevent rollover risk",
            ),
            EventType::Overspeeding => (
                "🚗💨 Overspeeding Detected",
                "Reduce speed to legal limits immediately",
            ),
            EventType::PhoneUsage => (
                "📱 Phone Usage While Driving",
                "Pull over safely if you need to use your phone",
            ),
            EventType::Fatigue => (
                "😴 Driver Fatigue Detected",
                "Take a 15-20 minute break immediately",
            ),
            EventType::DistractedDriving => (
                "👁️ Distracted Driving Detected",
                "Keep full attention on the road at all times",
            ),
        };

        Alert {
            id: new_alert_id(),
            alert_type: event.event_type.into(),
            severity: event.severity.into(),
            timestamp: event.timestamp,
            location: event.location,
            message: message.to_string(),
            explanation: event.explanation.clone(),
            ai_reasoning: AiReasoning {
                primary_factors: event.reasoning.factors.clone(),
                contributing_elements: serde_json::to_value(&event.reasoning)
                    .unwrap_or_default(),
                risk_score: None,
                confidence_level: self.config.event_confidence,
            },
            recommended_action: action.to_string(),
            is_read: false,
            is_acknowledged: false,
        }
    }
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

fn new_alert_id() -> String {
    format!("alert_{}", Uuid::new_v4().simple())
}

fn accident_risk_alert(prediction: &AccidentPrediction, location: GeoPoint) -> Alert {
    let percent = prediction.risk_score * 100.0;
    let (message, explanation) = if prediction.risk_level == AccidentRiskLevel::Critical {
        (
            "🚨 CRITICAL ACCIDENT RISK DETECTED",
            format!(
                "Our AI detected a {:.1}% accident risk. Immediate action required within {} seconds!",
                percent, prediction.time_to_risk
            ),
        )
    } else {
        (
            "⚠️ HIGH ACCIDENT RISK DETECTED",
            format!(
                "Elevated accident risk ({:.1}%) identified. Take precautions within {} seconds.",
                percent, prediction.time_to_risk
            ),
        )
    };

    let primary_factors = prediction
        .explainability
        .top_factors
        .iter()
        .map(|top| format!("{}: {}", top.factor.as_str(), top.explanation))
        .collect();

    Alert {
        id: new_alert_id(),
        alert_type: AlertType::AccidentRisk,
        severity: prediction.risk_level.into(),
        timestamp: prediction.timestamp,
        location,
        message: message.to_string(),
        explanation,
        ai_reasoning: AiReasoning {
            primary_factors,
            contributing_elements: json!({
                "model": prediction.prediction_model,
                "factors": prediction.contributing_factors,
                "shapValues": prediction.explainability.shap_values,
            }),
            risk_score: Some(prediction.risk_score),
            confidence_level: prediction.confidence_score,
        },
        recommended_action: prediction
            .recommendations
            .first()
            .cloned()
            .unwrap_or_else(|| "Slow down and increase alertness".to_string()),
        is_read: false,
        is_acknowledged: false,
    }
}

fn anomaly_alert(prediction: &AccidentPrediction, location: GeoPoint) -> Alert {
    let explanation = match prediction.anomaly_type {
        Some(AnomalyType::SpeedAnomaly) => {
            "Unusual speed pattern detected that differs significantly from your normal driving behavior"
        }
        Some(AnomalyType::AccelerationAnomaly) => {
            "Abnormal acceleration pattern detected that may indicate loss of vehicle control"
        }
        Some(AnomalyType::PatternAnomaly) => {
            "Irregular driving pattern detected that deviates from safe driving norms"
        }
        None => "An unusual driving pattern has been detected by our AI system",
    };

    Alert {
        id: new_alert_id(),
        alert_type: AlertType::Anomaly,
        severity: AlertSeverity::Warning,
        timestamp: prediction.timestamp,
        location,
        message: "⚠️ DRIVING ANOMALY DETECTED".to_string(),
        explanation: explanation.to_string(),
        ai_reasoning: AiReasoning {
            primary_factors: vec![prediction
                .anomaly_type
                .map(|a| a.as_str())
                .unwrap_or("unknown")
                .to_string()],
            contributing_elements: json!({
                "model": prediction.prediction_model,
                "confidence": prediction.confidence_score,
            }),
            risk_score: None,
            confidence_level: prediction.confidence_score,
        },
        recommended_action: "Check vehicle systems and adjust driving to normal patterns".to_string(),
        is_read: false,
        is_acknowledged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use behavior::{EventReasoning, EventSeverity, EventType};
    use chrono::TimeZone;
    use risk_predictor::{Explainability, RiskFactors};
    use std::sync::atomic::AtomicUsize;

    fn event(severity: EventSeverity) -> DrivingEvent {
        DrivingEvent {
            event_type: EventType::HarshBraking,
            severity,
            timestamp: Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap(),
            location: GeoPoint::new(12.9, 77.6),
            speed_at_event: 48.0,
            acceleration_magnitude: Some(-43.2),
            explanation: "Harsh braking detected".into(),
            reasoning: EventReasoning::new(&["sudden_stop", "collision_risk"]).with("magnitude", 43.2),
        }
    }

    fn prediction(level: AccidentRiskLevel, anomaly: Option<AnomalyType>) -> AccidentPrediction {
        let factors = RiskFactors {
            speed: 0.95,
            acceleration: 0.8,
            location: 0.7,
            time: 0.7,
            weather: 0.3,
            driver_behavior: 0.9,
        };
        let explainability = Explainability::new(&factors, &RiskFactors::default_importance());
        AccidentPrediction {
            timestamp: Utc.with_ymd_and_hms(2024, 7, 1, 23, 0, 0).unwrap(),
            risk_score: 0.9,
            risk_level: level,
            prediction_model: "weighted-risk v2.1".into(),
            contributing_factors: factors,
            anomaly_detected: anomaly.is_some(),
            anomaly_type: anomaly,
            time_to_risk: 5,
            confidence_score: 0.75,
            explainability,
            recommendations: vec!["⚠️ IMMEDIATE ACTION: Reduce speed and increase following distance".into()],
        }
    }

    #[test]
    fn test_low_severity_events_ignored() {
        let dispatcher = AlertDispatcher::default();
        assert!(dispatcher.process_driving_event(&event(EventSeverity::Medium)).is_none());
        assert!(dispatcher.alerts(AlertFilter::default()).is_empty());
    }

    #[test]
    fn test_event_alert_fields() {
        let dispatcher = AlertDispatcher::default();
        let alert = dispatcher.process_driving_event(&event(EventSeverity::High)).unwrap();

        assert!(alert.id.starts_with("alert_"));
        assert_eq!(alert.alert_type, AlertType::HarshBraking);
        assert_eq!(alert.severity, AlertSeverity::Danger);
        assert_eq!(alert.message, "🛑 Harsh Braking Detected");
        assert_eq!(
            alert.recommended_action,
            "Maintain safe following distance and anticipate traffic flow"
        );
        assert_eq!(alert.ai_reasoning.primary_factors, vec!["sudden_stop", "collision_risk"]);
        assert_eq!(alert.ai_reasoning.contributing_elements["magnitude"], 43.2);
        assert_eq!(alert.ai_reasoning.confidence_level, 0.9);
        assert_eq!(alert.timestamp, event(EventSeverity::High).timestamp);
    }

    #[test]
    fn test_critical_prediction_with_anomaly() {
        let dispatcher = AlertDispatcher::default();
        let location = GeoPoint::new(12.9179, 77.6228);
        let alerts = dispatcher.process_accident_prediction(
            &prediction(AccidentRiskLevel::Critical, Some(AnomalyType::SpeedAnomaly)),
            location,
        );

        assert_eq!(alerts.len(), 2);
        let risk = &alerts[0];
        assert_eq!(risk.alert_type, AlertType::AccidentRisk);
        assert_eq!(risk.severity, AlertSeverity::Critical);
        assert_eq!(risk.message, "🚨 CRITICAL ACCIDENT RISK DETECTED");
        assert_eq!(
            risk.explanation,
            "Our AI detected a 90.0% accident risk. Immediate action required within 5 seconds!"
        );
        assert_eq!(risk.ai_reasoning.risk_score, Some(0.9));
        assert_eq!(
            risk.ai_reasoning.primary_factors[0],
            "speed: Current vehicle speed relative to safe limits"
        );
        assert_eq!(risk.ai_reasoning.contributing_elements["model"], "weighted-risk v2.1");

        let anomaly = &alerts[1];
        assert_eq!(anomaly.alert_type, AlertType::Anomaly);
        assert_eq!(anomaly.severity, AlertSeverity::Warning);
        assert_eq!(anomaly.message, "⚠️ DRIVING ANOMALY DETECTED");
        assert_eq!(anomaly.ai_reasoning.primary_factors, vec!["speed_anomaly"]);

        // Newest first
        let history = dispatcher.alerts(AlertFilter::default());
        assert_eq!(history[0].id, anomaly.id);
        assert_eq!(history[1].id, risk.id);
    }

    #[test]
    fn test_medium_prediction_only_anomaly() {
        let dispatcher = AlertDispatcher::default();
        let mut medium = prediction(AccidentRiskLevel::Medium, None);
        assert!(dispatcher
            .process_accident_prediction(&medium, GeoPoint::default())
            .is_empty());

        medium.anomaly_detected = true;
        medium.anomaly_type = Some(AnomalyType::PatternAnomaly);
        let alerts = dispatcher.process_accident_prediction(&medium, GeoPoint::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Anomaly);
    }

    #[test]
    fn test_high_prediction_fallback_action() {
        let dispatcher = AlertDispatcher::default();
        let mut high = prediction(AccidentRiskLevel::High, None);
        high.recommendations.clear();
        high.risk_score = 0.7234;
        high.time_to_risk = 20;

        let alert = dispatcher.process_accident_prediction(&high, GeoPoint::default()).remove(0);
        assert_eq!(alert.severity, AlertSeverity::Danger);
        assert_eq!(alert.message, "⚠️ HIGH ACCIDENT RISK DETECTED");
        assert_eq!(
            alert.explanation,
            "Elevated accident risk (72.3%) identified. Take precautions within 20 seconds."
        );
        assert_eq!(alert.recommended_action, "Slow down and increase alertness");
    }

    #[test]
    fn test_history_capped_at_100() {
        let dispatcher = AlertDispatcher::default();
        let mut first_id = String::new();
        for i in 0..101 {
            let alert = dispatcher.process_driving_event(&event(EventSeverity::Critical)).unwrap();
            if i == 0 {
                first_id = alert.id;
            }
        }

        let history = dispatcher.alerts(AlertFilter::default());
        assert_eq!(history.len(), 100);
        assert!(history.iter().all(|a| a.id != first_id));
    }

    #[test]
    fn test_read_and_acknowledge() {
        let dispatcher = AlertDispatcher::default();
        let a = dispatcher.process_driving_event(&event(EventSeverity::Critical)).unwrap();
        let b = dispatcher.process_driving_event(&event(EventSeverity::High)).unwrap();

        assert_eq!(dispatcher.unread_count(), 2);
        assert_eq!(dispatcher.critical_alerts().len(), 1);

        assert!(dispatcher.mark_as_read(&b.id));
        assert_eq!(dispatcher.unread_count(), 1);
        let unread = dispatcher.alerts(AlertFilter {
            unread_only: true,
            severity: None,
        });
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, a.id);

        assert!(dispatcher.acknowledge(&a.id));
        assert_eq!(dispatcher.unread_count(), 0);
        assert!(dispatcher.critical_alerts().is_empty());
        assert!(!dispatcher.acknowledge("alert_missing"));

        let danger = dispatcher.alerts(AlertFilter {
            unread_only: false,
            severity: Some(AlertSeverity::Danger),
        });
        assert_eq!(danger.len(), 1);

        dispatcher.clear();
        assert!(dispatcher.alerts(AlertFilter::default()).is_empty());
    }

    #[test]
    fn test_failing_subscriber_does_not_block_others() {
        let dispatcher = AlertDispatcher::default();
        let delivered = Arc::new(AtomicUsize::new(0));

        dispatcher.subscribe(|_| anyhow::bail!("sink offline"));
        dispatcher.subscribe(|_| panic!("subscriber bug"));
        let counter = Arc::clone(&delivered);
        dispatcher.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        dispatcher.process_driving_event(&event(EventSeverity::Critical));
        dispatcher.process_driving_event(&event(EventSeverity::High));

        assert_eq!(delivered.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.alerts(AlertFilter::default()).len(), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let dispatcher = AlertDispatcher::default();
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);
        let id = dispatcher.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        dispatcher.process_driving_event(&event(EventSeverity::High));
        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id));
        dispatcher.process_driving_event(&event(EventSeverity::High));

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribers_see_alert_in_history() {
        let dispatcher = Arc::new(AlertDispatcher::default());
        let seen = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&dispatcher);
        let count = Arc::clone(&seen);
        dispatcher.subscribe(move |alert| {
            let history = probe.alerts(AlertFilter::default());
            if history.first().map(|a| &a.id) == Some(&alert.id) {
                count.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        });

        dispatcher.process_driving_event(&event(EventSeverity::High));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_alert() {
        let dispatcher = AlertDispatcher::default();
        let alert = dispatcher.create_custom_alert(CustomAlert {
            alert_type: AlertType::RiskZone,
            severity: AlertSeverity::Warning,
            location: GeoPoint::new(12.9179, 77.6228),
            message: "Entering Silk Board Junction".into(),
            explanation: "High accident zone".into(),
            factors: vec!["risk_zone".into()],
            data: json!({ "accidentCount": 45 }),
        });

        assert_eq!(alert.recommended_action, "Exercise extra caution in this area");
        assert_eq!(alert.ai_reasoning.confidence_level, 0.85);
        assert_eq!(dispatcher.unread_count(), 1);

        let critical = dispatcher.create_custom_alert(CustomAlert {
            alert_type: AlertType::Fatigue,
            severity: AlertSeverity::Critical,
            location: GeoPoint::default(),
            message: "Driver unresponsive".into(),
            explanation: String::new(),
            factors: vec![],
            data: serde_json::Value::Null,
        });
        assert_eq!(
            critical.recommended_action,
            "IMMEDIATE ACTION REQUIRED: Find safe location to stop"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers_keep_cap() {
        let dispatcher = Arc::new(AlertDispatcher::default());
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);
        dispatcher.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let mut handles = Vec::new();
        for _ in 0..8 {
            let d = Arc::clone(&dispatcher);
            handles.push(tokio::task::spawn_blocking(move || {
                for _ in 0..50 {
                    d.process_driving_event(&event(EventSeverity::Critical));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(delivered.load(Ordering::SeqCst), 400);
        assert_eq!(dispatcher.alerts(AlertFilter::default()).len(), 100);
    }
}
