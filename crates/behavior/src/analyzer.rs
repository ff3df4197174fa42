//! Behavior analyzer

use feature_engine::{variance, StatisticalFeatures};
use serde::{Deserialize, Serialize};
use telemetry::TelemetrySample;
use tracing::debug;

use crate::config::BehaviorConfig;
use crate::events::{DrivingEvent, EventReasoning, EventSeverity, EventType};

/// Aggregate driving risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorRiskLevel {
    Safe,
    Moderate,
    Risky,
    Dangerous,
}

impl BehaviorRiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorRiskLevel::Safe => "safe",
            BehaviorRiskLevel::Moderate => "moderate",
            BehaviorRiskLevel::Risky => "risky",
            BehaviorRiskLevel::Dangerous => "dangerous",
        }
    }
}

/// Per-category counts and sub-scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorInsights {
    pub overspeeding_incidents: usize,
    pub harsh_braking_count: usize,
    pub rapid_acceleration_count: usize,
    pub sharp_turn_count: usize,
    /// No phone signal exists in telemetry; always false
    pub phone_usage_detected: bool,
    pub fatigue_detected: bool,
    pub distracted_driving_events: usize,
    pub aggressive_driving_score: f64,
    pub smooth_driving_score: f64,
    pub attention_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorAnalysisResult {
    /// 0 to 100
    pub overall_score: f64,
    pub risk_level: BehaviorRiskLevel,
    pub events: Vec<DrivingEvent>,
    pub insights: BehaviorInsights,
    pub recommendations: Vec<String>,
}

/// Stateless scorer for telemetry windows
#[derive(Debug, Clone, Default)]
pub struct BehaviorAnalyzer {
    config: BehaviorConfig,
}

impl BehaviorAnalyzer {
    pub fn new(config: BehaviorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Score a time-ordered window. Total for any input, including an empty one.
    pub fn analyze_behavior(&self, window: &[TelemetrySample]) -> BehaviorAnalysisResult {
        let mut events = Vec::new();
        let mut insights = BehaviorInsights::default();

        for pair in window.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);

            if let Some(event) = self.detect_overspeeding(current) {
                events.push(event);
                insights.overspeeding_incidents += 1;
            }
            if let Some(event) = self.detect_harsh_braking(current, previous) {
                events.push(event);
                insights.harsh_braking_count += 1;
            }
            if let Some(event) = self.detect_rapid_acceleration(current, previous) {
                events.push(event);
                insights.rapid_acceleration_count += 1;
            }
            if let Some(event) = self.detect_sharp_turn(current) {
                events.push(event);
                insights.sharp_turn_count += 1;
            }
        }

        insights.fatigue_detected = self.detect_fatigue(window);
        insights.distracted_driving_events = self.detect_distracted_driving(window);

        insights.aggressive_driving_score = aggressive_score(&insights);
        insights.smooth_driving_score = 100.0 - insights.aggressive_driving_score;
        insights.attention_score = if insights.fatigue_detected { 50.0 } else { 90.0 };

        let overall_score = overall_score(&insights, events.len());
        let risk_level = risk_level(overall_score, &events);
        let recommendations = recommendations(&insights, risk_level);

        debug!(
            "Analyzed {} samples: score {:.1}, {} events, {}",
            window.len(),
            overall_score,
            events.len(),
            risk_level.as_str()
        );

        BehaviorAnalysisResult {
            overall_score,
            risk_level,
            events,
            insights,
            recommendations,
        }
    }

    fn detect_overspeeding(&self, sample: &TelemetrySample) -> Option<DrivingEvent> {
        let limit = self.config.speed_limit_for(sample.speed);
        let excess = sample.speed - limit;
        if excess <= 0.0 {
            return None;
        }

        let severity = if excess > 40.0 {
            EventSeverity::Critical
        } else if excess > 25.0 {
            EventSeverity::High
        } else if excess > 15.0 {
            EventSeverity::Medium
        } else {
            EventSeverity::Low
        };

        Some(event_at(
            sample,
            EventType::Overspeeding,
            severity,
            None,
            format!(
                "Vehicle speed ({:.1} km/h) exceeded limit ({} km/h) by {:.1} km/h",
                sample.speed, limit, excess
            ),
            EventReasoning::new(&["speed_violation", "safety_risk"])
                .with("speedLimit", limit)
                .with("actualSpeed", sample.speed)
                .with("excess", excess),
        ))
    }

    fn detect_harsh_braking(
        &self,
        current: &TelemetrySample,
        previous: &TelemetrySample,
    ) -> Option<DrivingEvent> {
        let rate = speed_change_rate(current, previous)?;
        if rate >= self.config.harsh_braking_threshold {
            return None;
        }

        let magnitude = rate.abs();
        let severity = if magnitude > 12.0 {
            EventSeverity::Critical
        } else if magnitude > 10.0 {
            EventSeverity::High
        } else {
            EventSeverity::Medium
        };

        Some(event_at(
            current,
            EventType::HarshBraking,
            severity,
            Some(rate),
            format!(
                "Harsh braking detected with deceleration of {:.2} m/s². This can cause accidents or discomfort.",
                magnitude
            ),
            EventReasoning::new(&["sudden_stop", "passenger_safety", "collision_risk"])
                .with("deceleration", rate)
                .with("magnitude", magnitude)
                .with("previousSpeed", previous.speed)
                .with("currentSpeed", current.speed),
        ))
    }

    fn detect_rapid_acceleration(
        &self,
        current: &TelemetrySample,
        previous: &TelemetrySample,
    ) -> Option<DrivingEvent> {
        let rate = speed_change_rate(current, previous)?;
        if rate <= self.config.rapid_acceleration_threshold {
            return None;
        }

        let severity = if rate > 8.0 {
            EventSeverity::High
        } else if rate > 6.0 {
            EventSeverity::Medium
        } else {
            EventSeverity::Low
        };

        Some(event_at(
            current,
            EventType::RapidAcceleration,
            severity,
            Some(rate),
            format!(
                "Rapid acceleration detected ({:.2} m/s²). This increases fuel consumption and wear.",
                rate
            ),
            EventReasoning::new(&["aggressive_driving", "fuel_efficiency", "tire_wear"])
                .with("acceleration", rate)
                .with("previousSpeed", previous.speed)
                .with("currentSpeed", current.speed),
        ))
    }

    fn detect_sharp_turn(&self, sample: &TelemetrySample) -> Option<DrivingEvent> {
        let steering = sample.steering_angle?;
        let angle = steering.abs();
        if angle <= self.config.sharp_turn_angle || sample.speed <= self.config.sharp_turn_min_speed {
            return None;
        }

        let severity = if angle > 45.0 {
            EventSeverity::High
        } else {
            EventSeverity::Medium
        };

        Some(event_at(
            sample,
            EventType::SharpTurn,
            severity,
            None,
            format!(
                "Sharp turn at high speed ({:.1} km/h with {:.1}° angle). Risk of rollover.",
                sample.speed, angle
            ),
            EventReasoning::new(&["rollover_risk", "loss_of_control", "passenger_safety"])
                .with("steeringAngle", steering)
                .with("speed", sample.speed),
        ))
    }

    fn detect_fatigue(&self, window: &[TelemetrySample]) -> bool {
        let n = window.len();
        if n < self.config.fatigue_min_samples || n < 20 {
            return false;
        }

        let mut variance_hits = 0;
        let mut micro_sleep_hits = 0;

        for i in 10..n - 10 {
            let speeds = StatisticalFeatures::extract_speed(&window[i - 10..i + 10]);
            if variance(&speeds) > self.config.fatigue_speed_variance {
                variance_hits += 1;
            }

            let current = &window[i];
            let steering = current.steering_angle.unwrap_or(0.0);
            if current.speed < window[i - 5].speed - 10.0 && steering.abs() > 5.0 {
                micro_sleep_hits += 1;
            }
        }

        variance_hits > self.config.fatigue_variance_hits
            || micro_sleep_hits > self.config.fatigue_micro_sleep_hits
    }

    fn detect_distracted_driving(&self, window: &[TelemetrySample]) -> usize {
        let n = window.len();
        if n < 10 {
            return 0;
        }

        let hits = (5..n - 5)
            .filter(|&i| {
                let slice = &window[i - 5..i + 5];
                let steering = variance(&StatisticalFeatures::extract_steering(slice));
                let speed = variance(&StatisticalFeatures::extract_speed(slice));
                steering > self.config.distraction_steering_variance
                    && speed > self.config.distraction_speed_variance
            })
            .count();

        hits / 10
    }
}

/// Speed change between two samples scaled by 3.6; None when no time passed
fn speed_change_rate(current: &TelemetrySample, previous: &TelemetrySample) -> Option<f64> {
    let dt = current.seconds_since(previous);
    if dt == 0.0 {
        return None;
    }
    Some((current.speed - previous.speed) / dt * 3.6)
}

fn event_at(
    sample: &TelemetrySample,
    event_type: EventType,
    severity: EventSeverity,
    acceleration_magnitude: Option<f64>,
    explanation: String,
    reasoning: EventReasoning,
) -> DrivingEvent {
    DrivingEvent {
        event_type,
        severity,
        timestamp: sample.timestamp,
        location: sample.location(),
        speed_at_event: sample.speed,
        acceleration_magnitude,
        explanation,
        reasoning,
    }
}

fn aggressive_score(insights: &BehaviorInsights) -> f64 {
    let weighted = insights.overspeeding_incidents as f64 * 2.0
        + insights.harsh_braking_count as f64 * 3.0
        + insights.rapid_acceleration_count as f64 * 2.0
        + insights.sharp_turn_count as f64 * 2.5;
    (weighted * 5.0).min(100.0)
}

fn overall_score(insights: &BehaviorInsights, event_count: usize) -> f64 {
    let base = insights.smooth_driving_score * 0.4
        + insights.attention_score * 0.3
        + (100.0 - insights.aggressive_driving_score) * 0.3;
    let penalty = (event_count as f64 * 2.0).min(30.0);
    (base - penalty).clamp(0.0, 100.0)
}

fn risk_level(score: f64, events: &[DrivingEvent]) -> BehaviorRiskLevel {
    let has_critical = events.iter().any(|e| e.severity == EventSeverity::Critical);
    if has_critical || score < 40.0 {
        BehaviorRiskLevel::Dangerous
    } else if score < 60.0 {
        BehaviorRiskLevel::Risky
    } else if score < 80.0 {
        BehaviorRiskLevel::Moderate
    } else {
        BehaviorRiskLevel::Safe
    }
}

fn recommendations(insights: &BehaviorInsights, risk: BehaviorRiskLevel) -> Vec<String> {
    let rules = [
        (
            insights.overspeeding_incidents > 5,
            "Reduce speed and maintain within legal limits to improve safety and avoid fines",
        ),
        (
            insights.harsh_braking_count > 3,
            "Maintain safe following distance and anticipate traffic conditions to reduce harsh braking",
        ),
        (
            insights.rapid_acceleration_count > 3,
            "Apply gradual acceleration to improve fuel efficiency and reduce vehicle wear",
        ),
        (
            insights.sharp_turn_count > 2,
            "Reduce speed before turns and use smooth steering inputs",
        ),
        (
            insights.fatigue_detected,
            "Take breaks every 2 hours during long drives to prevent fatigue-related incidents",
        ),
        (
            insights.distracted_driving_events > 2,
            "Minimize distractions and keep full attention on the road at all times",
        ),
        (
            matches!(risk, BehaviorRiskLevel::Dangerous | BehaviorRiskLevel::Risky),
            "Consider defensive driving training to improve overall safety score",
        ),
    ];

    rules
        .iter()
        .filter(|(applies, _)| *applies)
        .map(|(_, text)| text.to_string())
        .collect()
}
