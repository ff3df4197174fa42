//! Accident risk predictor

use behavior::DrivingEvent;
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use feature_engine::{mean, variance, StatisticalFeatures};
use serde::{Deserialize, Serialize};
use telemetry::{GeoPoint, TelemetrySample};
use tracing::{debug, info};

use crate::config::PredictorConfig;
use crate::explain::{Explainability, RiskFactors};
use crate::zones::{default_risk_zones, RiskZone};
use crate::PredictorError;

/// Source of the weather factor
pub trait WeatherSource: Send + Sync {
    /// Weather risk in [0, 1] at a place and time
    fn weather_risk(&self, location: GeoPoint, at: DateTime<Utc>) -> f64;
}

/// Fixed weather risk, used until a live feed is wired in
#[derive(Debug, Clone, Copy)]
pub struct ConstantWeather(pub f64);

impl Default for ConstantWeather {
    fn default() -> Self {
        Self(0.3)
    }
}

impl WeatherSource for ConstantWeather {
    fn weather_risk(&self, _location: GeoPoint, _at: DateTime<Utc>) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccidentRiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl AccidentRiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccidentRiskLevel::Low => "low",
            AccidentRiskLevel::Medium => "medium",
            AccidentRiskLevel::High => "high",
            AccidentRiskLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    SpeedAnomaly,
    AccelerationAnomaly,
    PatternAnomaly,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::SpeedAnomaly => "speed_anomaly",
            AnomalyType::AccelerationAnomaly => "acceleration_anomaly",
            AnomalyType::PatternAnomaly => "pattern_anomaly",
        }
    }

    fn tip(&self) -> Option<&'static str> {
        match self {
            AnomalyType::SpeedAnomaly => {
                Some("Unusual speed pattern detected - maintain consistent speed")
            }
            AnomalyType::AccelerationAnomaly => {
                Some("Extreme acceleration detected - check vehicle control")
            }
            AnomalyType::PatternAnomaly => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccidentPrediction {
    /// Timestamp of the sample the prediction was made for
    pub timestamp: DateTime<Utc>,
    /// Weighted score in [0, 1], before any anomaly boost
    pub risk_score: f64,
    pub risk_level: AccidentRiskLevel,
    pub prediction_model: String,
    pub contributing_factors: RiskFactors,
    pub anomaly_detected: bool,
    pub anomaly_type: Option<AnomalyType>,
    /// Seconds until the risk is expected to materialize
    pub time_to_risk: u32,
    pub confidence_score: f64,
    pub explainability: Explainability,
    pub recommendations: Vec<String>,
}

/// Scores accident risk for the current sample
pub struct AccidentPredictor {
    config: PredictorConfig,
    offset: FixedOffset,
    zones: Vec<RiskZone>,
    weather: Box<dyn WeatherSource>,
}

impl AccidentPredictor {
    /// Create a predictor with the reference zone table
    pub fn new(config: PredictorConfig) -> Result<Self, PredictorError> {
        Self::with_zones(config, default_risk_zones())
    }

    /// Create a predictor with a caller-supplied zone table
    pub fn with_zones(config: PredictorConfig, zones: Vec<RiskZone>) -> Result<Self, PredictorError> {
        let offset = FixedOffset::east_opt(config.utc_offset_minutes.saturating_mul(60))
            .ok_or(PredictorError::InvalidUtcOffset(config.utc_offset_minutes))?;
        for zone in &zones {
            zone.validate()?;
        }

        info!(
            "Accident predictor '{}' ready with {} risk zones (UTC{:+}min)",
            config.model_name,
            zones.len(),
            config.utc_offset_minutes
        );

        Ok(Self {
            config,
            offset,
            zones,
            weather: Box::new(ConstantWeather::default()),
        })
    }

    /// Replace the weather factor source
    pub fn with_weather_source(mut self, source: impl WeatherSource + 'static) -> Self {
        self.weather = Box::new(source);
        self
    }

    pub fn risk_zones(&self) -> &[RiskZone] {
        &self.zones
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Predict accident risk for `current` given the trailing window and recent events
    pub fn predict_accident_risk(
        &self,
        current: &TelemetrySample,
        recent: &[TelemetrySample],
        events: &[DrivingEvent],
    ) -> AccidentPrediction {
        let factors = RiskFactors {
            speed: self.speed_risk(current),
            acceleration: self.acceleration_risk(current, recent),
            location: self.location_risk(current.location()),
            time: self.time_risk(current.timestamp),
            weather: self
                .weather
                .weather_risk(current.location(), current.timestamp)
                .clamp(0.0, 1.0),
            driver_behavior: self.behavior_risk(events, recent),
        };

        let importance = &self.config.feature_importance;
        let risk_score = factors.weighted_score(importance);
        let explainability = Explainability::new(&factors, importance);
        let anomaly = self.detect_anomaly(current, recent);
        let risk_level = self.risk_level(risk_score, anomaly.is_some());
        let time_to_risk = self.time_to_risk(risk_score);
        let confidence_score = confidence(recent.len(), anomaly.is_some());
        let recommendations = recommendations(risk_level, &explainability, anomaly);

        debug!(
            "Risk {:.3} ({}) at {}, anomaly {:?}",
            risk_score,
            risk_level.as_str(),
            current.timestamp,
            anomaly
        );

        AccidentPrediction {
            timestamp: current.timestamp,
            risk_score,
            risk_level,
            prediction_model: self.config.model_name.clone(),
            contributing_factors: factors,
            anomaly_detected: anomaly.is_some(),
            anomaly_type: anomaly,
            time_to_risk,
            confidence_score,
            explainability,
            recommendations,
        }
    }

    fn speed_risk(&self, sample: &TelemetrySample) -> f64 {
        let limit = if sample.speed > 80.0 { 100.0 } else { 60.0 };
        let ratio = sample.speed / limit;

        if ratio <= 0.8 {
            0.1
        } else if ratio <= 1.0 {
            0.3
        } else if ratio <= 1.2 {
            0.6
        } else if ratio <= 1.5 {
            0.85
        } else {
            0.95
        }
    }

    fn acceleration_risk(&self, current: &TelemetrySample, recent: &[TelemetrySample]) -> f64 {
        if recent.is_empty() {
            return 0.1;
        }

        let magnitude = current.acceleration_magnitude();
        let tail = &recent[recent.len().saturating_sub(10)..];
        let spread = variance(&StatisticalFeatures::extract_acceleration_magnitude(tail));

        if magnitude > 10.0 || spread > 15.0 {
            0.8
        } else if magnitude > 7.0 || spread > 10.0 {
            0.6
        } else if magnitude > 5.0 || spread > 5.0 {
            0.4
        } else {
            0.2
        }
    }

    fn location_risk(&self, point: GeoPoint) -> f64 {
        self.zones
            .iter()
            .find(|zone| zone.contains(point))
            .map(|zone| zone.risk_level.location_risk())
            .unwrap_or(0.2)
    }

    fn time_risk(&self, timestamp: DateTime<Utc>) -> f64 {
        let hour = timestamp.with_timezone(&self.offset).hour();

        if hour >= 22 || hour <= 5 {
            0.7
        } else if (7..=9).contains(&hour) || (17..=19).contains(&hour) {
            0.6
        } else if (12..=14).contains(&hour) {
            0.4
        } else {
            0.3
        }
    }

    fn behavior_risk(&self, events: &[DrivingEvent], recent: &[TelemetrySample]) -> f64 {
        let severe = events.iter().filter(|e| e.severity.is_severe()).count();

        if severe >= 3 {
            return 0.9;
        }
        if severe >= 2 {
            return 0.7;
        }
        if severe >= 1 {
            return 0.5;
        }

        if recent.len() > 20 {
            let speeds = StatisticalFeatures::extract_speed(&recent[recent.len() - 20..]);
            if variance(&speeds) > 100.0 {
                return 0.6;
            }
        }

        0.3
    }

    fn detect_anomaly(&self, current: &TelemetrySample, recent: &[TelemetrySample]) -> Option<AnomalyType> {
        let window = self.config.anomaly_window;
        if recent.len() < window || window == 0 {
            return None;
        }

        let speeds = StatisticalFeatures::extract_speed(&recent[recent.len() - window..]);

        if (current.speed - mean(&speeds)).abs() > 40.0 {
            Some(AnomalyType::SpeedAnomaly)
        } else if current.acceleration_magnitude() > 12.0 {
            Some(AnomalyType::AccelerationAnomaly)
        } else if variance(&speeds) > 200.0 {
            Some(AnomalyType::PatternAnomaly)
        } else {
            None
        }
    }

    fn risk_level(&self, score: f64, anomaly: bool) -> AccidentRiskLevel {
        let adjusted = if anomaly {
            (score * self.config.anomaly_boost).min(1.0)
        } else {
            score
        };

        if adjusted >= self.config.critical_threshold {
            AccidentRiskLevel::Critical
        } else if adjusted >= self.config.high_threshold {
            AccidentRiskLevel::High
        } else if adjusted >= self.config.medium_threshold {
            AccidentRiskLevel::Medium
        } else {
            AccidentRiskLevel::Low
        }
    }

    fn time_to_risk(&self, score: f64) -> u32 {
        if score < self.config.medium_threshold {
            300
        } else if score < self.config.high_threshold {
            60
        } else if score < self.config.critical_threshold {
            20
        } else {
            5
        }
    }
}

fn confidence(window_len: usize, anomaly: bool) -> f64 {
    let mut confidence: f64 = 0.85;
    if window_len < 20 {
        confidence -= 0.2;
    }
    if anomaly {
        confidence -= 0.1;
    }
    confidence.clamp(0.5, 1.0)
}

fn recommendations(
    level: AccidentRiskLevel,
    explainability: &Explainability,
    anomaly: Option<AnomalyType>,
) -> Vec<String> {
    let mut out = Vec::new();

    if level >= AccidentRiskLevel::High {
        out.push("⚠️ IMMEDIATE ACTION: Reduce speed and increase following distance".to_string());
        out.push("Find a safe place to pull over if conditions worsen".to_string());
    }

    out.extend(
        explainability
            .top_factors
            .iter()
            .filter_map(|top| top.factor.tip())
            .map(str::to_string),
    );

    if let Some(tip) = anomaly.and_then(|a| a.tip()) {
        out.push(tip.to_string());
    }

    if out.is_empty() {
        out.push("Continue maintaining safe driving practices".to_string());
    }

    out
}
