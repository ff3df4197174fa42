//! Driving events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use telemetry::GeoPoint;

/// Kind of detected driving event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    HarshBraking,
    RapidAcceleration,
    SharpTurn,
    Overspeeding,
    PhoneUsage,
    Fatigue,
    DistractedDriving,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        EventType::HarshBraking,
        EventType::RapidAcceleration,
        EventType::SharpTurn,
        EventType::Overspeeding,
        EventType::PhoneUsage,
        EventType::Fatigue,
        EventType::DistractedDriving,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::HarshBraking => "harsh_braking",
            EventType::RapidAcceleration => "rapid_acceleration",
            EventType::SharpTurn => "sharp_turn",
            EventType::Overspeeding => "overspeeding",
            EventType::PhoneUsage => "phone_usage",
            EventType::Fatigue => "fatigue",
            EventType::DistractedDriving => "distracted_driving",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity, ordered low to critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EventSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSeverity::Low => "low",
            EventSeverity::Medium => "medium",
            EventSeverity::High => "high",
            EventSeverity::Critical => "critical",
        }
    }

    /// High or critical
    pub fn is_severe(&self) -> bool {
        *self >= EventSeverity::High
    }
}

/// Why an event fired: factor labels plus the measured values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventReasoning {
    pub factors: Vec<String>,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl EventReasoning {
    pub fn new(factors: &[&str]) -> Self {
        Self {
            factors: factors.iter().map(|f| f.to_string()).collect(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

/// A discrete detection anchored to one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrivingEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub severity: EventSeverity,
    pub timestamp: DateTime<Utc>,
    pub location: GeoPoint,
    pub speed_at_event: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration_magnitude: Option<f64>,
    pub explanation: String,
    pub reasoning: EventReasoning,
}
