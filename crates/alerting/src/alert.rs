//! Alert model

use behavior::{EventSeverity, EventType};
use chrono::{DateTime, Utc};
use risk_predictor::AccidentRiskLevel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use telemetry::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Danger,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Danger => "danger",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl From<EventSeverity> for AlertSeverity {
    fn from(severity: EventSeverity) -> Self {
        match severity {
            EventSeverity::Critical => AlertSeverity::Critical,
            EventSeverity::High => AlertSeverity::Danger,
            EventSeverity::Medium => AlertSeverity::Warning,
            EventSeverity::Low => AlertSeverity::Info,
        }
    }
}

impl From<AccidentRiskLevel> for AlertSeverity {
    fn from(level: AccidentRiskLevel) -> Self {
        match level {
            AccidentRiskLevel::Critical => AlertSeverity::Critical,
            AccidentRiskLevel::High => AlertSeverity::Danger,
            AccidentRiskLevel::Medium => AlertSeverity::Warning,
            AccidentRiskLevel::Low => AlertSeverity::Info,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Overspeeding,
    HarshBraking,
    RapidAcceleration,
    SharpTurn,
    PhoneUsage,
    Fatigue,
    DistractedDriving,
    AccidentRisk,
    Anomaly,
    RiskZone,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Overspeeding => "overspeeding",
            AlertType::HarshBraking => "harsh_braking",
            AlertType::RapidAcceleration => "rapid_acceleration",
            AlertType::SharpTurn => "sharp_turn",
            AlertType::PhoneUsage => "phone_usage",
            AlertType::Fatigue => "fatigue",
            AlertType::DistractedDriving => "distracted_driving",
            AlertType::AccidentRisk => "accident_risk",
            AlertType::Anomaly => "anomaly",
            AlertType::RiskZone => "risk_zone",
        }
    }

    /// Action suggested for an alert of this type and severity
    pub fn recommended_action(&self, severity: AlertSeverity) -> &'static str {
        if severity == AlertSeverity::Critical {
            return "IMMEDIATE ACTION REQUIRED: Find safe location to stop";
        }
        match self {
            AlertType::Overspeeding => "Reduce speed to legal limits",
            AlertType::HarshBraking => "Maintain safe following distance",
            AlertType::AccidentRisk => "Increase alertness and reduce speed",
            AlertType::Fatigue => "Take a break for 15-20 minutes",
            AlertType::DistractedDriving => "Focus completely on driving",
            AlertType::SharpTurn => "Slow down before turning",
            AlertType::Anomaly => "Check vehicle and adjust driving",
            AlertType::RiskZone => "Exercise extra caution in this area",
            AlertType::RapidAcceleration | AlertType::PhoneUsage => "Drive carefully and stay alert",
        }
    }
}

impl From<EventType> for AlertType {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::HarshBraking => AlertType::HarshBraking,
            EventType::RapidAcceleration => AlertType::RapidAcceleration,
            EventType::SharpTurn => AlertType::SharpTurn,
            EventType::Overspeeding => AlertType::Overspeeding,
            EventType::PhoneUsage => AlertType::PhoneUsage,
            EventType::Fatigue => AlertType::Fatigue,
            EventType::DistractedDriving => AlertType::DistractedDriving,
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReasoning {
    pub primary_factors: Vec<String>,
    pub contributing_elements: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    pub confidence_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub timestamp: DateTime<Utc>,
    pub location: GeoPoint,
    pub message: String,
    pub explanation: String,
    pub ai_reasoning: AiReasoning,
    pub recommended_action: String,
    pub is_read: bool,
    pub is_acknowledged: bool,
}

/// Parameters for an ad-hoc alert
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAlert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub location: GeoPoint,
    pub message: String,
    pub explanation: String,
    #[serde(default)]
    pub factors: Vec<String>,
    #[serde(default)]
    pub data: Value,
}

/// History query
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertFilter {
    pub unread_only: bool,
    pub severity: Option<AlertSeverity>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        if self.unread_only && alert.is_read {
            return false;
        }
        match self.severity {
            Some(severity) => alert.severity == severity,
            None => true,
        }
    }
}
