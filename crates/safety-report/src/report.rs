//! Report data model

use behavior::{BehaviorAnalysisResult, DrivingEvent};
use chrono::{DateTime, Utc};
use risk_predictor::{AccidentPrediction, AccidentRiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Daily,
    Weekly,
    Monthly,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Daily => "daily",
            ReportType::Weekly => "weekly",
            ReportType::Monthly => "monthly",
        }
    }

    /// Word used in achievement text ("this week")
    pub fn period_noun(&self) -> &'static str {
        match self {
            ReportType::Daily => "day",
            ReportType::Weekly => "week",
            ReportType::Monthly => "month",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTrend {
    Improving,
    Stable,
    Worsening,
}

/// A completed trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    /// Kilometres
    pub distance: f64,
    /// Minutes
    pub duration: f64,
    pub safety_score: f64,
    pub timestamp: DateTime<Utc>,
}

/// Inputs for one report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub customer_id: String,
    pub vehicle_id: String,
    pub report_type: ReportType,
    #[serde(default)]
    pub behavior_analyses: Vec<BehaviorAnalysisResult>,
    #[serde(default)]
    pub accident_predictions: Vec<AccidentPrediction>,
    #[serde(default)]
    pub driving_events: Vec<DrivingEvent>,
    #[serde(default)]
    pub trip_data: Vec<TripRecord>,
    #[serde(default)]
    pub previous_period_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub safe_driving_percentage: f64,
    pub risk_incidents_count: usize,
    pub critical_events_count: usize,
    /// Most frequent prediction risk level
    pub average_risk_level: AccidentRiskLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrivingBehaviorSummary {
    pub overspeeding_incidents: usize,
    pub harsh_braking_count: usize,
    pub rapid_acceleration_count: usize,
    pub sharp_turn_count: usize,
    pub fatigue_detections: usize,
    pub distracted_driving_events: usize,
}

impl DrivingBehaviorSummary {
    /// Incident count per named behavior category, in report order
    pub fn categories(&self) -> [(&'static str, usize); 6] {
        [
            ("Speed Control", self.overspeeding_incidents),
            ("Smooth Braking", self.harsh_braking_count),
            ("Smooth Acceleration", self.rapid_acceleration_count),
            ("Cornering", self.sharp_turn_count),
            ("Alertness", self.fatigue_detections),
            ("Focus", self.distracted_driving_events),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    pub high_risk_trips: usize,
    /// High or critical predictions
    pub accident_predictions_count: usize,
    pub average_risk_score: f64,
    pub risk_trend: RiskTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementArea {
    pub area: String,
    pub current_score: f64,
    pub target_score: f64,
    pub priority: Priority,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRecommendation {
    pub category: String,
    pub priority: Priority,
    pub recommendation: String,
    pub expected_impact: String,
    pub implementation_steps: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorDelta {
    pub previous: f64,
    pub current: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerComparison {
    pub your_score: f64,
    pub average_score: f64,
    pub percentile: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparativeAnalysis {
    pub previous_period_score: f64,
    pub score_improvement: f64,
    pub behavior_comparison: BTreeMap<String, BehaviorDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_comparison: Option<PeerComparison>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInsights {
    pub safest_time_of_day: String,
    pub riskiest_time_of_day: String,
    pub safest_day_of_week: String,
    pub most_common_risk: String,
    pub best_performing_metric: String,
    pub needs_improvement_metric: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyReport {
    pub id: String,
    pub customer_id: String,
    pub vehicle_id: String,
    pub report_type: ReportType,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    /// 0 to 100
    pub overall_safety_score: f64,
    pub score_change: f64,
    pub total_distance: f64,
    pub total_trips: usize,
    pub total_driving_time: f64,
    pub summary: ReportSummary,
    pub driving_behavior: DrivingBehaviorSummary,
    pub risk_analysis: RiskAnalysis,
    pub achievements: Vec<Achievement>,
    pub improvement_areas: Vec<ImprovementArea>,
    pub ai_recommendations: Vec<AiRecommendation>,
    pub comparative_analysis: ComparativeAnalysis,
    pub insights: ReportInsights,
}
