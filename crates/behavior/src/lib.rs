//! Driver Behavior Analysis
//!
//! Stateless scoring of a telemetry window:
//! - Pairwise event detection (overspeeding, harsh braking, rapid acceleration, sharp turns)
//! - Fatigue and distraction detection over sliding sub-windows
//! - Aggregate safety score, risk level and coaching recommendations

mod analyzer;
mod config;
mod events;

pub use analyzer::{BehaviorAnalysisResult, BehaviorAnalyzer, BehaviorInsights, BehaviorRiskLevel};
pub use config::BehaviorConfig;
pub use events::{DrivingEvent, EventReasoning, EventSeverity, EventType};
