//! Safety Report Generation
//!
//! Batches behavior analyses, accident predictions, driving events and trip
//! records over a daily, weekly or monthly period into a single report with
//! achievements, improvement areas, recommendations and time-of-day insights.

mod generator;
mod report;

pub use generator::{ReportConfig, SafetyReportGenerator};
pub use report::{
    Achievement, AiRecommendation, BehaviorDelta, ComparativeAnalysis, DrivingBehaviorSummary,
    ImprovementArea, PeerComparison, Priority, ReportInsights, ReportRequest, ReportSummary,
    ReportType, RiskAnalysis, RiskTrend, SafetyReport, TripRecord,
};
