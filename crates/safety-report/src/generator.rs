//! Report aggregation rules

use behavior::{BehaviorAnalysisResult, DrivingEvent, EventSeverity, EventType};
use chrono::{DateTime, Datelike, Duration, Months, Timelike, Utc};
use risk_predictor::{AccidentPrediction, AccidentRiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::report::*;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Report generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Trips scoring below this count as high-risk
    pub high_risk_trip_score: f64,
    /// Fleet average shown in the peer comparison
    pub peer_average_score: f64,
    /// Risk-score gap between halves needed to call a trend
    pub trend_tolerance: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            high_risk_trip_score: 60.0,
            peer_average_score: 78.0,
            trend_tolerance: 0.1,
        }
    }
}

/// Half-up rounding (-0.5 rounds to 0)
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Builds periodic safety reports
#[derive(Debug, Clone, Default)]
pub struct SafetyReportGenerator {
    config: ReportConfig,
}

impl SafetyReportGenerator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn generate_report(&self, request: &ReportRequest) -> SafetyReport {
        self.generate_report_at(request, Utc::now())
    }

    /// Generate a report for the period ending at `now`
    pub fn generate_report_at(&self, request: &ReportRequest, now: DateTime<Utc>) -> SafetyReport {
        let (period_start, period_end) = period(request.report_type, now);

        let overall_safety_score = overall_score(&request.behavior_analyses);
        let score_change = request
            .previous_period_score
            .map(|previous| overall_safety_score - previous)
            .unwrap_or(0.0);

        let total_distance = request.trip_data.iter().map(|t| t.distance).sum();
        let total_driving_time = request.trip_data.iter().map(|t| t.duration).sum();
        let total_trips = request.trip_data.len();

        let summary = summarize(&request.driving_events, &request.accident_predictions);
        let driving_behavior =
            aggregate_behavior(&request.behavior_analyses, &request.driving_events);
        let risk_analysis = self.analyze_risks(&request.trip_data, &request.accident_predictions);

        let achievements = achievements(
            overall_safety_score,
            &driving_behavior,
            total_trips,
            request.report_type,
            now,
        );
        let improvement_areas = improvement_areas(&driving_behavior, &risk_analysis);
        let ai_recommendations =
            ai_recommendations(&improvement_areas, &driving_behavior, &risk_analysis);
        let comparative_analysis = self.compare(
            overall_safety_score,
            request.previous_period_score.unwrap_or(overall_safety_score),
            &driving_behavior,
        );
        let insights = insights(&request.driving_events, &driving_behavior);

        let id = format!(
            "report_{}_{}",
            now.timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..9]
        );

        info!(
            "Generated {} report {} for vehicle {}: score {}, {} events, {} predictions",
            request.report_type,
            id,
            request.vehicle_id,
            overall_safety_score,
            request.driving_events.len(),
            request.accident_predictions.len()
        );

        SafetyReport {
            id,
            customer_id: request.customer_id.clone(),
            vehicle_id: request.vehicle_id.clone(),
            report_type: request.report_type,
            period_start,
            period_end,
            generated_at: now,
            overall_safety_score,
            score_change,
            total_distance,
            total_trips,
            total_driving_time,
            summary,
            driving_behavior,
            risk_analysis,
            achievements,
            improvement_areas,
            ai_recommendations,
            comparative_analysis,
            insights,
        }
    }

    fn analyze_risks(&self, trips: &[TripRecord], predictions: &[AccidentPrediction]) -> RiskAnalysis {
        let high_risk_trips = trips
            .iter()
            .filter(|t| t.safety_score < self.config.high_risk_trip_score)
            .count();
        let accident_predictions_count = predictions
            .iter()
            .filter(|p| p.risk_level >= AccidentRiskLevel::High)
            .count();

        let average_risk_score = if predictions.is_empty() {
            0.0
        } else {
            predictions.iter().map(|p| p.risk_score).sum::<f64>() / predictions.len() as f64
        };

        let mut risk_trend = RiskTrend::Stable;
        if predictions.len() >= 2 {
            let n = predictions.len();
            let half = n / 2;
            let recent = predictions[..half].iter().map(|p| p.risk_score).sum::<f64>()
                / n.div_ceil(2) as f64;
            let older = predictions[half..].iter().map(|p| p.risk_score).sum::<f64>() / half as f64;

            if recent < older - self.config.trend_tolerance {
                risk_trend = RiskTrend::Improving;
            } else if recent > older + self.config.trend_tolerance {
                risk_trend = RiskTrend::Worsening;
            }
            debug!("Risk trend: recent {:.3} vs older {:.3} -> {:?}", recent, older, risk_trend);
        }

        RiskAnalysis {
            high_risk_trips,
            accident_predictions_count,
            average_risk_score,
            risk_trend,
        }
    }

    fn compare(
        &self,
        current: f64,
        previous: f64,
        behavior: &DrivingBehaviorSummary,
    ) -> ComparativeAnalysis {
        let synthetic = |count: usize, growth: f64| {
            let count = count as f64;
            BehaviorDelta {
                previous: round_half_up(count * (1.0 + growth)),
                current: count,
                change: round_half_up(-count * growth),
            }
        };

        let mut behavior_comparison = BTreeMap::new();
        behavior_comparison.insert(
            "overspeeding".to_string(),
            synthetic(behavior.overspeeding_incidents, 0.2),
        );
        behavior_comparison.insert(
            "harshBraking".to_string(),
            synthetic(behavior.harsh_braking_count, 0.1),
        );

        let percentile = if current >= 90.0 {
            95
        } else if current >= 80.0 {
            75
        } else {
            50
        };

        ComparativeAnalysis {
            previous_period_score: previous,
            score_improvement: current - previous,
            behavior_comparison,
            peer_comparison: Some(PeerComparison {
                your_score: current,
                average_score: self.config.peer_average_score,
                percentile,
            }),
        }
    }
}

fn period(report_type: ReportType, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = match report_type {
        ReportType::Daily => now - Duration::days(1),
        ReportType::Weekly => now - Duration::days(7),
        // Clamps to the last day of a shorter month
        ReportType::Monthly => now
            .checked_sub_months(Months::new(1))
            .unwrap_or(now - Duration::days(30)),
    };
    (start, now)
}

fn overall_score(analyses: &[BehaviorAnalysisResult]) -> f64 {
    if analyses.is_empty() {
        return 100.0;
    }
    let total: f64 = analyses.iter().map(|a| a.overall_score).sum();
    round_half_up(total / analyses.len() as f64).clamp(0.0, 100.0)
}

/// Most frequent item, first seen wins ties
fn most_common<T: Copy + PartialEq>(items: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (item, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((item, count));
        }
    }
    best.map(|(item, _)| item)
}

fn summarize(events: &[DrivingEvent], predictions: &[AccidentPrediction]) -> ReportSummary {
    let total = events.len();
    let critical = events
        .iter()
        .filter(|e| e.severity == EventSeverity::Critical)
        .count();
    let safe = events
        .iter()
        .filter(|e| e.severity == EventSeverity::Low)
        .count();

    let safe_driving_percentage = if total > 0 {
        round_half_up(safe as f64 / total as f64 * 100.0)
    } else {
        100.0
    };

    ReportSummary {
        safe_driving_percentage,
        risk_incidents_count: total,
        critical_events_count: critical,
        average_risk_level: most_common(predictions.iter().map(|p| p.risk_level))
            .unwrap_or(AccidentRiskLevel::Low),
    }
}

fn aggregate_behavior(
    analyses: &[BehaviorAnalysisResult],
    events: &[DrivingEvent],
) -> DrivingBehaviorSummary {
    let count = |event_type: EventType| events.iter().filter(|e| e.event_type == event_type).count();

    let fatigue_flags = analyses.iter().filter(|a| a.insights.fatigue_detected).count();
    let distracted_reported: usize = analyses
        .iter()
        .map(|a| a.insights.distracted_driving_events)
        .sum();

    DrivingBehaviorSummary {
        overspeeding_incidents: count(EventType::Overspeeding),
        harsh_braking_count: count(EventType::HarshBraking),
        rapid_acceleration_count: count(EventType::RapidAcceleration),
        sharp_turn_count: count(EventType::SharpTurn),
        fatigue_detections: count(EventType::Fatigue).max(fatigue_flags),
        distracted_driving_events: count(EventType::DistractedDriving).max(distracted_reported),
    }
}

fn achievement(title: &str, description: String, icon: &str, at: DateTime<Utc>) -> Achievement {
    Achievement {
        title: title.to_string(),
        description,
        icon: icon.to_string(),
        earned_at: at,
    }
}

fn achievements(
    score: f64,
    behavior: &DrivingBehaviorSummary,
    trips: usize,
    report_type: ReportType,
    now: DateTime<Utc>,
) -> Vec<Achievement> {
    let mut earned = Vec::new();

    if score >= 90.0 {
        earned.push(achievement(
            "Safety Champion",
            format!(
                "Maintained excellent safety score of {} this {}",
                score,
                report_type.period_noun()
            ),
            "trophy",
            now,
        ));
    }
    if behavior.overspeeding_incidents == 0 && trips > 5 {
        earned.push(achievement(
            "Speed Guardian",
            "No overspeeding incidents - perfect compliance!".to_string(),
            "shield",
            now,
        ));
    }
    if behavior.harsh_braking_count == 0 && trips > 5 {
        earned.push(achievement(
            "Smooth Operator",
            "Zero harsh braking events - excellent anticipation!".to_string(),
            "sparkles",
            now,
        ));
    }
    if trips >= 20 && score >= 85.0 {
        earned.push(achievement(
            "Consistent Driver",
            "Maintained high safety standards across multiple trips".to_string(),
            "star",
            now,
        ));
    }

    earned
}

fn area(name: &str, current: f64, target: f64, priority: Priority, tips: [&str; 3]) -> ImprovementArea {
    ImprovementArea {
        area: name.to_string(),
        current_score: current.max(0.0),
        target_score: target,
        priority,
        recommendations: tips.iter().map(|s| s.to_string()).collect(),
    }
}

fn improvement_areas(behavior: &DrivingBehaviorSummary, risk: &RiskAnalysis) -> Vec<ImprovementArea> {
    let mut areas = Vec::new();

    if behavior.overspeeding_incidents > 5 {
        areas.push(area(
            "Speed Management",
            100.0 - behavior.overspeeding_incidents as f64 * 5.0,
            90.0,
            Priority::High,
            [
                "Use cruise control on highways",
                "Set speed limit alerts",
                "Leave earlier to avoid rushing",
            ],
        ));
    }
    if behavior.harsh_braking_count > 3 {
        areas.push(area(
            "Smooth Braking",
            100.0 - behavior.harsh_braking_count as f64 * 8.0,
            90.0,
            Priority::Medium,
            [
                "Increase following distance",
                "Anticipate traffic flow",
                "Brake gradually in stages",
            ],
        ));
    }
    if risk.high_risk_trips > 2 {
        areas.push(area(
            "Risk Awareness",
            100.0 - risk.high_risk_trips as f64 * 10.0,
            85.0,
            Priority::High,
            [
                "Review high-risk trip patterns",
                "Avoid driving during peak fatigue hours",
                "Plan routes through safer roads",
            ],
        ));
    }

    areas
}

fn recommendation(
    category: &str,
    priority: Priority,
    text: &str,
    impact: &str,
    steps: [&str; 3],
) -> AiRecommendation {
    AiRecommendation {
        category: category.to_string(),
        priority,
        recommendation: text.to_string(),
        expected_impact: impact.to_string(),
        implementation_steps: steps.iter().map(|s| s.to_string()).collect(),
    }
}

fn ai_recommendations(
    areas: &[ImprovementArea],
    behavior: &DrivingBehaviorSummary,
    risk: &RiskAnalysis,
) -> Vec<AiRecommendation> {
    let mut recommendations = Vec::new();

    if areas.iter().any(|a| a.area == "Speed Management") {
        recommendations.push(recommendation(
            "Speed Control",
            Priority::High,
            "Implement systematic speed management strategies",
            "Could improve safety score by 15-20 points",
            [
                "Enable speed limit alerts in the app",
                "Practice maintaining consistent speeds",
                "Review speed patterns after each trip",
            ],
        ));
    }
    if risk.risk_trend == RiskTrend::Worsening {
        recommendations.push(recommendation(
            "Risk Management",
            Priority::Critical,
            "Address increasing risk trend immediately",
            "Prevent potential accidents and score degradation",
            [
                "Take a defensive driving refresher course",
                "Review recent high-risk trip footage",
                "Consider taking more breaks during long drives",
            ],
        ));
    }
    if behavior.fatigue_detections > 2 {
        recommendations.push(recommendation(
            "Fatigue Management",
            Priority::High,
            "Implement fatigue prevention strategies",
            "Reduce accident risk by up to 40%",
            [
                "Take 15-minute breaks every 2 hours",
                "Avoid driving during your low-energy hours",
                "Get adequate sleep before long trips",
            ],
        ));
    }

    recommendations
}

fn hour_range(hour: u32) -> String {
    format!("{}:00 - {}:00", hour, hour + 1)
}

fn insights(events: &[DrivingEvent], behavior: &DrivingBehaviorSummary) -> ReportInsights {
    let mut by_hour = [0usize; 24];
    let mut by_weekday = [0usize; 7];
    for event in events {
        by_hour[event.timestamp.hour() as usize] += 1;
        by_weekday[event.timestamp.weekday().num_days_from_monday() as usize] += 1;
    }

    // Only hours with events compete; an empty hour 0 loses every comparison
    let mut safest = 0;
    let mut riskiest = 0;
    for hour in 0..24 {
        let count = by_hour[hour];
        if count == 0 {
            continue;
        }
        let safest_count = if by_hour[safest] == 0 { usize::MAX } else { by_hour[safest] };
        if count < safest_count {
            safest = hour;
        }
        if count > by_hour[riskiest] {
            riskiest = hour;
        }
    }

    let mut safest_day = 0;
    for day in 1..7 {
        if by_weekday[day] < by_weekday[safest_day] {
            safest_day = day;
        }
    }

    let most_common_risk = most_common(events.iter().map(|e| e.event_type))
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|| "None".to_string());

    let categories = behavior.categories();
    let mut best = categories[0];
    let mut worst = categories[0];
    for category in &categories[1..] {
        if category.1 < best.1 {
            best = *category;
        }
        if category.1 > worst.1 {
            worst = *category;
        }
    }

    ReportInsights {
        safest_time_of_day: hour_range(safest as u32),
        riskiest_time_of_day: hour_range(riskiest as u32),
        safest_day_of_week: WEEKDAYS[safest_day].to_string(),
        most_common_risk,
        best_performing_metric: best.0.to_string(),
        needs_improvement_metric: worst.0.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use behavior::{BehaviorInsights, BehaviorRiskLevel, EventReasoning};
    use chrono::TimeZone;
    use risk_predictor::{Explainability, RiskFactors};
    use telemetry::GeoPoint;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 18, 0, 0).unwrap()
    }

    fn analysis(score: f64) -> BehaviorAnalysisResult {
        BehaviorAnalysisResult {
            overall_score: score,
            risk_level: BehaviorRiskLevel::Safe,
            events: vec![],
            insights: BehaviorInsights {
                overspeeding_incidents: 0,
                harsh_braking_count: 0,
                rapid_acceleration_count: 0,
                sharp_turn_count: 0,
                phone_usage_detected: false,
                fatigue_detected: false,
                distracted_driving_events: 0,
                aggressive_driving_score: 0.0,
                smooth_driving_score: 100.0,
                attention_score: 90.0,
            },
            recommendations: vec![],
        }
    }

    fn event(event_type: EventType, severity: EventSeverity, at: DateTime<Utc>) -> DrivingEvent {
        DrivingEvent {
            event_type,
            severity,
            timestamp: at,
            location: GeoPoint::default(),
            speed_at_event: 70.0,
            acceleration_magnitude: None,
            explanation: String::new(),
            reasoning: EventReasoning::default(),
        }
    }

    fn prediction(score: f64, level: AccidentRiskLevel) -> AccidentPrediction {
        let factors = RiskFactors::default();
        AccidentPrediction {
            timestamp: now(),
            risk_score: score,
            risk_level: level,
            prediction_model: "weighted-risk v2.1".into(),
            contributing_factors: factors,
            anomaly_detected: false,
            anomaly_type: None,
            time_to_risk: 300,
            confidence_score: 0.85,
            explainability: Explainability::new(&factors, &RiskFactors::default_importance()),
            recommendations: vec![],
        }
    }

    fn trip(score: f64) -> TripRecord {
        TripRecord {
            distance: 12.5,
            duration: 30.0,
            safety_score: score,
            timestamp: now(),
        }
    }

    fn request(report_type: ReportType) -> ReportRequest {
        ReportRequest {
            customer_id: "cust-1".into(),
            vehicle_id: "veh-1".into(),
            report_type,
            behavior_analyses: vec![],
            accident_predictions: vec![],
            driving_events: vec![],
            trip_data: vec![],
            previous_period_score: None,
        }
    }

    #[test]
    fn test_empty_report_defaults() {
        let report = SafetyReportGenerator::default().generate_report_at(&request(ReportType::Daily), now());

        assert!(report.id.starts_with("report_"));
        assert_eq!(report.overall_safety_score, 100.0);
        assert_eq!(report.score_change, 0.0);
        assert_eq!(report.summary.safe_driving_percentage, 100.0);
        assert_eq!(report.summary.average_risk_level, AccidentRiskLevel::Low);
        assert_eq!(report.risk_analysis.risk_trend, RiskTrend::Stable);
        assert_eq!(report.insights.safest_time_of_day, "0:00 - 1:00");
        assert_eq!(report.insights.riskiest_time_of_day, "0:00 - 1:00");
        assert_eq!(report.insights.most_common_risk, "None");
        assert_eq!(report.insights.safest_day_of_week, "Monday");
        // Score 100 earns Safety Champion only
        assert_eq!(report.achievements.len(), 1);
        assert_eq!(
            report.achievements[0].description,
            "Maintained excellent safety score of 100 this day"
        );
        assert_eq!(report.period_end - report.period_start, Duration::days(1));
    }

    #[test]
    fn test_monthly_period_clamps() {
        let report = SafetyReportGenerator::default().generate_report_at(&request(ReportType::Monthly), now());
        assert_eq!(report.period_start, Utc.with_ymd_and_hms(2024, 2, 29, 18, 0, 0).unwrap());

        let weekly = SafetyReportGenerator::default().generate_report_at(&request(ReportType::Weekly), now());
        assert_eq!(weekly.period_end - weekly.period_start, Duration::days(7));
    }

    #[test]
    fn test_score_mean_and_change() {
        let mut req = request(ReportType::Weekly);
        req.behavior_analyses = vec![analysis(80.0), analysis(85.0)];
        req.previous_period_score = Some(75.0);

        let report = SafetyReportGenerator::default().generate_report_at(&req, now());
        // 82.5 rounds up
        assert_eq!(report.overall_safety_score, 83.0);
        assert_eq!(report.score_change, 8.0);
        assert_eq!(report.comparative_analysis.previous_period_score, 75.0);
        assert_eq!(report.comparative_analysis.score_improvement, 8.0);
        assert_eq!(report.comparative_analysis.peer_comparison.unwrap().percentile, 75);
    }

    #[test]
    fn test_summary_and_behavior_counts() {
        let at = now();
        let mut req = request(ReportType::Daily);
        req.driving_events = vec![
            event(EventType::Overspeeding, EventSeverity::Low, at),
            event(EventType::Overspeeding, EventSeverity::Critical, at),
            event(EventType::HarshBraking, EventSeverity::High, at),
        ];
        let mut fatigued = analysis(70.0);
        fatigued.insights.fatigue_detected = true;
        fatigued.insights.distracted_driving_events = 2;
        req.behavior_analyses = vec![fatigued.clone(), fatigued];

        let report = SafetyReportGenerator::default().generate_report_at(&req, at);
        assert_eq!(report.summary.risk_incidents_count, 3);
        assert_eq!(report.summary.critical_events_count, 1);
        assert_eq!(report.summary.safe_driving_percentage, 33.0);
        assert_eq!(report.driving_behavior.overspeeding_incidents, 2);
        assert_eq!(report.driving_behavior.harsh_braking_count, 1);
        assert_eq!(report.driving_behavior.fatigue_detections, 2);
        assert_eq!(report.driving_behavior.distracted_driving_events, 4);
        assert_eq!(report.insights.most_common_risk, "overspeeding");
        assert_eq!(report.insights.needs_improvement_metric, "Focus");
        assert_eq!(report.insights.best_performing_metric, "Smooth Acceleration");
    }

    #[test]
    fn test_improvement_areas_and_recommendations() {
        let at = now();
        let mut req = request(ReportType::Weekly);
        req.driving_events = (0..6)
            .map(|_| event(EventType::Overspeeding, EventSeverity::Medium, at))
            .chain((0..4).map(|_| event(EventType::HarshBraking, EventSeverity::High, at)))
            .chain((0..3).map(|_| event(EventType::Fatigue, EventSeverity::High, at)))
            .collect();
        req.trip_data = vec![trip(50.0), trip(55.0), trip(40.0), trip(90.0)];

        let report = SafetyReportGenerator::default().generate_report_at(&req, at);

        let areas: Vec<_> = report.improvement_areas.iter().map(|a| a.area.as_str()).collect();
        assert_eq!(areas, vec!["Speed Management", "Smooth Braking", "Risk Awareness"]);
        assert_eq!(report.improvement_areas[0].current_score, 70.0);
        assert_eq!(report.improvement_areas[1].current_score, 68.0);
        assert_eq!(report.improvement_areas[2].current_score, 70.0);
        assert_eq!(report.improvement_areas[2].target_score, 85.0);

        let categories: Vec<_> = report
            .ai_recommendations
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(categories, vec!["Speed Control", "Fatigue Management"]);

        let overspeeding = report.comparative_analysis.behavior_comparison["overspeeding"];
        // 6 × 1.2 = 7.2, 6 × -0.2 = -1.2
        assert_eq!(overspeeding.previous, 7.0);
        assert_eq!(overspeeding.change, -1.0);
        let braking = report.comparative_analysis.behavior_comparison["harshBraking"];
        assert_eq!(braking.previous, 4.0);
        assert_eq!(braking.change, 0.0);
    }

    #[test]
    fn test_risk_trend_halves() {
        let mut req = request(ReportType::Daily);
        req.accident_predictions = vec![
            prediction(0.8, AccidentRiskLevel::High),
            prediction(0.9, AccidentRiskLevel::Critical),
            prediction(0.2, AccidentRiskLevel::Low),
        ];
        let report = SafetyReportGenerator::default().generate_report_at(&req, now());
        // recent = 0.8 / 2 = 0.4, older = 1.1 / 1 = 1.1
        assert_eq!(report.risk_analysis.risk_trend, RiskTrend::Improving);
        assert_eq!(report.risk_analysis.accident_predictions_count, 2);
        assert!((report.risk_analysis.average_risk_score - 1.9 / 3.0).abs() < 1e-9);
        assert_eq!(report.summary.average_risk_level, AccidentRiskLevel::High);

        req.accident_predictions = vec![
            prediction(0.9, AccidentRiskLevel::Critical),
            prediction(0.9, AccidentRiskLevel::Critical),
            prediction(0.1, AccidentRiskLevel::Low),
            prediction(0.1, AccidentRiskLevel::Low),
        ];
        let report = SafetyReportGenerator::default().generate_report_at(&req, now());
        assert_eq!(report.risk_analysis.risk_trend, RiskTrend::Worsening);
        assert_eq!(report.ai_recommendations[0].category, "Risk Management");
        assert_eq!(report.ai_recommendations[0].priority, Priority::Critical);
    }

    #[test]
    fn test_achievements_with_many_trips() {
        let mut req = request(ReportType::Monthly);
        req.behavior_analyses = vec![analysis(88.0)];
        req.trip_data = (0..20).map(|_| trip(88.0)).collect();

        let report = SafetyReportGenerator::default().generate_report_at(&req, now());
        let titles: Vec<_> = report.achievements.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Speed Guardian", "Smooth Operator", "Consistent Driver"]);
        assert_eq!(report.total_trips, 20);
        assert_eq!(report.total_distance, 250.0);
        assert_eq!(report.total_driving_time, 600.0);
    }

    #[test]
    fn test_time_of_day_insights() {
        let day = |h: u32| Utc.with_ymd_and_hms(2024, 3, 26, h, 15, 0).unwrap();
        let mut req = request(ReportType::Daily);
        req.driving_events = vec![
            event(EventType::SharpTurn, EventSeverity::Medium, day(8)),
            event(EventType::SharpTurn, EventSeverity::Medium, day(8)),
            event(EventType::HarshBraking, EventSeverity::High, day(17)),
            event(EventType::HarshBraking, EventSeverity::High, day(17)),
            event(EventType::Overspeeding, EventSeverity::Low, day(22)),
        ];

        let report = SafetyReportGenerator::default().generate_report_at(&req, now());
        assert_eq!(report.insights.safest_time_of_day, "22:00 - 23:00");
        // 8 and 17 tie; the earlier hour wins
        assert_eq!(report.insights.riskiest_time_of_day, "8:00 - 9:00");
        assert_eq!(report.insights.most_common_risk, "sharp_turn");
        // All events on a Tuesday
        assert_eq!(report.insights.safest_day_of_week, "Monday");
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = SafetyReportGenerator::default().generate_report_at(&request(ReportType::Weekly), now());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["reportType"], "weekly");
        assert_eq!(json["summary"]["averageRiskLevel"], "low");
        assert!(json["comparativeAnalysis"]["peerComparison"]["percentile"].is_number());
        let back: SafetyReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
