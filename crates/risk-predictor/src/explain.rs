//! Factor attribution

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Baseline factor value an attribution is measured against
pub const ATTRIBUTION_BASELINE: f64 = 0.3;

/// One of the six risk factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Factor {
    Speed,
    Acceleration,
    Location,
    Time,
    Weather,
    DriverBehavior,
}

impl Factor {
    /// Fixed order used for iteration and tie-breaking
    pub const ALL: [Factor; 6] = [
        Factor::Speed,
        Factor::Acceleration,
        Factor::Location,
        Factor::Time,
        Factor::Weather,
        Factor::DriverBehavior,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::Speed => "speed",
            Factor::Acceleration => "acceleration",
            Factor::Location => "location",
            Factor::Time => "time",
            Factor::Weather => "weather",
            Factor::DriverBehavior => "driverBehavior",
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            Factor::Speed => "Current vehicle speed relative to safe limits",
            Factor::Acceleration => "Sudden changes in vehicle acceleration patterns",
            Factor::Location => "Proximity to known accident-prone areas",
            Factor::Time => "Time of day affecting visibility and traffic",
            Factor::Weather => "Current weather conditions impacting road safety",
            Factor::DriverBehavior => "Recent driving behavior and event patterns",
        }
    }

    /// Coaching tip when this factor ranks among the top three
    pub fn tip(&self) -> Option<&'static str> {
        match self {
            Factor::Speed => Some("Reduce speed to match road conditions and traffic"),
            Factor::Acceleration => Some("Smooth out acceleration and braking inputs"),
            Factor::Location => Some("Exercise extra caution - you are in a high-risk area"),
            Factor::Time => Some("Increase alertness during low-visibility hours"),
            Factor::Weather => None,
            Factor::DriverBehavior => Some("Take a short break to refresh and refocus"),
        }
    }
}

/// A value per factor; used for factor scores, importances and attributions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    pub speed: f64,
    pub acceleration: f64,
    pub location: f64,
    pub time: f64,
    pub weather: f64,
    pub driver_behavior: f64,
}

impl RiskFactors {
    /// Default feature importances (sum to 1.0)
    pub fn default_importance() -> Self {
        Self {
            speed: 0.25,
            acceleration: 0.2,
            location: 0.15,
            time: 0.1,
            weather: 0.1,
            driver_behavior: 0.2,
        }
    }

    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Speed => self.speed,
            Factor::Acceleration => self.acceleration,
            Factor::Location => self.location,
            Factor::Time => self.time,
            Factor::Weather => self.weather,
            Factor::DriverBehavior => self.driver_behavior,
        }
    }

    fn map(&self, mut f: impl FnMut(Factor, f64) -> f64) -> Self {
        Self {
            speed: f(Factor::Speed, self.speed),
            acceleration: f(Factor::Acceleration, self.acceleration),
            location: f(Factor::Location, self.location),
            time: f(Factor::Time, self.time),
            weather: f(Factor::Weather, self.weather),
            driver_behavior: f(Factor::DriverBehavior, self.driver_behavior),
        }
    }

    /// Σ factor × weight, clamped to [0, 1]
    pub fn weighted_score(&self, weights: &RiskFactors) -> f64 {
        Factor::ALL
            .iter()
            .map(|&f| self.get(f) * weights.get(f))
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }

    /// (factor − baseline) × weight for every factor
    pub fn attributions(&self, weights: &RiskFactors) -> Self {
        self.map(|f, v| (v - ATTRIBUTION_BASELINE) * weights.get(f))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopFactor {
    pub factor: Factor,
    /// Absolute attribution
    pub impact: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explainability {
    pub feature_importance: RiskFactors,
    pub shap_values: RiskFactors,
    pub top_factors: Vec<TopFactor>,
}

impl Explainability {
    pub fn new(factors: &RiskFactors, importance: &RiskFactors) -> Self {
        let shap_values = factors.attributions(importance);
        Self {
            feature_importance: *importance,
            top_factors: top_factors(&shap_values, 3),
            shap_values,
        }
    }
}

/// Largest absolute attributions; ties keep the fixed factor order
fn top_factors(attributions: &RiskFactors, count: usize) -> Vec<TopFactor> {
    let mut ranked: Vec<TopFactor> = Factor::ALL
        .iter()
        .map(|&factor| TopFactor {
            factor,
            impact: attributions.get(factor).abs(),
            explanation: factor.explanation().to_string(),
        })
        .collect();

    ranked.sort_by(|a, b| b.impact.partial_cmp(&a.impact).unwrap_or(Ordering::Equal));
    ranked.truncate(count);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_score() {
        let factors = RiskFactors {
            speed: 0.1,
            acceleration: 0.2,
            location: 0.2,
            time: 0.3,
            weather: 0.3,
            driver_behavior: 0.3,
        };
        let score = factors.weighted_score(&RiskFactors::default_importance());
        // 0.025 + 0.04 + 0.03 + 0.03 + 0.03 + 0.06
        assert!((score - 0.215).abs() < 1e-9);
    }

    #[test]
    fn test_attribution_baseline() {
        let factors = RiskFactors {
            speed: 0.95,
            acceleration: 0.3,
            location: 0.3,
            time: 0.3,
            weather: 0.3,
            driver_behavior: 0.3,
        };
        let shap = factors.attributions(&RiskFactors::default_importance());
        assert!((shap.speed - 0.1625).abs() < 1e-9);
        assert_eq!(shap.weather, 0.0);
    }

    #[test]
    fn test_top_factors_ties_keep_order() {
        let attributions = RiskFactors::default();
        let top = top_factors(&attributions, 3);
        let order: Vec<_> = top.iter().map(|t| t.factor).collect();
        assert_eq!(order, vec![Factor::Speed, Factor::Acceleration, Factor::Location]);
    }

    #[test]
    fn test_top_factors_by_magnitude() {
        let attributions = RiskFactors {
            speed: -0.05,
            acceleration: 0.02,
            location: 0.0,
            time: 0.04,
            weather: 0.0,
            driver_behavior: 0.12,
        };
        let top = top_factors(&attributions, 3);
        let order: Vec<_> = top.iter().map(|t| t.factor).collect();
        assert_eq!(order, vec![Factor::DriverBehavior, Factor::Speed, Factor::Time]);
        assert!((top[1].impact - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_factor_wire_names() {
        let json = serde_json::to_value(RiskFactors::default_importance()).unwrap();
        assert_eq!(json["driverBehavior"], 0.2);
        assert_eq!(serde_json::to_value(Factor::DriverBehavior).unwrap(), "driverBehavior");
    }
}
