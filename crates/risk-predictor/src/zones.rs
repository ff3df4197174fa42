//! Accident-prone zones

use feature_engine::haversine_distance;
use serde::{Deserialize, Serialize};
use telemetry::GeoPoint;

use crate::PredictorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneRiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ZoneRiskLevel {
    /// Location factor for a sample inside a zone of this level
    pub fn location_risk(&self) -> f64 {
        match self {
            ZoneRiskLevel::Critical => 0.9,
            ZoneRiskLevel::High => 0.7,
            ZoneRiskLevel::Medium => 0.5,
            ZoneRiskLevel::Low => 0.3,
        }
    }
}

/// Circular area with an accident history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskZone {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub risk_level: ZoneRiskLevel,
    pub accident_count: u32,
    pub common_incidents: Vec<String>,
}

impl RiskZone {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Inclusive of the boundary
    pub fn contains(&self, point: GeoPoint) -> bool {
        haversine_distance(point, self.center()) <= self.radius_meters
    }

    pub(crate) fn validate(&self) -> Result<(), PredictorError> {
        let invalid = |reason: &str| PredictorError::InvalidZone {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if !(self.radius_meters.is_finite() && self.radius_meters > 0.0) {
            return Err(invalid("radius must be positive"));
        }
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(invalid("centre out of range"));
        }
        Ok(())
    }
}

fn zone(
    name: &str,
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
    risk_level: ZoneRiskLevel,
    accident_count: u32,
    incidents: [&str; 3],
) -> RiskZone {
    RiskZone {
        name: name.to_string(),
        latitude,
        longitude,
        radius_meters,
        risk_level,
        accident_count,
        common_incidents: incidents.iter().map(|s| s.to_string()).collect(),
    }
}

/// Reference zone table
pub fn default_risk_zones() -> Vec<RiskZone> {
    vec![
        zone(
            "Silk Board Junction, Bangalore",
            12.9179,
            77.6228,
            500.0,
            ZoneRiskLevel::High,
            45,
            ["rear_end_collision", "lane_change_accident", "overspeeding"],
        ),
        zone(
            "ORR Flyover, Bangalore",
            12.9716,
            77.5946,
            800.0,
            ZoneRiskLevel::Medium,
            28,
            ["overspeeding", "sharp_turn", "vehicle_breakdown"],
        ),
        zone(
            "Electronic City Toll, Bangalore",
            12.8456,
            77.6772,
            600.0,
            ZoneRiskLevel::Medium,
            32,
            ["sudden_braking", "lane_cutting", "distracted_driving"],
        ),
    ]
}
