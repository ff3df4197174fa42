//! Scenario-driven telemetry generation

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::sample::{GeoPoint, TelemetrySample};
use crate::SimulationError;

/// Standard gravity added to the vertical axis (m/s²)
const GRAVITY: f64 = 9.81;

/// Kilometres per degree of latitude
const KM_PER_DEGREE: f64 = 111.32;

/// Driving scenario to simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    #[default]
    Normal,
    Aggressive,
    Highway,
    City,
    Dangerous,
    Fatigue,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Normal => "normal",
            Scenario::Aggressive => "aggressive",
            Scenario::Highway => "highway",
            Scenario::City => "city",
            Scenario::Dangerous => "dangerous",
            Scenario::Fatigue => "fatigue",
        }
    }
}

impl FromStr for Scenario {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Scenario::Normal),
            "aggressive" => Ok(Scenario::Aggressive),
            "highway" => Ok(Scenario::Highway),
            "city" => Ok(Scenario::City),
            "dangerous" => Ok(Scenario::Dangerous),
            "fatigue" => Ok(Scenario::Fatigue),
            other => Err(SimulationError::UnknownScenario(other.to_string())),
        }
    }
}

/// Vehicle dynamics produced by one scenario step
#[derive(Debug, Clone, Copy)]
struct Motion {
    speed: f64,
    accel_x: f64,
    accel_y: f64,
    accel_z: f64,
    throttle: f64,
    brake: f64,
    steering: f64,
}

/// Lazy, seeded telemetry sequence for one scenario.
///
/// The sequence never ends; `restart` rewinds it to the first sample so the
/// same seed always reproduces the same drive.
pub struct ScenarioGenerator {
    scenario: Scenario,
    seed: u64,
    interval: Duration,
    start_time: DateTime<Utc>,
    start_location: GeoPoint,
    rng: ChaCha8Rng,
    clock: DateTime<Utc>,
    location: GeoPoint,
    speed: f64,
    heading: f64,
    ticks: u64,
}

impl ScenarioGenerator {
    /// Create a generator whose first sample is stamped `start_time + interval`
    pub fn new(
        scenario: Scenario,
        seed: u64,
        interval_ms: u64,
        start_location: GeoPoint,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            scenario,
            seed,
            interval: Duration::milliseconds(interval_ms as i64),
            start_time,
            start_location,
            rng: ChaCha8Rng::seed_from_u64(seed),
            clock: start_time,
            location: start_location,
            speed: 0.0,
            heading: 0.0,
            ticks: 0,
        }
    }

    /// Rewind to the initial state
    pub fn restart(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.clock = self.start_time;
        self.location = self.start_location;
        self.speed = 0.0;
        self.heading = 0.0;
        self.ticks = 0;
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    /// Number of samples produced since construction or restart
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn centered(&mut self, spread: f64) -> f64 {
        (self.rng.gen::<f64>() - 0.5) * spread
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }

    fn step(&mut self) -> Motion {
        match self.scenario {
            Scenario::Normal => self.normal(),
            Scenario::Aggressive => self.aggressive(),
            Scenario::Highway => self.highway(),
            Scenario::City => self.city(),
            Scenario::Dangerous => self.dangerous(),
            Scenario::Fatigue => self.fatigue(),
        }
    }

    fn normal(&mut self) -> Motion {
        let target = 50.0 + self.rng.gen::<f64>() * 20.0;
        let acceleration = (target - self.speed) * 0.1 + self.centered(0.5);

        Motion {
            speed: (self.speed + acceleration).max(0.0),
            accel_x: acceleration,
            accel_y: self.centered(1.0),
            accel_z: self.centered(0.5),
            throttle: (30.0 + acceleration * 10.0).clamp(0.0, 100.0),
            brake: if acceleration < -1.0 { acceleration.abs() * 2.0 } else { 0.0 },
            steering: self.centered(10.0),
        }
    }

    fn aggressive(&mut self) -> Motion {
        let target = 70.0 + self.rng.gen::<f64>() * 40.0;
        let acceleration = (target - self.speed) * 0.3 + (self.rng.gen::<f64>() - 0.3) * 3.0;

        let harsh_braking = if self.chance(0.1) {
            Some(-10.0 + self.rng.gen::<f64>() * 2.0)
        } else {
            None
        };
        let rapid_accel = if self.chance(0.15) {
            5.0 + self.rng.gen::<f64>() * 3.0
        } else {
            acceleration
        };
        let delta = harsh_braking.unwrap_or(rapid_accel);

        Motion {
            speed: (self.speed + delta).max(0.0),
            accel_x: delta,
            accel_y: self.centered(3.0),
            accel_z: self.centered(2.0),
            throttle: (60.0 + rapid_accel * 5.0).clamp(0.0, 100.0),
            brake: harsh_braking.map(|b| b.abs() * 3.0).unwrap_or(0.0),
            steering: self.centered(35.0),
        }
    }

    fn highway(&mut self) -> Motion {
        let target = 90.0 + self.rng.gen::<f64>() * 20.0;
        let acceleration = (target - self.speed) * 0.05 + self.centered(0.3);

        Motion {
            speed: (self.speed + acceleration).max(0.0),
            accel_x: acceleration,
            accel_y: self.centered(0.5),
            accel_z: self.centered(0.3),
            throttle: (50.0 + acceleration * 8.0).clamp(0.0, 100.0),
            brake: if acceleration < -0.5 { acceleration.abs() * 2.0 } else { 0.0 },
            steering: self.centered(5.0),
        }
    }

    fn city(&mut self) -> Motion {
        let target = 20.0 + self.rng.gen::<f64>() * 30.0;
        let acceleration = (target - self.speed) * 0.2 + self.centered(1.5);
        let stop_and_go = self.chance(0.2);

        let speed = if stop_and_go {
            self.speed * 0.5
        } else {
            self.speed + acceleration
        };
        let brake = if stop_and_go {
            8.0
        } else if acceleration < -1.0 {
            acceleration.abs() * 2.0
        } else {
            0.0
        };

        Motion {
            speed: speed.max(0.0),
            accel_x: if stop_and_go { -4.0 } else { acceleration },
            accel_y: self.centered(2.0),
            accel_z: self.centered(1.0),
            throttle: (40.0 + acceleration * 10.0).clamp(0.0, 100.0),
            brake,
            steering: self.centered(20.0),
        }
    }

    fn dangerous(&mut self) -> Motion {
        let target = 100.0 + self.rng.gen::<f64>() * 40.0;

        if self.chance(0.15) {
            let kind = self.rng.gen::<f64>();
            if kind < 0.33 {
                return Motion {
                    speed: (self.speed - 15.0).max(0.0),
                    accel_x: -12.0,
                    accel_y: self.centered(5.0),
                    accel_z: self.centered(3.0),
                    throttle: 0.0,
                    brake: 15.0,
                    steering: self.centered(50.0),
                };
            } else if kind < 0.66 {
                return Motion {
                    speed: (self.speed + 8.0).min(140.0),
                    accel_x: 8.0,
                    accel_y: self.centered(4.0),
                    accel_z: self.centered(2.0),
                    throttle: 100.0,
                    brake: 0.0,
                    steering: self.centered(45.0),
                };
            }
        }

        let acceleration = (target - self.speed) * 0.4 + (self.rng.gen::<f64>() - 0.3) * 4.0;

        Motion {
            speed: (self.speed + acceleration).max(0.0),
            accel_x: acceleration,
            accel_y: self.centered(4.0),
            accel_z: self.centered(3.0),
            throttle: (70.0 + acceleration * 5.0).clamp(0.0, 100.0),
            brake: if acceleration < -2.0 { acceleration.abs() * 3.0 } else { 0.0 },
            steering: self.centered(40.0),
        }
    }

    fn fatigue(&mut self) -> Motion {
        let wave = (self.ticks as f64 * 0.1).sin() * 15.0;

        if self.chance(0.05) {
            // Micro-sleep: coasting drop with a steering drift
            return Motion {
                speed: (self.speed - 8.0).max(0.0),
                accel_x: -3.0,
                accel_y: self.centered(6.0),
                accel_z: self.centered(3.0),
                throttle: 0.0,
                brake: 0.0,
                steering: self.centered(25.0),
            };
        }

        let acceleration = (60.0 + wave - self.speed) * 0.15;

        Motion {
            speed: (self.speed + acceleration).max(0.0),
            accel_x: acceleration,
            accel_y: self.centered(3.0),
            accel_z: self.centered(1.5),
            throttle: (35.0 + wave.abs() * 2.0).clamp(0.0, 100.0),
            brake: if acceleration < -1.0 { acceleration.abs() * 2.0 } else { 0.0 },
            steering: wave * 0.5 + self.centered(15.0),
        }
    }

    /// Dead-reckon the position forward by one interval at `speed` km/h
    fn advance_location(&mut self, speed: f64) {
        let seconds = self.interval.num_milliseconds() as f64 / 1000.0;
        let distance_km = speed / 3.6 * seconds / 1000.0;

        self.heading += self.centered(10.0);
        self.heading = (self.heading + 360.0).rem_euclid(360.0);

        let heading_rad = self.heading.to_radians();
        let delta_lat = distance_km * heading_rad.cos() / KM_PER_DEGREE;
        let delta_lng =
            distance_km * heading_rad.sin() / (KM_PER_DEGREE * self.location.lat.to_radians().cos());

        self.location.lat += delta_lat;
        self.location.lng += delta_lng;
    }

    fn rpm_for(&mut self, speed: f64) -> f64 {
        (800.0 + speed * 35.0 + self.centered(100.0)).round()
    }
}

impl Iterator for ScenarioGenerator {
    type Item = TelemetrySample;

    fn next(&mut self) -> Option<TelemetrySample> {
        let motion = self.step();
        self.advance_location(motion.speed);
        self.clock += self.interval;
        let rpm = self.rpm_for(motion.speed);

        let sample = TelemetrySample {
            timestamp: self.clock,
            speed: motion.speed,
            acceleration_x: motion.accel_x,
            acceleration_y: motion.accel_y,
            acceleration_z: motion.accel_z + GRAVITY,
            latitude: self.location.lat,
            longitude: self.location.lng,
            rpm: Some(rpm),
            throttle_position: Some(motion.throttle),
            brake_pressure: Some(motion.brake),
            steering_angle: Some(motion.steering),
        };

        self.speed = motion.speed;
        self.ticks += 1;
        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn generator(scenario: Scenario, seed: u64) -> ScenarioGenerator {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        ScenarioGenerator::new(scenario, seed, 1000, GeoPoint::new(12.9716, 77.5946), start)
    }

    #[test]
    fn test_same_seed_same_drive() {
        let a: Vec<_> = generator(Scenario::Aggressive, 7).take(50).collect();
        let b: Vec<_> = generator(Scenario::Aggressive, 7).take(50).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_restart_rewinds() {
        let mut gen = generator(Scenario::Fatigue, 3);
        let first: Vec<_> = gen.by_ref().take(20).collect();
        gen.restart();
        assert_eq!(gen.ticks(), 0);
        let again: Vec<_> = gen.take(20).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_timestamps_advance_by_interval() {
        let samples: Vec<_> = generator(Scenario::Normal, 1).take(5).collect();
        for pair in samples.windows(2) {
            assert!((pair[1].seconds_since(&pair[0]) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_highway_settles_above_urban_limit() {
        let samples: Vec<_> = generator(Scenario::Highway, 11).take(300).collect();
        let tail = &samples[250..];
        let mean = tail.iter().map(|s| s.speed).sum::<f64>() / tail.len() as f64;
        assert!(mean > 80.0, "mean highway speed {mean}");
    }

    #[test]
    fn test_speed_never_negative_and_gravity_on_z() {
        for scenario in [
            Scenario::Normal,
            Scenario::Aggressive,
            Scenario::City,
            Scenario::Dangerous,
            Scenario::Fatigue,
        ] {
            for sample in generator(scenario, 5).take(200) {
                assert!(sample.speed >= 0.0);
                assert!(sample.acceleration_z > 5.0);
                assert!(sample.rpm.unwrap() >= 700.0);
            }
        }
    }

    #[test]
    fn test_scenario_parse() {
        assert_eq!("city".parse::<Scenario>().unwrap(), Scenario::City);
        assert!("offroad".parse::<Scenario>().is_err());
    }
}
