//! Interval-driven telemetry simulator

use chrono::Utc;
use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::sample::{GeoPoint, TelemetrySample};
use crate::scenario::{Scenario, ScenarioGenerator};
use crate::SimulationError;

/// Samples kept in the simulator history
const HISTORY_CAPACITY: usize = 1000;

/// Simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub vehicle_id: String,
    /// Sampling interval in milliseconds (default: 1000)
    pub interval_ms: u64,
    pub scenario: Scenario,
    pub start_location: GeoPoint,
    /// RNG seed; the same seed replays the same drive
    pub seed: u64,
    /// Bound of the outbound sample channel
    pub channel_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            vehicle_id: "vehicle-001".to_string(),
            interval_ms: 1000,
            scenario: Scenario::Normal,
            start_location: GeoPoint::new(12.9716, 77.5946),
            seed: 42,
            channel_capacity: 256,
        }
    }
}

fn record(history: &Mutex<RingBuffer<TelemetrySample>>, sample: TelemetrySample) {
    let mut guard = match history.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.push(sample);
}

struct SimulationHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SimulationHandle {
    fn stop(self) {
        // Receiver gone means the task already exited
        let _ = self.stop_tx.send(true);
        drop(self.task);
    }

    fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Drives a [`ScenarioGenerator`] on a fixed interval.
///
/// Each tick produces one sample that is recorded in a bounded history and
/// sent to the channel returned by [`TelemetrySimulator::start`]. Dropping
/// the receiver ends the run.
pub struct TelemetrySimulator {
    history: Arc<Mutex<RingBuffer<TelemetrySample>>>,
    handle: Option<SimulationHandle>,
}

impl TelemetrySimulator {
    pub fn new() -> Self {
        Self {
            history: Arc::new(Mutex::new(RingBuffer::new(HISTORY_CAPACITY))),
            handle: None,
        }
    }

    /// Start producing samples. Must be called inside a tokio runtime.
    pub fn start(
        &mut self,
        config: SimulationConfig,
    ) -> Result<mpsc::Receiver<TelemetrySample>, SimulationError> {
        if self.is_running() {
            return Err(SimulationError::AlreadyRunning);
        }
        if config.interval_ms == 0 {
            return Err(SimulationError::InvalidInterval(config.interval_ms));
        }

        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let history = Arc::clone(&self.history);

        let mut generator = ScenarioGenerator::new(
            config.scenario,
            config.seed,
            config.interval_ms,
            config.start_location,
            Utc::now(),
        );

        info!(
            "Starting {} simulation for {} every {}ms",
            config.scenario.as_str(),
            config.vehicle_id,
            config.interval_ms
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(config.interval_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(sample) = generator.next() else { break };
                        record(&history, sample.clone());
                        if tx.send(sample).await.is_err() {
                            debug!("Telemetry receiver dropped, ending simulation");
                            break;
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Simulation for {} stopped after {} samples", config.vehicle_id, generator.ticks());
        });

        self.handle = Some(SimulationHandle { stop_tx, task });
        Ok(rx)
    }

    /// Stop the current run. Returns false if nothing was running.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.stop();
                true
            }
            None => {
                warn!("Stop requested but no simulation is running");
                false
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Most recent `count` samples, oldest first
    pub fn history(&self, count: usize) -> Vec<TelemetrySample> {
        match self.history.lock() {
            Ok(h) => h.tail(count),
            Err(poisoned) => poisoned.into_inner().tail(count),
        }
    }
}

impl Default for TelemetrySimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TelemetrySimulator {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(interval_ms: u64) -> SimulationConfig {
        SimulationConfig {
            interval_ms,
            scenario: Scenario::City,
            seed: 9,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_emits_samples() {
        let mut sim = TelemetrySimulator::new();
        let mut rx = sim.start(config(100)).unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(second.timestamp > first.timestamp);
        assert!(sim.is_running());

        assert!(sim.stop());
        assert!(!sim.is_running());
        assert!(sim.history(10).len() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_rejected() {
        let mut sim = TelemetrySimulator::new();
        let _rx = sim.start(config(100)).unwrap();
        assert!(matches!(sim.start(config(100)), Err(SimulationError::AlreadyRunning)));
        sim.stop();
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let mut sim = TelemetrySimulator::new();
        assert!(matches!(sim.start(config(0)), Err(SimulationError::InvalidInterval(0))));
        assert!(!sim.stop());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_closes_channel() {
        let mut sim = TelemetrySimulator::new();
        let mut rx = sim.start(config(50)).unwrap();
        rx.recv().await.unwrap();
        sim.stop();

        // Drain anything buffered before the stop landed
        while rx.recv().await.is_some() {}

        let mut restarted = sim.start(config(50)).unwrap();
        assert!(restarted.recv().await.is_some());
    }
}
