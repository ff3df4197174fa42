pub mod alerts;
pub mod behavior;
pub mod health;
pub mod predictions;
pub mod reports;
pub mod simulation;
pub mod telemetry;
