//! Alerting System
//!
//! Turns predictions and driving events into alerts, keeps a bounded
//! newest-first history with read/acknowledge state, and fans each alert
//! out to subscribers.

mod alert;
mod dispatcher;

pub use alert::{AiReasoning, Alert, AlertFilter, AlertSeverity, AlertType, CustomAlert};
pub use dispatcher::{AlertCallback, AlertConfig, AlertDispatcher, SubscriptionId};
