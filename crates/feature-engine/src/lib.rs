//! Feature Engine
//!
//! Statistics over telemetry windows: mean, population variance,
//! acceleration magnitude, and great-circle distance.

mod features;
mod statistics;

pub use features::WindowFeatures;
pub use statistics::{
    haversine_distance, mean, variance, StatisticalFeatures, EARTH_RADIUS_METERS,
};
