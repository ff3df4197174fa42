//! Bounded Ring Buffer
//!
//! Fixed-capacity circular buffer with O(1) push and oldest-first eviction.
//! Backs the trailing telemetry window, the simulator history and the
//! alert history.

mod buffer;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};
