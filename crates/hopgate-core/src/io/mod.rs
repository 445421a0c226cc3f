//! I/O utilities for the bidirectional relay phase.

mod relay;

pub use relay::{NoOpMetrics, RelayMetrics, RelayStats, relay_bidirectional};
