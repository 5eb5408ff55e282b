//! Windowed time-range driver
//!
//! Stats endpoints only accept bounded `[start_time, end_time)` windows. The
//! driver splits a replication interval into windows of at most one step,
//! capped by a ceiling frozen at the start of the run, and paginates within
//! each window with the next-link resolver.

mod driver;
mod types;

pub use driver::WindowDriver;
pub use types::{parse_start_time, Granularity, WINDOW_TIME_FORMAT};
