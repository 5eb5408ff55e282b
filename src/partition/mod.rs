//! Context propagation module
//!
//! Supports: Parent stream records, fixed value lists (fan-out)
//!
//! # Overview
//!
//! Child streams are invoked once per context. Contexts come from:
//! - Records of the parent stream, projected through a fixed field mapping
//! - A static list of values (e.g. targeting country codes), one per value

mod routers;
mod types;

pub use routers::{ListRouter, ParentRouter};
pub use types::{Context, ContextProjection, PartitionRouter};
