//! Response decoder module
//!
//! # Overview
//!
//! Extracts raw record entries from an already-parsed JSON response body using
//! a JSONPath-like expression (e.g. `$.campaigns[*].campaign`), and resolves
//! single values such as a next-page link (`$.paging.next_link`).

mod decoders;

pub use decoders::{first_match, JsonDecoder};
