pub mod operations;
pub mod params;
pub mod payloads;
pub mod request;
pub mod security;
pub mod servers;
pub mod synthesize;

use serde::Serialize;

pub use operations::plan;
pub use request::{RequestBatch, RequestCookie, ResolvedRequest};

use crate::siege::config::SiegeConfig;

/// Everything one conversion pass produces, held in memory until it is
/// written out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub requests: RequestBatch,
    pub siege: SiegeConfig,
}
