//! Integration flows.

pub mod cli_flows;
pub mod environment_flows;
pub mod lifecycle_flows;

#[cfg(test)]
pub(crate) mod fixtures;
