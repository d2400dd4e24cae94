//! Error Types for Trip Planner

use agent_core::AgentError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlannerError {
    #[error("Unknown month: {0}")]
    UnknownMonth(String),

    #[error("Unknown accommodation type: {0}")]
    UnknownAccommodationKind(String),

    #[error("Unknown point of interest type: {0}")]
    UnknownPoiKind(String),
}

impl PlannerError {
    /// Report this error against a tool's argument
    pub fn for_tool(self, tool: &str, field: &str) -> AgentError {
        AgentError::invalid_argument(tool, field, self.to_string())
    }
}
