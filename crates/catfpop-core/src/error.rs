// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;

/// Error taxonomy shared by every catfpop crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CpdError {
    /// Malformed sequence, out-of-range category, bad penalty or config.
    InvalidInput(String),
    /// Non-finite cost/objective or integer count overflow.
    NumericOverflow(String),
    /// A configured time or cost-evaluation budget was exceeded.
    ResourceLimit(String),
    /// The run observed a cancellation request.
    Cancelled,
}

impl CpdError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn numeric_overflow(msg: impl Into<String>) -> Self {
        Self::NumericOverflow(msg.into())
    }

    pub fn resource_limit(msg: impl Into<String>) -> Self {
        Self::ResourceLimit(msg.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    /// Stable machine-readable code for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NumericOverflow(_) => "numeric_overflow",
            Self::ResourceLimit(_) => "resource_limit",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CpdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::NumericOverflow(msg) => write!(f, "numeric overflow: {msg}"),
            Self::ResourceLimit(msg) => write!(f, "resource limit: {msg}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for CpdError {}
