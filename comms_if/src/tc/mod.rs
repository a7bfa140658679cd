//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications 
//! interface.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod aim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the turret software by the
/// operator or by a script.
///
/// Serialised as `{"type": <variant>, "payload": <data>}`, the payload being
/// omitted for variants which carry no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Tc {
    /// Put the software into safe mode, all outputs neutral
    MakeSafe,

    /// Leave safe mode
    MakeUnsafe,

    /// Command the aim controller
    Aim(aim::AimCmd),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC is not a valid telecommand: {0}")]
    InvalidTc(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a TC from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        // Parse in two steps so that bad JSON and a bad TC are reported
        // differently.
        let value: serde_json::Value = serde_json::from_str(json_str)
            .map_err(TcParseError::InvalidJson)?;

        serde_json::from_value(value).map_err(TcParseError::InvalidTc)
    }

    /// Serialise the TC into a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
