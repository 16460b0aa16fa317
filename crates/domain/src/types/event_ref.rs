//! Namespaced event identifiers.
//!
//! Every id handed to callers is either `local_<positive int>` or
//! `external_<provider id>`. [`EventRef::parse`] is the single place that
//! interprets those strings; everything downstream matches on the enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use super::event::Origin;
use crate::constants::{EXTERNAL_ID_PREFIX, LOCAL_ID_PREFIX};
use crate::{DaybookError, Result};

/// Source-native identifier of an event, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum EventRef {
    Local(i64),
    External(String),
}

impl EventRef {
    /// Parse a namespaced id.
    ///
    /// # Errors
    /// Returns [`DaybookError::InvalidEventId`] when the prefix is unknown,
    /// a local id is not a positive integer, or an external id is empty.
    pub fn parse(raw: &str) -> Result<Self> {
        if let Some(rest) = raw.strip_prefix(LOCAL_ID_PREFIX) {
            return parse_local(rest).map(Self::Local).ok_or_else(|| invalid(raw));
        }

        if let Some(rest) = raw.strip_prefix(EXTERNAL_ID_PREFIX) {
            if rest.is_empty() {
                return Err(invalid(raw));
            }
            return Ok(Self::External(rest.to_string()));
        }

        Err(invalid(raw))
    }

    pub fn origin(&self) -> Origin {
        match self {
            Self::Local(_) => Origin::Local,
            Self::External(_) => Origin::External,
        }
    }
}

fn parse_local(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok().filter(|id| *id > 0)
}

fn invalid(raw: &str) -> DaybookError {
    DaybookError::InvalidEventId(raw.to_string())
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(id) => write!(f, "{LOCAL_ID_PREFIX}{id}"),
            Self::External(id) => write!(f, "{EXTERNAL_ID_PREFIX}{id}"),
        }
    }
}

impl FromStr for EventRef {
    type Err = DaybookError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
