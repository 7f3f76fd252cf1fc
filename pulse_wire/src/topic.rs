//! Metric topics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// The metric categories a client can request.
///
/// The lowercase string form doubles as the command sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Host and operating system identification.
    System,
    /// CPU model, frequencies, and per-core usage.
    Cpu,
    /// Memory totals and usage.
    Ram,
    /// Disk capacity and usage.
    Disk,
    /// Network interfaces and scanned hosts.
    Network,
    /// Running process list.
    Processes,
}

impl Topic {
    /// All topics, in the order the dashboard displays them.
    pub const ALL: [Self; 6] = [
        Self::System,
        Self::Cpu,
        Self::Ram,
        Self::Disk,
        Self::Network,
        Self::Processes,
    ];

    /// The wire string for this topic.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Cpu => "cpu",
            Self::Ram => "ram",
            Self::Disk => "disk",
            Self::Network => "network",
            Self::Processes => "processes",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "cpu" => Ok(Self::Cpu),
            "ram" => Ok(Self::Ram),
            "disk" => Ok(Self::Disk),
            "network" => Ok(Self::Network),
            "processes" => Ok(Self::Processes),
            other => Err(WireError::InvalidFrame(format!("unknown topic: {other}"))),
        }
    }
}
