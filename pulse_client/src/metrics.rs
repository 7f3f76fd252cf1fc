// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed payloads for each metric topic.
//!
//! The transport treats response data as opaque JSON; these models are
//! the dashboard-facing decode step. Field sets follow what the server
//! collects for each topic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pulse_wire::Topic;

use crate::error::{ClientError, Result};

/// Host and operating system identification (`system` topic).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Host name.
    pub name: String,
    /// Operating system family.
    pub system: String,
    /// Full platform string.
    pub platform: String,
    /// OS release.
    pub release: String,
    /// OS version.
    pub version: String,
}

/// CPU model and usage (`cpu` topic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    /// Processor model name.
    pub name: String,
    /// Architecture string.
    pub architecture: String,
    /// Word size in bits.
    pub bits: u32,
    /// Minimum frequency in Hz.
    pub min_frequency: f64,
    /// Maximum frequency in Hz.
    pub max_frequency: f64,
    /// Current frequency in Hz.
    pub current_frequency: f64,
    /// Physical core count.
    pub physical_cores: usize,
    /// Logical core count.
    pub logical_cores: usize,
    /// Overall usage percentage.
    pub usage: f64,
    /// Per-core usage percentages, indexed by core.
    pub cores_usage: Vec<f64>,
}

/// Memory totals and usage (`ram` topic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RamMetrics {
    /// Total memory in GB.
    pub total_gb: f64,
    /// Used memory in GB.
    pub used_gb: f64,
    /// Available memory in GB.
    pub available_gb: f64,
    /// Used memory as a percentage of total.
    pub percent_usage: f64,
}

/// Disk capacity and usage (`disk` topic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskMetrics {
    /// Total capacity in GB.
    pub size_gb: f64,
    /// Used space in GB.
    pub used_gb: f64,
    /// Used space percentage.
    pub used_percent: f64,
    /// Available space in GB.
    pub available_gb: f64,
    /// Available space percentage.
    pub available_percent: f64,
}

/// One network interface (`network` topic).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    /// Interface name.
    pub interface: String,
    /// Assigned address.
    pub address: String,
    /// Netmask.
    pub netmask: String,
}

/// State of one scanned port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortStatus {
    /// Port number.
    pub port: u16,
    /// Reported state (e.g. `open`).
    pub state: String,
}

/// Ports grouped by protocol on a scanned host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProtocol {
    /// Protocol name (e.g. `tcp`).
    pub protocol: String,
    /// Scanned ports and their states.
    pub ports: Vec<PortStatus>,
}

/// One host discovered on the local network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    /// Host address.
    pub host: String,
    /// Resolved name, if any.
    pub name: String,
    /// Reported state (e.g. `up`).
    pub state: String,
    /// Protocols and port states found by the scan.
    pub protocols: Vec<HostProtocol>,
}

/// Network interfaces and scanned hosts (`network` topic).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    /// Local interfaces.
    pub interfaces: Vec<NetworkInterface>,
    /// Hosts found on the local network.
    pub hosts: Vec<HostInfo>,
}

/// One running process (`processes` topic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Process name.
    pub name: String,
    /// Resident memory in MB.
    pub used_memory: f64,
    /// Memory use as a percentage of total.
    pub memory_use_percent: f64,
    /// Thread count.
    pub used_threads: u32,
    /// Wall-clock time running.
    pub created_time: String,
    /// Creation date.
    pub created_date: String,
}

/// A decoded payload for any topic.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Metric {
    /// `system` payload.
    System(SystemInfo),
    /// `cpu` payload.
    Cpu(CpuMetrics),
    /// `ram` payload.
    Ram(RamMetrics),
    /// `disk` payload.
    Disk(DiskMetrics),
    /// `network` payload.
    Network(NetworkMetrics),
    /// `processes` payload.
    Processes(Vec<ProcessInfo>),
}

impl Metric {
    /// Decode an opaque response payload for `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] when the value does not match
    /// the topic's schema.
    pub fn decode(topic: Topic, value: Value) -> Result<Self> {
        fn parse<T: serde::de::DeserializeOwned>(topic: Topic, value: Value) -> Result<T> {
            serde_json::from_value(value).map_err(|source| ClientError::Decode { topic, source })
        }

        Ok(match topic {
            Topic::System => Self::System(parse(topic, value)?),
            Topic::Cpu => Self::Cpu(parse(topic, value)?),
            Topic::Ram => Self::Ram(parse(topic, value)?),
            Topic::Disk => Self::Disk(parse(topic, value)?),
            Topic::Network => Self::Network(parse(topic, value)?),
            Topic::Processes => Self::Processes(parse(topic, value)?),
        })
    }

    /// The topic this payload belongs to.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::System(_) => Topic::System,
            Self::Cpu(_) => Topic::Cpu,
            Self::Ram(_) => Topic::Ram,
            Self::Disk(_) => Topic::Disk,
            Self::Network(_) => Topic::Network,
            Self::Processes(_) => Topic::Processes,
        }
    }
}
