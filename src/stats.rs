use parking_lot::Mutex;
use std::time::{Duration, Instant};
use sysinfo::{Pid, System};
use tracing::{debug, warn};

use crate::error::MusicError;

/// Figures read from the gateway cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewayCounts {
    pub guilds: usize,
    pub users: u64,
    pub channels: usize,
    pub latency_ms: Option<u128>,
}

/// Host and process counters at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSnapshot {
    pub os: String,
    pub arch: String,
    pub cores: usize,
    pub process_cpu_percent: f32,
    /// Bytes
    pub process_memory: u64,
    pub total_memory: u64,
    pub used_memory: u64,
    pub uptime: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotStats {
    pub counts: GatewayCounts,
    pub host: HostSnapshot,
    pub version: &'static str,
}

/// Reads the host and process counters for `botstats`
pub struct StatsCollector {
    system: Mutex<System>,
    pid: Option<Pid>,
    started: Instant,
}

impl StatsCollector {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("⚠️ Could not resolve own pid, process stats disabled: {}", e);
                None
            }
        };

        Self {
            system: Mutex::new(System::new_all()),
            pid,
            started: Instant::now(),
        }
    }

    pub fn host_snapshot(&self) -> Result<HostSnapshot, MusicError> {
        let pid = self.pid.ok_or_else(|| {
            MusicError::CollaboratorUnavailable("process id unavailable".to_string())
        })?;

        let mut system = self.system.lock();
        system.refresh_memory();
        system.refresh_cpu();

        if !system.refresh_process(pid) {
            return Err(MusicError::CollaboratorUnavailable(format!(
                "process {pid} not found"
            )));
        }

        let process = system.process(pid).ok_or_else(|| {
            MusicError::CollaboratorUnavailable(format!("process {pid} not found"))
        })?;

        let snapshot = HostSnapshot {
            os: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            arch: std::env::consts::ARCH.to_string(),
            cores: system.cpus().len(),
            process_cpu_percent: process.cpu_usage(),
            process_memory: process.memory(),
            total_memory: system.total_memory(),
            used_memory: system.used_memory(),
            uptime: self.started.elapsed(),
        };

        debug!("📊 Host snapshot: {:?}", snapshot);
        Ok(snapshot)
    }

    pub fn collect(&self, counts: GatewayCounts) -> Result<BotStats, MusicError> {
        Ok(BotStats {
            counts,
            host: self.host_snapshot()?,
            version: env!("CARGO_PKG_VERSION"),
        })
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// `"{d}d {h}h {m}m {s}s"`
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
}

pub fn invite_url(application_id: u64) -> String {
    format!(
        "https://discord.com/api/oauth2/authorize?client_id={}&permissions=8&scope=bot%20applications.commands",
        application_id
    )
}
