//! Device capability classification.
//!
//! Hardware hints come from a [`CapabilityProvider`] so tests can pin them.
//! Missing hints are replaced by conservative defaults; classification always
//! yields a level.

use crate::config::CapabilityConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityLevel {
    Low,
    Medium,
    High,
}

impl CapabilityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for CapabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!(
                "unknown capability level {other} (expected low, medium or high)"
            )),
        }
    }
}

/// Raw hints as reported by the platform. `None` means not reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HardwareHints {
    pub cores: Option<usize>,
    pub memory_gb: Option<f64>,
}

/// Source of hardware hints.
pub trait CapabilityProvider: Send + Sync {
    fn hints(&self) -> HardwareHints;

    /// Level for these hints. Providers that force a level override this.
    fn level(&self, config: &CapabilityConfig) -> CapabilityLevel {
        classify(self.hints(), config)
    }
}

/// Compare hints against the two threshold pairs.
pub fn classify(hints: HardwareHints, config: &CapabilityConfig) -> CapabilityLevel {
    let cores = hints.cores.unwrap_or(config.default_cores);
    let memory = hints.memory_gb.unwrap_or(config.default_memory_gb);

    if cores >= config.high_cores && memory >= config.high_memory_gb {
        CapabilityLevel::High
    } else if cores >= config.medium_cores && memory >= config.medium_memory_gb {
        CapabilityLevel::Medium
    } else {
        CapabilityLevel::Low
    }
}

static SYSTEM_HINTS: LazyLock<HardwareHints> = LazyLock::new(|| {
    let cores = std::thread::available_parallelism().map(|n| n.get()).ok();

    let mut system = sysinfo::System::new();
    system.refresh_memory();
    let total = system.total_memory();
    let memory_gb = (total > 0).then(|| total as f64 / (1024.0 * 1024.0 * 1024.0));

    let hints = HardwareHints { cores, memory_gb };
    log::debug!("probed hardware hints: {hints:?}");
    hints
});

/// Hints from the running machine, probed once per process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCapability;

impl CapabilityProvider for SystemCapability {
    fn hints(&self) -> HardwareHints {
        *SYSTEM_HINTS
    }
}

/// Fixed hints or a forced level, for tests and the `--capability` flag.
#[derive(Debug, Clone, Copy)]
pub enum FixedCapability {
    Hints(HardwareHints),
    Level(CapabilityLevel),
}

impl CapabilityProvider for FixedCapability {
    fn hints(&self) -> HardwareHints {
        match self {
            Self::Hints(hints) => *hints,
            Self::Level(_) => HardwareHints::default(),
        }
    }

    fn level(&self, config: &CapabilityConfig) -> CapabilityLevel {
        match self {
            Self::Hints(hints) => classify(*hints, config),
            Self::Level(level) => *level,
        }
    }
}
