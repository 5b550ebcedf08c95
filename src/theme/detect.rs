use std::sync::Arc;

use dark_light::{Mode as OsMode, detect as detect_os_mode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source of the "OS prefers dark" signal.
pub trait SignalProbe: Send + Sync {
    /// Current reading, or `None` when the environment can't tell.
    fn prefers_dark(&self) -> Option<bool>;
}

/// Reads the desktop appearance setting.
pub struct OsProbe;

impl SignalProbe for OsProbe {
    fn prefers_dark(&self) -> Option<bool> {
        match detect_os_mode() {
            OsMode::Dark => Some(true),
            OsMode::Light => Some(false),
        }
    }
}

/// Reads the terminal background color.
pub struct TerminalProbe;

impl SignalProbe for TerminalProbe {
    fn prefers_dark(&self) -> Option<bool> {
        match terminal_light::luma() {
            Ok(luma) => Some(luma <= 0.5),
            Err(e) => {
                debug!(error = %e, "terminal background detection failed");
                None
            }
        }
    }
}

/// Always reports the same value.
pub struct FixedProbe(pub bool);

impl SignalProbe for FixedProbe {
    fn prefers_dark(&self) -> Option<bool> {
        Some(self.0)
    }
}

/// Which probe to use, as written in config and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    #[default]
    Os,
    Terminal,
    Light,
    Dark,
}

impl SignalSource {
    pub fn probe(self) -> Arc<dyn SignalProbe> {
        match self {
            Self::Os => Arc::new(OsProbe),
            Self::Terminal => Arc::new(TerminalProbe),
            Self::Light => Arc::new(FixedProbe(false)),
            Self::Dark => Arc::new(FixedProbe(true)),
        }
    }
}
