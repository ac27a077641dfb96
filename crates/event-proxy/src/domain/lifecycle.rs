//! Proxy lifecycle states.

use std::fmt;

/// `Created → Running → Stopping → Stopped`. There is no restart.
///
/// A proxy stopped before its publisher loop started may go straight from
/// `Created` to `Stopped` (nothing queued) or to `Stopping` (the loop still
/// drains once started).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyState {
    #[default]
    Created,
    Running,
    Stopping,
    Stopped,
}

impl ProxyState {
    /// New events are refused in these states.
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }
}

impl fmt::Display for ProxyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
