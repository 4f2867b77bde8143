//! Host export bridge
//!
//! When shapehub runs inside the desktop shell, the shell publishes an export
//! endpoint and advertises its path in `SHAPEHUB_HOST_BRIDGE`. Each export is
//! written there as one JSON line:
//!
//! ```text
//! {"command":"DragDropShape","payload":"<opaque payload>"}
//! ```
//!
//! Outside the shell the variable is unset and the bridge is [`HostBridge::Absent`].
//! Absence is a normal state, never an error: callers match on the variant.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use shapehub_domain::Payload;

use crate::error::BridgeError;

/// Environment variable holding the bridge endpoint path
pub const HOST_BRIDGE_ENV: &str = "SHAPEHUB_HOST_BRIDGE";

/// An export target provided by the embedding host
pub trait HostExport: Send + Sync {
    /// Hand the payload to the host. No acknowledgment is expected.
    fn export(&self, payload: &Payload) -> Result<(), BridgeError>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Result of an export attempt as seen by the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeStatus {
    /// Handed to the host
    Delivered,
    /// No host bridge in this environment
    Unavailable,
    /// The host bridge errored; logged and swallowed
    Failed,
}

/// Capability-detected host bridge
#[derive(Clone)]
pub enum HostBridge {
    Present(Arc<dyn HostExport>),
    Absent,
}

impl HostBridge {
    /// Bridge for this process, probed from the environment once
    pub fn detect() -> HostBridge {
        static DETECTED: OnceLock<HostBridge> = OnceLock::new();
        DETECTED
            .get_or_init(|| {
                let bridge = Self::probe(std::env::var_os(HOST_BRIDGE_ENV).map(PathBuf::from));
                tracing::info!(available = bridge.is_available(), "Host bridge detection");
                bridge
            })
            .clone()
    }

    /// Probe a specific endpoint path without caching
    pub fn probe(path: Option<PathBuf>) -> HostBridge {
        match path {
            Some(path) if path.exists() => HostBridge::Present(Arc::new(FileBridge::new(path))),
            Some(path) => {
                tracing::debug!("Host bridge path {} does not exist", path.display());
                HostBridge::Absent
            }
            None => HostBridge::Absent,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, HostBridge::Present(_))
    }

    /// Export `payload`, degrading silently when the host is absent or fails
    pub fn export(&self, payload: &Payload) -> BridgeStatus {
        match self {
            HostBridge::Present(host) => match host.export(payload) {
                Ok(()) => {
                    tracing::debug!(bytes = payload.len(), "Exported payload to {}", host.describe());
                    BridgeStatus::Delivered
                }
                Err(e) => {
                    tracing::warn!("Host bridge {} failed: {}", host.describe(), e);
                    BridgeStatus::Failed
                }
            },
            HostBridge::Absent => {
                tracing::debug!("Host bridge not available; export skipped");
                BridgeStatus::Unavailable
            }
        }
    }
}

impl fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostBridge::Present(host) => write!(f, "HostBridge::Present({})", host.describe()),
            HostBridge::Absent => f.write_str("HostBridge::Absent"),
        }
    }
}

#[derive(Serialize)]
struct ExportMessage<'a> {
    command: &'static str,
    payload: &'a str,
}

/// Bridge endpoint backed by a file or FIFO owned by the host shell
pub struct FileBridge {
    path: PathBuf,
}

impl FileBridge {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostExport for FileBridge {
    fn export(&self, payload: &Payload) -> Result<(), BridgeError> {
        let message = ExportMessage {
            command: "DragDropShape",
            payload: payload.as_str(),
        };
        let mut line = serde_json::to_vec(&message)
            .map_err(|e| BridgeError::Rejected(e.to_string()))?;
        line.push(b'\n');

        // The host creates the endpoint; never create it ourselves.
        let mut endpoint = OpenOptions::new().append(true).open(&self.path)?;
        endpoint.write_all(&line)?;
        endpoint.flush()?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingHost {
        received: Mutex<Vec<String>>,
        fail: bool,
    }

    impl HostExport for RecordingHost {
        fn export(&self, payload: &Payload) -> Result<(), BridgeError> {
            if self.fail {
                return Err(BridgeError::Rejected("busy".to_string()));
            }
            self.received.lock().unwrap().push(payload.as_str().to_string());
            Ok(())
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }

    #[test]
    fn test_absent_bridge_degrades() {
        let bridge = HostBridge::probe(None);
        assert!(!bridge.is_available());
        assert_eq!(bridge.export(&Payload::from("x")), BridgeStatus::Unavailable);
    }

    #[test]
    fn test_missing_path_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = HostBridge::probe(Some(dir.path().join("no-such-endpoint")));
        assert!(!bridge.is_available());
    }

    #[test]
    fn test_present_bridge_delivers() {
        let host = Arc::new(RecordingHost {
            received: Mutex::new(Vec::new()),
            fail: false,
        });
        let bridge = HostBridge::Present(host.clone());
        assert_eq!(bridge.export(&Payload::from("<Shape/>")), BridgeStatus::Delivered);
        assert_eq!(*host.received.lock().unwrap(), vec!["<Shape/>".to_string()]);
    }

    #[test]
    fn test_failing_host_is_soft_failure() {
        let bridge = HostBridge::Present(Arc::new(RecordingHost {
            received: Mutex::new(Vec::new()),
            fail: true,
        }));
        assert_eq!(bridge.export(&Payload::from("x")), BridgeStatus::Failed);
    }

    #[test]
    fn test_file_bridge_writes_json_lines() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let bridge = HostBridge::probe(Some(file.path().to_path_buf()));
        assert!(bridge.is_available());

        bridge.export(&Payload::from("<A/>"));
        bridge.export(&Payload::from("line\nbreak"));

        let written = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<serde_json::Value> = written
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["command"], "DragDropShape");
        assert_eq!(lines[0]["payload"], "<A/>");
        assert_eq!(lines[1]["payload"], "line\nbreak");
    }
}
