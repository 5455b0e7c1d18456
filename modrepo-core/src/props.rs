//! Property-file probe: extract `module.prop` from a remote zip archive and
//! parse it into a key/value map.
//!
//! Extraction shells out to the `runzip` helper, which streams a single zip
//! entry to stdout given the archive URL. The probe is infallible by
//! contract: spawn failures, non-zero exits, empty or oversized output and
//! undecodable bytes all yield an empty map, which the release validator
//! turns into the appropriate skip downstream.

use std::collections::HashMap;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::contract::ArchiveProbe;

/// Parsed `module.prop` contents. Key order is irrelevant; duplicate keys
/// take the last occurrence.
pub type PropertyMap = HashMap<String, String>;

/// Output cap for a single probe; reads beyond this abort the probe.
pub const MAX_PROP_BYTES: usize = 64 * 1024;

/// The entry extracted from every module archive.
pub const PROP_ENTRY: &str = "module.prop";

/// Parses `key=value` lines. Empty lines and `#` comments are skipped, the
/// first `=` splits key from value (at least one character before it), both
/// sides are trimmed, later keys override earlier ones.
pub fn parse_properties(text: &str) -> PropertyMap {
    let mut map = PropertyMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(separator) = line.find('=') else {
            continue;
        };
        if separator == 0 {
            continue;
        }
        let key = line[..separator].trim();
        let value = line[separator + 1..].trim();
        map.insert(key.to_string(), value.to_string());
    }
    map
}

/// Probes archives via the `runzip` subprocess.
pub struct RunzipProbe {
    command: String,
}

impl RunzipProbe {
    pub fn new() -> Self {
        Self {
            command: "runzip".to_string(),
        }
    }

    /// Overrides the helper binary; used by tests.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for RunzipProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArchiveProbe for RunzipProbe {
    async fn module_prop(&self, url: String) -> PropertyMap {
        let mut child = match Command::new(&self.command)
            .arg("-p")
            .arg(&url)
            .arg(PROP_ENTRY)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(error = ?e, url = %url, "Failed to spawn archive extractor");
                return PropertyMap::new();
            }
        };

        let Some(mut stdout) = child.stdout.take() else {
            let _ = child.kill().await;
            return PropertyMap::new();
        };

        let mut buffer = Vec::new();
        let read = (&mut stdout)
            .take((MAX_PROP_BYTES + 1) as u64)
            .read_to_end(&mut buffer)
            .await;
        if let Err(e) = read {
            warn!(error = ?e, url = %url, "Failed to read extractor output");
            let _ = child.kill().await;
            let _ = child.wait().await;
            return PropertyMap::new();
        }
        if buffer.len() > MAX_PROP_BYTES {
            // The entry is not a sane property file; stop the stream early.
            warn!(url = %url, cap = MAX_PROP_BYTES, "Extractor output exceeded cap");
            let _ = child.kill().await;
            let _ = child.wait().await;
            return PropertyMap::new();
        }

        match child.wait().await {
            Ok(status) if status.success() => {}
            Ok(status) => {
                debug!(url = %url, status = ?status, "Extractor exited with non-zero code");
                return PropertyMap::new();
            }
            Err(e) => {
                warn!(error = ?e, url = %url, "Failed to await extractor");
                return PropertyMap::new();
            }
        }

        if buffer.is_empty() {
            debug!(url = %url, "Extractor produced no output");
            return PropertyMap::new();
        }

        match String::from_utf8(buffer) {
            Ok(text) => parse_properties(&text),
            Err(e) => {
                warn!(error = ?e, url = %url, "Extractor output is not valid UTF-8");
                PropertyMap::new()
            }
        }
    }
}
