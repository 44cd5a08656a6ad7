use std::fs;
use std::io;
use std::path::PathBuf;

/// Writes raw provider responses to disk for inspection. Nothing reads them back.
#[derive(Debug, Clone)]
pub struct DebugDump {
    dir: PathBuf,
    enabled: bool,
}

impl DebugDump {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
        }
    }

    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), false)
    }

    /// Pretty-print `payload` to `<dir>/<prefix>_<sanitized key>.json`.
    ///
    /// Returns `Ok(None)` when dumping is turned off.
    pub fn write(
        &self,
        prefix: &str,
        key: &str,
        payload: &serde_json::Value,
    ) -> io::Result<Option<PathBuf>> {
        if !self.enabled {
            return Ok(None);
        }
        fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(format!("{prefix}_{}.json", sanitize_key(key)));
        let pretty = serde_json::to_string_pretty(payload).map_err(io::Error::other)?;
        fs::write(&path, pretty)?;
        Ok(Some(path))
    }

    /// Best-effort variant: failures are logged and swallowed
    pub fn write_or_warn(&self, prefix: &str, key: &str, payload: &serde_json::Value) {
        match self.write(prefix, key, payload) {
            Ok(Some(path)) => tracing::debug!("Saved {} response to {}", prefix, path.display()),
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to save {} response for '{}': {}", prefix, key, e),
        }
    }
}

/// Filesystem-safe file key: everything but ASCII letters, digits and `-` becomes `_`
pub fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
