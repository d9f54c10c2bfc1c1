//! Per-command minimum idle duration policy.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Errors loading a cutoff policy file.
#[derive(Debug, Error)]
pub enum CutoffError {
    #[error("cutoff file not found: {path}")]
    NotFound { path: String },
    #[error("failed to read cutoff file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cutoff file {path} is not a JSON object of command -> seconds")]
    InvalidFormat { path: String },
}

/// Maps a command identifier to the minimum idle duration (seconds) below
/// which an idle episode is reclassified as active time.
///
/// Commands absent from the policy have a zero threshold.
#[derive(Debug, Clone, Default)]
pub struct CutoffPolicy {
    thresholds: HashMap<String, f64>,
}

impl CutoffPolicy {
    /// Builds a policy from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            thresholds: entries.into_iter().collect(),
        }
    }

    /// The threshold for `cmd`, defaulting to zero when the command is
    /// unknown or absent.
    pub fn threshold(&self, cmd: Option<&str>) -> f64 {
        cmd.and_then(|c| self.thresholds.get(c))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Loads a policy from a JSON file mapping command -> seconds.
    ///
    /// Entries with non-numeric or negative values are dropped with a
    /// warning; they fall back to the zero threshold. A missing or
    /// unreadable file is an error for the caller to surface.
    pub fn load(path: &Path) -> Result<Self, CutoffError> {
        let display = path.display().to_string();
        let data = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CutoffError::NotFound { path: display.clone() }
            } else {
                CutoffError::Io {
                    path: display.clone(),
                    source,
                }
            }
        })?;

        let value: serde_json::Value =
            serde_json::from_str(&data).map_err(|_| CutoffError::InvalidFormat {
                path: display.clone(),
            })?;
        let serde_json::Value::Object(map) = value else {
            return Err(CutoffError::InvalidFormat { path: display });
        };

        let mut thresholds = HashMap::with_capacity(map.len());
        for (cmd, seconds) in map {
            match seconds.as_f64() {
                Some(s) if s >= 0.0 => {
                    thresholds.insert(cmd, s);
                }
                _ => {
                    tracing::warn!(command = %cmd, value = %seconds, "dropping invalid cutoff entry");
                }
            }
        }

        Ok(Self { thresholds })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn unknown_command_has_zero_threshold() {
        let policy = CutoffPolicy::default();
        assert!(policy.threshold(Some("mpv")).abs() < f64::EPSILON);
        assert!(policy.threshold(None).abs() < f64::EPSILON);
    }

    #[test]
    fn known_command_returns_its_threshold() {
        let policy = CutoffPolicy::from_entries([("/usr/bin/mpv".to_string(), 120.0)]);
        assert!((policy.threshold(Some("/usr/bin/mpv")) - 120.0).abs() < f64::EPSILON);
        assert!(policy.threshold(Some("/usr/bin/vim")).abs() < f64::EPSILON);
    }

    #[test]
    fn load_parses_json_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"/usr/bin/mpv": 120, "/usr/bin/vlc": 45.5}}"#).unwrap();

        let policy = CutoffPolicy::load(file.path()).unwrap();
        assert!((policy.threshold(Some("/usr/bin/mpv")) - 120.0).abs() < f64::EPSILON);
        assert!((policy.threshold(Some("/usr/bin/vlc")) - 45.5).abs() < f64::EPSILON);
    }

    #[test]
    fn load_drops_invalid_entries_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"/usr/bin/mpv": 120, "/usr/bin/bad": "soon", "/usr/bin/worse": -3}}"#
        )
        .unwrap();

        let policy = CutoffPolicy::load(file.path()).unwrap();
        assert!((policy.threshold(Some("/usr/bin/mpv")) - 120.0).abs() < f64::EPSILON);
        assert!(policy.threshold(Some("/usr/bin/bad")).abs() < f64::EPSILON);
        assert!(policy.threshold(Some("/usr/bin/worse")).abs() < f64::EPSILON);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let err = CutoffPolicy::load(Path::new("/nonexistent/appmap.json")).unwrap_err();
        assert!(matches!(err, CutoffError::NotFound { .. }));
    }

    #[test]
    fn load_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        let err = CutoffPolicy::load(file.path()).unwrap_err();
        assert!(matches!(err, CutoffError::InvalidFormat { .. }));
    }
}
