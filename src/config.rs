//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::capture::CaptureConfig;
use crate::state::DEFAULT_CONFIDENCE_THRESHOLD;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Capture loop tunables
    pub capture: CaptureConfig,

    /// Candidate target words; empty means the built-in list
    pub words: Vec<String>,

    /// Whether a speech recognizer is attached
    pub speech_input: bool,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let home = lookup("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("spelling-daemon");

        let socket_path = lookup("SPELLING_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        let confidence_threshold = match lookup("SPELLING_CONFIDENCE") {
            Some(raw) => {
                let value: f32 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("SPELLING_CONFIDENCE is not a number: {:?}", raw))?;
                if !(0.0..=1.0).contains(&value) {
                    bail!("SPELLING_CONFIDENCE must be within [0, 1], got {}", value);
                }
                value
            }
            None => DEFAULT_CONFIDENCE_THRESHOLD,
        };

        let poll_interval = match lookup("SPELLING_POLL_MS") {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("SPELLING_POLL_MS is not a number: {:?}", raw))?;
                if ms == 0 {
                    bail!("SPELLING_POLL_MS must be greater than zero");
                }
                Duration::from_millis(ms)
            }
            None => CaptureConfig::default().poll_interval,
        };

        let max_listen = lookup("SPELLING_MAX_LISTEN_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("SPELLING_MAX_LISTEN_SECS is not a number: {:?}", raw))
            })
            .transpose()?;

        let words = lookup("SPELLING_WORDS")
            .map(|raw| raw.split(',').map(|w| w.trim().to_string()).collect())
            .unwrap_or_default();

        let speech_input = match lookup("SPELLING_SPEECH_INPUT").as_deref() {
            None | Some("on") | Some("true") | Some("1") => true,
            Some("off") | Some("false") | Some("0") => false,
            Some(other) => bail!("SPELLING_SPEECH_INPUT must be on or off, got {:?}", other),
        };

        Ok(Self {
            socket_path,
            data_dir,
            capture: CaptureConfig {
                confidence_threshold,
                poll_interval,
                max_listen,
            },
            words,
            speech_input,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = load_with(&[("HOME", "/home/nao")]).unwrap();
        assert_eq!(
            config.socket_path,
            PathBuf::from("/home/nao/.local/share/spelling-daemon/daemon.sock")
        );
        assert_eq!(config.capture, CaptureConfig::default());
        assert!(config.words.is_empty());
        assert!(config.speech_input);
    }

    #[test]
    fn test_config_overrides() {
        let config = load_with(&[
            ("HOME", "/home/nao"),
            ("SPELLING_SOCKET", "/tmp/spelling.sock"),
            ("SPELLING_CONFIDENCE", "0.65"),
            ("SPELLING_POLL_MS", "250"),
            ("SPELLING_MAX_LISTEN_SECS", "90"),
            ("SPELLING_WORDS", "gato, casa ,bola"),
            ("SPELLING_SPEECH_INPUT", "off"),
        ])
        .unwrap();

        assert_eq!(config.socket_path, PathBuf::from("/tmp/spelling.sock"));
        assert_eq!(config.capture.confidence_threshold, 0.65);
        assert_eq!(config.capture.poll_interval, Duration::from_millis(250));
        assert_eq!(config.capture.max_listen, Some(Duration::from_secs(90)));
        assert_eq!(config.words, vec!["gato", "casa", "bola"]);
        assert!(!config.speech_input);
    }

    #[test]
    fn test_config_requires_home() {
        assert!(load_with(&[]).is_err());
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(load_with(&[("HOME", "/h"), ("SPELLING_CONFIDENCE", "1.5")]).is_err());
        assert!(load_with(&[("HOME", "/h"), ("SPELLING_CONFIDENCE", "high")]).is_err());
        assert!(load_with(&[("HOME", "/h"), ("SPELLING_POLL_MS", "0")]).is_err());
        assert!(load_with(&[("HOME", "/h"), ("SPELLING_MAX_LISTEN_SECS", "-1")]).is_err());
        assert!(load_with(&[("HOME", "/h"), ("SPELLING_SPEECH_INPUT", "maybe")]).is_err());
    }
}
