//! File Envelope - Configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;
use crate::envelope::SEALED_SUFFIX;
use crate::error::{EnvelopeError, EnvelopeResult};

/// Envelope configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// PBKDF2 parameters for password-derived keys
    pub kdf: KdfParams,
    /// Suffix of sealed files (informational; the filename policy is fixed)
    pub sealed_suffix: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            sealed_suffix: SEALED_SUFFIX.to_string(),
            log_json: false,
        }
    }
}

impl EnvelopeConfig {
    /// Load from a JSON file; missing fields fall back to defaults
    pub fn load<P: AsRef<Path>>(path: P) -> EnvelopeResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: EnvelopeConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Per-user config location (`<config dir>/file-envelope/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("file-envelope").join("config.json"))
    }

    /// Load if a path is given, otherwise defaults
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> EnvelopeResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Explicit path, else the per-user file if it exists, else defaults
    pub fn discover<P: AsRef<Path>>(path: Option<P>) -> EnvelopeResult<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }
        match Self::default_path() {
            Some(p) if p.is_file() => Self::load(p),
            _ => Ok(Self::default()),
        }
    }

    /// Save as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> EnvelopeResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> EnvelopeResult<()> {
        if self.sealed_suffix != SEALED_SUFFIX {
            return Err(EnvelopeError::Config(format!(
                "sealed_suffix must be \"{}\", got \"{}\"",
                SEALED_SUFFIX, self.sealed_suffix
            )));
        }
        Ok(())
    }
}
