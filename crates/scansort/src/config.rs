//! Configuration for the classification service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Managed storage directories
    #[serde(default)]
    pub storage: StorageConfig,
    /// Registry snapshot persistence
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    /// OCR collaborator configuration
    #[serde(default)]
    pub ocr: OcrConfig,
    /// Processing mode for uploaded documents
    #[serde(default)]
    pub mode: ProcessingMode,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
    /// Shared-secret API key; empty disables the check
    #[serde(default)]
    pub api_key: String,
    /// CORS origins; empty (or "*") allows any origin
    #[serde(default)]
    pub allow_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_size: 100 * 1024 * 1024, // 100MB
            api_key: String::new(),
            allow_origins: Vec::new(),
        }
    }
}

/// The four managed directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Incoming scans land here before routing
    pub scan_dir: PathBuf,
    /// Documents with both name and account extracted
    pub fully_indexed_dir: PathBuf,
    /// Documents with exactly one field extracted
    pub partially_indexed_dir: PathBuf,
    /// Documents with no extractable fields (or routing failures)
    pub failed_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scansort");
        Self {
            scan_dir: base.join("incoming-scan"),
            fully_indexed_dir: base.join("fully_indexed"),
            partially_indexed_dir: base.join("partially_indexed"),
            failed_dir: base.join("failed"),
        }
    }
}

impl StorageConfig {
    /// Create every managed directory that does not exist yet
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            &self.scan_dir,
            &self.fully_indexed_dir,
            &self.partially_indexed_dir,
            &self.failed_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Registry snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Path of the JSON snapshot document
    pub path: PathBuf,
    /// Seconds between periodic snapshot writes
    #[serde(default = "default_snapshot_interval")]
    pub interval_secs: u64,
}

fn default_snapshot_interval() -> u64 {
    30
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scansort");
        Self {
            path: base.join("state").join("jobs_snapshot.json"),
            interval_secs: default_snapshot_interval(),
        }
    }
}

/// OCR collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Rasterization resolution passed to pdftoppm
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// OCR language passed to tesseract
    #[serde(default = "default_ocr_language")]
    pub language: String,
}

fn default_dpi() -> u32 {
    300
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            language: default_ocr_language(),
        }
    }
}

/// Processing mode for uploads
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Route inline; the upload response carries the terminal job record
    #[default]
    Immediate,
    /// Enqueue and return immediately; a background worker drains the queue
    Async,
}

impl ScanConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }
        if let Some(port) = env_parse("PORT") {
            config.server.port = port;
        }
        if let Ok(key) = std::env::var("API_KEY") {
            config.server.api_key = key;
        }
        if let Ok(origins) = std::env::var("ALLOW_ORIGINS") {
            config.server.allow_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Ok(mode) = std::env::var("PROCESS_MODE") {
            config.mode = match mode.as_str() {
                "async" => ProcessingMode::Async,
                _ => ProcessingMode::Immediate,
            };
        }
        if let Ok(dir) = std::env::var("SCAN_DIR") {
            config.storage.scan_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("FULLY_INDEXED_DIR") {
            config.storage.fully_indexed_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("PARTIAL_INDEXED_DIR") {
            config.storage.partially_indexed_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("FAILED_DIR") {
            config.storage.failed_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("SNAPSHOT_PATH") {
            config.snapshot.path = PathBuf::from(path);
        }
        if let Some(interval) = env_parse("SNAPSHOT_INTERVAL") {
            config.snapshot.interval_secs = interval;
        }
        if let Some(dpi) = env_parse("OCR_DPI") {
            config.ocr.dpi = dpi;
        }
        if let Ok(lang) = std::env::var("OCR_LANG") {
            config.ocr.language = lang;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_immediate() {
        let config = ScanConfig::default();
        assert_eq!(config.mode, ProcessingMode::Immediate);
        assert_eq!(config.snapshot.interval_secs, 30);
    }

    #[test]
    fn test_mode_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProcessingMode::Async).unwrap(),
            "\"async\""
        );
        let mode: ProcessingMode = serde_json::from_str("\"immediate\"").unwrap();
        assert_eq!(mode, ProcessingMode::Immediate);
    }
}
