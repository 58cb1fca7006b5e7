use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::emitter::MetadataPolicy;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub osc: OscConfig,
    #[serde(default)]
    pub landmarks: LandmarksConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// 1秒あたりの処理サイクル数
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OscConfig {
    /// 受信アドレス
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// チャンネル転送先（未設定なら転送しない）
    #[serde(default)]
    pub forward_addr: Option<String>,
    /// 転送時のアドレス接頭辞
    #[serde(default = "default_forward_prefix")]
    pub forward_prefix: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LandmarksConfig {
    /// id,name の2列CSV
    #[serde(default = "default_map_path")]
    pub map_path: PathBuf,
    /// マスク名（空 or "all" で素通し）
    #[serde(default)]
    pub mask: String,
    /// マスクCSV（1列目がランドマーク名）
    #[serde(default)]
    pub mask_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub metadata_policy: MetadataPolicy,
    /// timestamp_str の書き出し先
    #[serde(default)]
    pub timestamp_str_path: Option<PathBuf>,
    /// 受信行をフレームごとにdebugログへ出す
    #[serde(default)]
    pub log_frames: bool,
}

fn default_target_fps() -> u32 { 60 }
fn default_listen_addr() -> String { "0.0.0.0:9000".to_string() }
fn default_forward_prefix() -> String { "fanout".to_string() }
fn default_map_path() -> PathBuf { PathBuf::from("data/landmark_map.csv") }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
        }
    }
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            forward_addr: None,
            forward_prefix: default_forward_prefix(),
        }
    }
}

impl Default for LandmarksConfig {
    fn default() -> Self {
        Self {
            map_path: default_map_path(),
            mask: String::new(),
            mask_path: None,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// 実行中の再読み込み（読めなければ現在の設定のまま）
    pub fn reload<P: AsRef<Path>>(path: P, current: &Config) -> Config {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{:#}, keeping current config", e);
                current.clone()
            }
        }
    }

    /// 読めなければデフォルト設定
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{:#}, using defaults", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.app.target_fps, 60);
        assert_eq!(config.osc.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.osc.forward_addr, None);
        assert_eq!(config.landmarks.map_path, PathBuf::from("data/landmark_map.csv"));
        assert_eq!(config.output.metadata_policy, MetadataPolicy::Frame);
        assert!(!config.output.log_frames);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [osc]
            forward_addr = "127.0.0.1:7000"

            [landmarks]
            mask = "hands"
            mask_path = "data/mask_hands.csv"

            [output]
            metadata_policy = "cached"
            "#,
        )
        .unwrap();
        assert_eq!(config.osc.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.osc.forward_addr.as_deref(), Some("127.0.0.1:7000"));
        assert_eq!(config.osc.forward_prefix, "fanout");
        assert_eq!(config.landmarks.mask, "hands");
        assert_eq!(config.output.metadata_policy, MetadataPolicy::Cached);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result: Result<Config, _> = toml::from_str("[output]\nmetadata_policy = \"sticky\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_and_fallback() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[app]\ntarget_fps = 30").unwrap();
        assert_eq!(Config::load(file.path()).unwrap().app.target_fps, 30);

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.toml");
        assert!(Config::load(&missing).is_err());
        assert_eq!(Config::load_or_default(&missing), Config::default());
    }

    #[test]
    fn test_reload_keeps_current_on_broken_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "[osc]\nforward_addr = \"127.0.0.1:7000\"\n").unwrap();
        let current = Config::load(file.path()).unwrap();

        // 保存途中のような壊れたTOML
        fs::write(file.path(), "[osc\nforward_addr = ").unwrap();
        assert_eq!(Config::reload(file.path(), &current), current);

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.toml");
        assert_eq!(Config::reload(&missing, &current), current);

        fs::write(file.path(), "[app]\ntarget_fps = 30\n").unwrap();
        let reloaded = Config::reload(file.path(), &current);
        assert_eq!(reloaded.app.target_fps, 30);
        assert_eq!(reloaded.osc.forward_addr, None);
    }
}
