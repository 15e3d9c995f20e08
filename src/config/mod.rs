// 配置管理模块

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Web服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 目录服务配置
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// 上传配置
    #[serde(default)]
    pub upload: UploadConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// Web服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS允许的源
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// 目录服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// 目录服务根地址，决定上传目标部署
    #[serde(default = "default_service_root")]
    pub service_root: String,
    /// 单个请求的超时时间（秒）
    ///
    /// 快照拉取和图片上传共用；不设超时的话挂死的请求会一直占着并发槽位
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_service_root() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            service_root: default_service_root(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// 上传配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// 渲染输出根目录
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    /// 批次内最大并发上传数
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
    /// 部件名过滤，空列表表示不限制
    #[serde(default)]
    pub part_filter: Vec<String>,
    /// 整批全部上传成功后是否删除该变体的渲染输出目录
    #[serde(default)]
    pub cleanup_after_upload: bool,
}

fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_max_concurrent_uploads() -> usize {
    10
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            media_root: default_media_root(),
            max_concurrent_uploads: default_max_concurrent_uploads(),
            part_filter: Vec::new(),
            cleanup_after_upload: false,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 是否启用日志文件持久化
    #[serde(default = "default_log_enabled")]
    pub enabled: bool,
    /// 日志文件保存目录
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// 日志保留天数（默认 7 天）
    #[serde(default = "default_log_retention_days")]
    pub retention_days: u32,
    /// 日志级别（默认 info）
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_enabled() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_retention_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_log_enabled(),
            log_dir: default_log_dir(),
            retention_days: default_log_retention_days(),
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从 TOML 文件加载配置
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("读取配置文件失败: {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| format!("解析配置文件失败: {:?}", path))?;
        Ok(config)
    }

    /// 加载配置，文件不存在或解析失败时回退到默认配置
    pub async fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path).await {
            Ok(config) => config,
            Err(e) => {
                warn!("加载配置失败，使用默认配置: {:#}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.catalog.service_root, "http://127.0.0.1:8000");
        assert_eq!(config.catalog.request_timeout_secs, 30);
        assert_eq!(config.upload.max_concurrent_uploads, 10);
        assert_eq!(config.upload.media_root, PathBuf::from("media"));
        assert!(config.upload.part_filter.is_empty());
        assert!(!config.upload.cleanup_after_upload);
        assert_eq!(config.log.retention_days, 7);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            [catalog]
            service_root = "http://194.15.46.132:8000"

            [upload]
            max_concurrent_uploads = 4
            part_filter = ["seat", "legs"]
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.catalog.service_root, "http://194.15.46.132:8000");
        // 未给出的字段取默认值
        assert_eq!(config.catalog.request_timeout_secs, 30);
        assert_eq!(config.upload.max_concurrent_uploads, 4);
        assert_eq!(config.upload.part_filter, vec!["seat", "legs"]);
        assert_eq!(config.server.port, 8080);
    }

    #[tokio::test]
    async fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default("/nonexistent/app.toml").await;
        assert_eq!(config.upload.max_concurrent_uploads, 10);
    }

    #[tokio::test]
    async fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");
        let config = AppConfig::default();
        tokio::fs::write(&path, toml::to_string_pretty(&config).unwrap())
            .await
            .unwrap();

        let loaded = AppConfig::load(&path).await.unwrap();
        assert_eq!(loaded.catalog.service_root, config.catalog.service_root);
        assert_eq!(loaded.server.host, config.server.host);
    }
}
