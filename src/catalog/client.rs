// 目录服务客户端实现

use crate::catalog::ProductSnapshot;
use crate::config::CatalogConfig;
use anyhow::{Context, Result};
use reqwest::multipart;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// 目录服务错误
///
/// 上传执行器依赖 `UploadRejected` 区分「服务端拒绝」和传输层失败
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// 传输层失败（连接、超时、DNS 等）
    #[error("请求失败: {0}")]
    Http(#[from] reqwest::Error),

    /// 快照接口返回非 200
    #[error("获取快照失败: product_id={product_id}, status={status}")]
    SnapshotRejected { product_id: i64, status: u16 },

    /// 快照 JSON 解析失败
    #[error("解析快照失败: product_id={product_id}: {source}")]
    SnapshotDecode {
        product_id: i64,
        #[source]
        source: serde_json::Error,
    },

    /// 上传接口返回非 200
    #[error("上传被拒绝: status={status}")]
    UploadRejected { status: u16 },

    /// 读取本地渲染图失败
    #[error("读取渲染图失败: {path:?}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 商品目录服务客户端
#[derive(Debug, Clone)]
pub struct CatalogClient {
    /// HTTP客户端
    client: Client,
    /// 服务根地址，例如 http://194.15.46.132:8000
    service_root: String,
}

impl CatalogClient {
    /// 创建新的目录服务客户端
    ///
    /// 超时直接配置在 HTTP 客户端上，覆盖快照拉取和图片上传两类请求。
    /// 不配置超时的话一次挂死的请求会一直占着一个并发槽位。
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        info!(
            "初始化目录服务客户端: service_root={}, timeout={}s",
            config.service_root, config.request_timeout_secs
        );

        Ok(Self {
            client,
            service_root: config.service_root.trim_end_matches('/').to_string(),
        })
    }

    /// 服务根地址
    pub fn service_root(&self) -> &str {
        &self.service_root
    }

    /// 拉取商品渲染快照
    ///
    /// GET <service-root>/api/product/render/<product_id>/
    pub async fn fetch_render_snapshot(
        &self,
        product_id: i64,
    ) -> Result<ProductSnapshot, CatalogError> {
        let url = format!("{}/api/product/render/{}/", self.service_root, product_id);
        debug!("拉取商品快照: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(CatalogError::SnapshotRejected {
                product_id,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let snapshot = serde_json::from_str::<ProductSnapshot>(&body)
            .map_err(|source| CatalogError::SnapshotDecode { product_id, source })?;

        debug!(
            "商品快照拉取完成: product_id={}, models={}",
            product_id,
            snapshot.models.len()
        );
        Ok(snapshot)
    }

    /// 上传一张渲染图到材质槽位
    ///
    /// POST <service-root>/api/product/load_scene_material/
    /// multipart 两个字段：scene_material（槽位ID字符串）和 image（二进制，保留原文件名）
    pub async fn upload_scene_material(
        &self,
        scene_material: i64,
        image_path: &Path,
    ) -> Result<(), CatalogError> {
        let data = tokio::fs::read(image_path)
            .await
            .map_err(|source| CatalogError::ImageRead {
                path: image_path.to_path_buf(),
                source,
            })?;

        let file_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.png", scene_material));

        let part = multipart::Part::bytes(data)
            .file_name(file_name)
            .mime_str("image/png")?;
        let form = multipart::Form::new()
            .text("scene_material", scene_material.to_string())
            .part("image", part);

        let url = format!("{}/api/product/load_scene_material/", self.service_root);
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(CatalogError::UploadRejected {
                status: status.as_u16(),
            });
        }

        debug!(
            "上传成功: scene_material={}, file={:?}",
            scene_material, image_path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use axum::{http::StatusCode, routing::get, routing::post, Router};
    use std::io::Write;

    /// 在随机端口上起一个一次性目录服务
    async fn spawn_mock_catalog(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn test_config(service_root: String) -> CatalogConfig {
        CatalogConfig {
            service_root,
            request_timeout_secs: 5,
        }
    }

    const SNAPSHOT_JSON: &str = r#"{
        "model_3d": [{
            "obj": null,
            "cameras": [{
                "parts": [{
                    "part": {"blender_name": "frame"},
                    "materials": [{"id": 7, "material": "walnut", "image": null}]
                }]
            }]
        }]
    }"#;

    #[tokio::test]
    async fn test_fetch_render_snapshot_ok() {
        let app = Router::new().route(
            "/api/product/render/42/",
            get(|| async { ([("content-type", "application/json")], SNAPSHOT_JSON) }),
        );
        let root = spawn_mock_catalog(app).await;

        let client = CatalogClient::new(&test_config(root)).unwrap();
        let snapshot = client.fetch_render_snapshot(42).await.unwrap();
        assert_eq!(snapshot.models.len(), 1);
        assert_eq!(
            snapshot.models[0].cameras[0].parts[0].part.blender_name,
            "frame"
        );
    }

    #[tokio::test]
    async fn test_fetch_render_snapshot_non_200() {
        let app = Router::new().route(
            "/api/product/render/42/",
            get(|| async { StatusCode::NOT_FOUND }),
        );
        let root = spawn_mock_catalog(app).await;

        let client = CatalogClient::new(&test_config(root)).unwrap();
        let err = client.fetch_render_snapshot(42).await.unwrap_err();
        match err {
            CatalogError::SnapshotRejected { product_id, status } => {
                assert_eq!(product_id, 42);
                assert_eq!(status, 404);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_render_snapshot_decode_error() {
        let app = Router::new().route(
            "/api/product/render/42/",
            get(|| async { "not json at all" }),
        );
        let root = spawn_mock_catalog(app).await;

        let client = CatalogClient::new(&test_config(root)).unwrap();
        let err = client.fetch_render_snapshot(42).await.unwrap_err();
        assert!(matches!(err, CatalogError::SnapshotDecode { .. }));
    }

    #[tokio::test]
    async fn test_upload_scene_material_ok_and_rejected() {
        let app = Router::new().route(
            "/api/product/load_scene_material/",
            post(|| async { StatusCode::OK }),
        );
        let root = spawn_mock_catalog(app).await;
        let client = CatalogClient::new(&test_config(root)).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG fake").unwrap();

        client
            .upload_scene_material(7, file.path())
            .await
            .unwrap();

        // 服务端拒绝的情况
        let app = Router::new().route(
            "/api/product/load_scene_material/",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let root = spawn_mock_catalog(app).await;
        let client = CatalogClient::new(&test_config(root)).unwrap();

        let err = client
            .upload_scene_material(7, file.path())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UploadRejected { status: 500 }));
    }

    #[tokio::test]
    async fn test_upload_scene_material_missing_file() {
        let client =
            CatalogClient::new(&test_config("http://127.0.0.1:9".to_string())).unwrap();
        let err = client
            .upload_scene_material(7, Path::new("/nonexistent/render.png"))
            .await
            .unwrap_err();
        // 文件读取失败在发请求之前就返回
        assert!(matches!(err, CatalogError::ImageRead { .. }));
    }
}
