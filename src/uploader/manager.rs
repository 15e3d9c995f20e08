// 上传管理器
//
// 按商品ID顺序逐个处理：拉取快照 → 任务发现 → 跑一个批次 → 汇总。
// 不同商品的批次串行执行，永不交错；批次内部由协调器并发上传。
// 某个商品的快照拉取失败只中止该商品的处理，后面的商品照常继续。

use crate::catalog::CatalogClient;
use crate::config::UploadConfig;
use crate::uploader::{discover, BatchCoordinator, BatchReport, HttpUploadExecutor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 单个商品的处理结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReport {
    /// 商品ID
    pub product_id: i64,
    /// 批次汇总；快照拉取失败时为 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BatchReport>,
    /// 商品级错误（快照拉取失败等）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProductReport {
    /// 该商品是否处理成功（快照拉到了且批次没有失败任务）
    pub fn is_success(&self) -> bool {
        self.error.is_none()
            && self
                .report
                .as_ref()
                .map(|r| r.all_succeeded())
                .unwrap_or(false)
    }
}

/// 上传管理器
pub struct UploadManager {
    client: Arc<CatalogClient>,
    config: UploadConfig,
}

impl UploadManager {
    pub fn new(client: Arc<CatalogClient>, config: UploadConfig) -> Self {
        Self { client, config }
    }

    /// 顺序处理一组商品
    ///
    /// 每个商品得到一份 ProductReport，失败的商品也在列，不会丢
    pub async fn run(&self, product_ids: &[i64]) -> Vec<ProductReport> {
        let mut reports = Vec::with_capacity(product_ids.len());
        for &product_id in product_ids {
            reports.push(self.run_product(product_id).await);
        }

        let ok = reports.iter().filter(|r| r.is_success()).count();
        info!("全部商品处理完成: {}/{} 成功", ok, reports.len());
        reports
    }

    /// 处理单个商品变体
    async fn run_product(&self, product_id: i64) -> ProductReport {
        info!("开始处理商品: id={}", product_id);

        let snapshot = match self.client.fetch_render_snapshot(product_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // 只中止这个商品，继续处理后面的
                error!("商品处理中止: id={}, 原因: {}", product_id, e);
                return ProductReport {
                    product_id,
                    report: None,
                    error: Some(e.to_string()),
                };
            }
        };

        let part_filter: HashSet<String> = self.config.part_filter.iter().cloned().collect();
        let tasks = discover(
            &snapshot,
            product_id,
            &self.config.media_root,
            &part_filter,
        );

        if tasks.is_empty() {
            info!("商品无待上传任务: id={}", product_id);
            return ProductReport {
                product_id,
                report: Some(BatchReport {
                    total: 0,
                    succeeded: 0,
                    elapsed_secs: 0.0,
                }),
                error: None,
            };
        }

        let executor = Arc::new(HttpUploadExecutor::new(Arc::clone(&self.client)));
        let coordinator =
            BatchCoordinator::new(executor, self.config.max_concurrent_uploads);
        let result = coordinator.run_batch(tasks).await;

        info!(
            "商品处理完成: id={}, {}/{} 上传成功, 耗时 {:.1}s",
            product_id,
            result.report.succeeded,
            result.report.total,
            result.report.elapsed_secs
        );

        if self.config.cleanup_after_upload && result.report.all_succeeded() {
            self.cleanup_variant_dir(product_id).await;
        }

        ProductReport {
            product_id,
            report: Some(result.report),
            error: None,
        }
    }

    /// 整批成功后删除该变体的渲染输出目录
    async fn cleanup_variant_dir(&self, product_id: i64) {
        let dir = self
            .config
            .media_root
            .join(format!("variant_{}", product_id));
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => info!("已清理渲染输出目录: {:?}", dir),
            Err(e) => warn!("清理渲染输出目录失败: {:?}: {}", dir, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use axum::{http::StatusCode, routing::get, routing::post, Router};
    use std::fs;
    use std::path::Path;

    const SNAPSHOT_JSON: &str = r#"{
        "model_3d": [{
            "obj": null,
            "cameras": [{
                "parts": [
                    {
                        "part": {"blender_name": "part_a"},
                        "materials": [{"id": 11, "material": "oak", "image": null}]
                    },
                    {
                        "part": {"blender_name": "part_b"},
                        "materials": [{"id": 12, "material": "ash", "image": "http://x/12.png"}]
                    }
                ]
            }]
        }]
    }"#;

    /// 起一个同时提供快照和上传接口的一次性目录服务
    async fn spawn_mock_catalog() -> String {
        let app = Router::new()
            .route(
                "/api/product/render/5/",
                get(|| async { ([("content-type", "application/json")], SNAPSHOT_JSON) }),
            )
            .route(
                "/api/product/render/404/",
                get(|| async { StatusCode::NOT_FOUND }),
            )
            .route(
                "/api/product/load_scene_material/",
                post(|| async { StatusCode::OK }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn write_render(media_root: &Path, rel: &str) {
        let path = media_root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"png").unwrap();
    }

    fn manager_for(service_root: String, media_root: std::path::PathBuf) -> UploadManager {
        let client = CatalogClient::new(&CatalogConfig {
            service_root,
            request_timeout_secs: 5,
        })
        .unwrap();
        UploadManager::new(
            Arc::new(client),
            UploadConfig {
                media_root,
                max_concurrent_uploads: 10,
                part_filter: Vec::new(),
                cleanup_after_upload: false,
            },
        )
    }

    #[tokio::test]
    async fn test_end_to_end_single_product() {
        // spec 场景：两个部件，A 待上传、B 目录侧已有图 → 恰好 1 个任务，1/1 成功
        let media = tempfile::tempdir().unwrap();
        write_render(media.path(), "variant_5/model_1/camera_1/part_a/oak.png");

        let root = spawn_mock_catalog().await;
        let manager = manager_for(root, media.path().to_path_buf());

        let reports = manager.run(&[5]).await;
        assert_eq!(reports.len(), 1);
        let report = reports[0].report.as_ref().unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.succeeded, 1);
        assert!(reports[0].is_success());
    }

    #[tokio::test]
    async fn test_snapshot_failure_does_not_abort_run() {
        // 失败的商品只影响自己，后面的商品照常处理
        let media = tempfile::tempdir().unwrap();
        write_render(media.path(), "variant_5/model_1/camera_1/part_a/oak.png");

        let root = spawn_mock_catalog().await;
        let manager = manager_for(root, media.path().to_path_buf());

        let reports = manager.run(&[404, 5]).await;
        assert_eq!(reports.len(), 2);
        assert!(!reports[0].is_success());
        assert!(reports[0].error.is_some());
        assert!(reports[1].is_success());
    }

    #[tokio::test]
    async fn test_no_pending_tasks() {
        // 本地没有任何渲染图 → 空批次，正常返回
        let media = tempfile::tempdir().unwrap();
        let root = spawn_mock_catalog().await;
        let manager = manager_for(root, media.path().to_path_buf());

        let reports = manager.run(&[5]).await;
        let report = reports[0].report.as_ref().unwrap();
        assert_eq!(report.total, 0);
    }

    #[tokio::test]
    async fn test_cleanup_after_full_success() {
        let media = tempfile::tempdir().unwrap();
        write_render(media.path(), "variant_5/model_1/camera_1/part_a/oak.png");

        let root = spawn_mock_catalog().await;
        let client = CatalogClient::new(&CatalogConfig {
            service_root: root,
            request_timeout_secs: 5,
        })
        .unwrap();
        let manager = UploadManager::new(
            Arc::new(client),
            UploadConfig {
                media_root: media.path().to_path_buf(),
                max_concurrent_uploads: 10,
                part_filter: Vec::new(),
                cleanup_after_upload: true,
            },
        );

        let reports = manager.run(&[5]).await;
        assert!(reports[0].is_success());
        assert!(!media.path().join("variant_5").exists());
    }
}
