// 上传执行器
//
// 一次调用做一次上传尝试，把所有失败形态（文件读取、传输层、非200状态码）
// 吞成 UploadOutcome，绝不向上抛错中断批次。重试与否由上层决定。

use crate::catalog::{CatalogClient, CatalogError};
use crate::uploader::{UploadOutcome, UploadTask};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// 上传执行接口
///
/// 批次协调器只依赖这个 trait，测试时用插桩实现替换真实 HTTP 上传
#[async_trait]
pub trait ExecuteUpload: Send + Sync {
    /// 对单个任务做一次上传尝试
    async fn upload(&self, task: &UploadTask) -> UploadOutcome;
}

/// 基于目录服务客户端的真实上传执行器
#[derive(Debug, Clone)]
pub struct HttpUploadExecutor {
    client: Arc<CatalogClient>,
}

impl HttpUploadExecutor {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExecuteUpload for HttpUploadExecutor {
    async fn upload(&self, task: &UploadTask) -> UploadOutcome {
        debug!(
            "开始上传: scene_material={}, file={:?}",
            task.material_id, task.file_path
        );

        match self
            .client
            .upload_scene_material(task.material_id, &task.file_path)
            .await
        {
            Ok(()) => UploadOutcome::success(task.clone()),
            Err(CatalogError::UploadRejected { status }) => {
                warn!(
                    "上传被拒绝: scene_material={}, file={:?}, status={}",
                    task.material_id, task.file_path, status
                );
                UploadOutcome::rejected(task.clone(), status)
            }
            Err(e) => {
                warn!(
                    "上传失败: scene_material={}, file={:?}, 原因: {}",
                    task.material_id, task.file_path, e
                );
                UploadOutcome::failed(task.clone(), e.to_string())
            }
        }
    }
}
