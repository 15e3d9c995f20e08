// 上传任务定义

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 上传任务描述
///
/// 由任务发现阶段一次性构造，执行器消费一次，全程不可变。
/// 构造时 `file_path` 必须指向一个已存在的渲染图（由发现阶段保证）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadTask {
    /// 材质槽位ID（上传时作为 scene_material 提交）
    pub material_id: i64,
    /// 渲染图的本地绝对路径
    pub file_path: PathBuf,
    /// 商品变体ID（仅用于日志）
    pub variant_id: i64,
    /// 模型序号，1-based（仅用于日志）
    pub model_index: usize,
    /// 相机序号，1-based（仅用于日志）
    pub camera_index: usize,
    /// 部件名称
    pub part_name: String,
    /// 材质序号，1-based（用于进度显示）
    pub material_index: usize,
    /// 该部件的材质总数（用于进度显示）
    pub total_materials: usize,
    /// 该模型的相机总数（用于进度显示）
    pub total_cameras: usize,
}

impl UploadTask {
    /// 渲染图文件名（不含路径）
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// 单次上传的结果
///
/// 每个任务恰好产生一个结果，成功或失败；管线内部不做自动重试
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    /// 对应的任务
    pub task: UploadTask,
    /// 是否成功（HTTP 200）
    pub success: bool,
    /// 服务端返回的状态码（传输层失败时为 None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// 失败原因
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadOutcome {
    /// 成功结果
    pub fn success(task: UploadTask) -> Self {
        Self {
            task,
            success: true,
            status_code: Some(200),
            error: None,
        }
    }

    /// 服务端拒绝（非 200 状态码）
    pub fn rejected(task: UploadTask, status_code: u16) -> Self {
        Self {
            task,
            success: false,
            status_code: Some(status_code),
            error: Some(format!("服务端返回状态码 {}", status_code)),
        }
    }

    /// 本地或传输层失败
    pub fn failed(task: UploadTask, error: String) -> Self {
        Self {
            task,
            success: false,
            status_code: None,
            error: Some(error),
        }
    }
}

/// 一批上传完成后的汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// 任务总数
    pub total: usize,
    /// 成功数
    pub succeeded: usize,
    /// 批次耗时（秒）
    pub elapsed_secs: f64,
}

impl BatchReport {
    /// 是否全部成功
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}
