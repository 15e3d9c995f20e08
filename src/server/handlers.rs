// API处理器

use crate::server::state::{AppState, UploadJob};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// 统一响应封装
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// 状态码 (0: 成功, 其他: 错误码)
    pub code: i32,
    /// 消息
    pub message: String,
    /// 数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "Success".to_string(),
            data: Some(data),
        }
    }
}

/// 创建上传作业请求
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    /// 待处理的商品ID列表
    pub product_ids: Vec<i64>,
}

/// 创建上传作业响应
#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    /// 作业ID
    pub job_id: String,
}

/// POST /api/v1/upload-jobs
/// 创建上传作业，作业在后台异步执行
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<Json<ApiResponse<CreateJobResponse>>, StatusCode> {
    if req.product_ids.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let job_id = state.spawn_job(req.product_ids);
    info!("创建上传作业成功: {}", job_id);
    Ok(Json(ApiResponse::success(CreateJobResponse { job_id })))
}

/// GET /api/v1/upload-jobs
/// 获取所有作业
pub async fn get_all_jobs(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<UploadJob>>> {
    Json(ApiResponse::success(state.all_jobs()))
}

/// GET /api/v1/upload-jobs/:id
/// 查询作业状态和逐商品结果
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ApiResponse<UploadJob>>, StatusCode> {
    match state.get_job(&job_id) {
        Some(job) => Ok(Json(ApiResponse::success(job))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "render-uploader".to_string(),
    })
}
