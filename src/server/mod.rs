// Web服务模块
//
// 把上传作业包装成 HTTP 接口：POST 创建作业拿到 job_id，
// GET 轮询作业状态和逐商品结果。作业在进程内异步执行，不落盘。

pub mod handlers;
pub mod state;

pub use state::{AppState, JobStatus, UploadJob};

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// 构建完整的路由
pub fn build_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let api_routes = Router::new()
        .route("/upload-jobs", post(handlers::create_job))
        .route("/upload-jobs", get(handlers::get_all_jobs))
        .route("/upload-jobs/:id", get(handlers::get_job))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(handlers::health_check))
        .layer(middleware)
}
