// Render Uploader
// 渲染图上传服务核心库

// 配置管理模块
pub mod config;

// 日志模块
pub mod logging;

// 商品目录服务模块
pub mod catalog;

// 上传管线模块
pub mod uploader;

// Web服务模块
pub mod server;

// 导出常用类型
pub use catalog::{CatalogClient, CatalogError, ProductSnapshot, SceneMaterial};
pub use config::AppConfig;
pub use server::{AppState, JobStatus, UploadJob};
pub use uploader::{
    BatchCoordinator, BatchReport, BatchResult, ExecuteUpload, HttpUploadExecutor,
    ProductReport, UploadManager, UploadOutcome, UploadTask,
};
