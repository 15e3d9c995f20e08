// 上传管线模块
//
// 核心流程：任务发现 → 并发受限的批次上传 → 结果汇总
// - 任务发现对照快照和本地渲染输出，产出不可变的任务描述
// - 执行器一次调用一次尝试，失败吞成结果，不中断批次
// - 批次协调器用 Semaphore + JoinSet 做 fan-out / fan-in
// - 管理器按商品顺序驱动整个流程

pub mod batch;
pub mod discovery;
pub mod executor;
pub mod manager;
pub mod task;

pub use batch::{BatchCoordinator, BatchResult, DEFAULT_MAX_CONCURRENT_UPLOADS};
pub use discovery::{discover, expected_relative_path};
pub use executor::{ExecuteUpload, HttpUploadExecutor};
pub use manager::{ProductReport, UploadManager};
pub use task::{BatchReport, UploadOutcome, UploadTask};
