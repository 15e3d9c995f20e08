// 应用状态

use crate::catalog::CatalogClient;
use crate::config::AppConfig;
use crate::uploader::{ProductReport, UploadManager};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 上传作业状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// 已创建，尚未开始
    Pending,
    /// 运行中
    Running,
    /// 已完成（逐商品结果见 reports）
    Completed,
}

/// 一次上传作业：对一组商品依次跑完整个上传管线
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadJob {
    /// 作业ID
    pub id: String,
    /// 待处理的商品ID列表
    pub product_ids: Vec<i64>,
    /// 作业状态
    pub status: JobStatus,
    /// 逐商品结果（完成前为空）
    pub reports: Vec<ProductReport>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 完成时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// 应用全局状态
#[derive(Clone)]
pub struct AppState {
    /// 上传管理器
    pub manager: Arc<UploadManager>,
    /// 作业注册表（进程内，不持久化）
    pub jobs: Arc<DashMap<String, UploadJob>>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = Arc::new(CatalogClient::new(&config.catalog)?);
        let manager = Arc::new(UploadManager::new(client, config.upload.clone()));
        Ok(Self {
            manager,
            jobs: Arc::new(DashMap::new()),
        })
    }

    /// 创建作业并在后台任务中执行，返回作业ID
    pub fn spawn_job(&self, product_ids: Vec<i64>) -> String {
        let job_id = Uuid::new_v4().to_string();
        let job = UploadJob {
            id: job_id.clone(),
            product_ids: product_ids.clone(),
            status: JobStatus::Pending,
            reports: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
        };
        self.jobs.insert(job_id.clone(), job);

        let state = self.clone();
        let id = job_id.clone();
        tokio::spawn(async move {
            if let Some(mut job) = state.jobs.get_mut(&id) {
                job.status = JobStatus::Running;
            }
            info!("上传作业开始: id={}, products={:?}", id, product_ids);

            let reports = state.manager.run(&product_ids).await;

            if let Some(mut job) = state.jobs.get_mut(&id) {
                job.reports = reports;
                job.status = JobStatus::Completed;
                job.finished_at = Some(Utc::now());
            }
            info!("上传作业完成: id={}", id);
        });

        job_id
    }

    /// 查询作业
    pub fn get_job(&self, job_id: &str) -> Option<UploadJob> {
        self.jobs.get(job_id).map(|j| j.clone())
    }

    /// 全部作业，按创建时间排序
    pub fn all_jobs(&self) -> Vec<UploadJob> {
        let mut jobs: Vec<UploadJob> = self.jobs.iter().map(|j| j.clone()).collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }
}
