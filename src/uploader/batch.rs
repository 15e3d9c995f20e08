// 批次协调器
//
// 并发上传策略（沿用分片上传的模式）：
// - 使用 Semaphore 限制同时在途的上传数
// - 使用 JoinSet 管理并发任务，全部任务启动后统一收束（fan-out / fan-in）
// - 原子计数器追踪活跃数和完成数，用于进度日志
//
// 获取许可 → 执行上传 → 释放许可是并发的基本单元；许可的释放不看成败，
// 只关心占用。单个任务失败不影响同批次其他任务，也不会提前终止批次。
// 结果按任务的启动顺序排列，数量恒等于任务数。

use crate::uploader::{BatchReport, ExecuteUpload, UploadOutcome, UploadTask};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

/// 默认最大并发上传数
pub const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 10;

/// 一个批次跑完后的结果
#[derive(Debug)]
pub struct BatchResult {
    /// 逐任务结果，顺序与提交顺序一致
    pub outcomes: Vec<UploadOutcome>,
    /// 汇总
    pub report: BatchReport,
}

/// 批次协调器
///
/// 一个商品变体的全部上传任务构成一个批次；批次内并发上限为
/// `max_concurrent`，不同批次之间永不交错（由上层顺序调用保证）。
pub struct BatchCoordinator<E> {
    /// 上传执行器
    executor: Arc<E>,
    /// 批次内最大并发数
    max_concurrent: usize,
}

impl<E: ExecuteUpload + 'static> BatchCoordinator<E> {
    /// 创建批次协调器
    ///
    /// `max_concurrent` 为 0 时按 1 处理，避免信号量饿死整个批次
    pub fn new(executor: Arc<E>, max_concurrent: usize) -> Self {
        Self {
            executor,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// 跑完一个批次
    ///
    /// 所有任务立刻全部提交；超出并发上限的任务挂起等待许可。
    /// 协调器等到每个任务都有结果才返回，失败的任务在结果里占位，
    /// 不会被丢掉。
    pub async fn run_batch(&self, tasks: Vec<UploadTask>) -> BatchResult {
        let total = tasks.len();
        let started = Instant::now();

        if total == 0 {
            info!("批次为空，无待上传任务");
            return BatchResult {
                outcomes: Vec::new(),
                report: BatchReport {
                    total: 0,
                    succeeded: 0,
                    elapsed_secs: 0.0,
                },
            };
        }

        info!(
            "[批量上传] 开始: {} 个任务, 并发上限 {}",
            total, self.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let active = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));
        let tasks = Arc::new(tasks);

        let mut join_set: JoinSet<(usize, UploadOutcome)> = JoinSet::new();

        for index in 0..total {
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            let active = Arc::clone(&active);
            let completed = Arc::clone(&completed);
            let task = tasks[index].clone();

            join_set.spawn(async move {
                // 信号量在进程生命周期内不会被关闭
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");

                let now_active = active.fetch_add(1, Ordering::SeqCst) + 1;
                let done = completed.load(Ordering::SeqCst);
                info!(
                    "[批量上传] {:.1}% ({}/{}), 活跃 {}, 已耗时 {:.1}s, 当前文件: {}",
                    done as f64 / total as f64 * 100.0,
                    done,
                    total,
                    now_active,
                    started.elapsed().as_secs_f64(),
                    task.file_name()
                );

                let outcome = executor.upload(&task).await;

                active.fetch_sub(1, Ordering::SeqCst);
                completed.fetch_add(1, Ordering::SeqCst);

                (index, outcome)
                // _permit 在此释放，无论成败
            });
        }

        // 收束：按提交顺序归位结果
        let mut slots: Vec<Option<UploadOutcome>> = (0..total).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => {
                    // 任务 panic：对应槽位留空，下面统一补失败结果
                    error!("上传任务异常退出: {}", e);
                }
            }
        }

        let outcomes: Vec<UploadOutcome> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    UploadOutcome::failed(tasks[index].clone(), "上传任务异常退出".to_string())
                })
            })
            .collect();

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        let elapsed_secs = started.elapsed().as_secs_f64();

        for outcome in outcomes.iter().filter(|o| !o.success) {
            error!(
                "上传失败: file={:?}, 原因: {}",
                outcome.task.file_path,
                outcome.error.as_deref().unwrap_or("未知")
            );
        }
        info!(
            "[批量上传] 完成: {}/{} 成功, 耗时 {:.1}s",
            succeeded, total, elapsed_secs
        );

        BatchResult {
            outcomes,
            report: BatchReport {
                total,
                succeeded,
                elapsed_secs,
            },
        }
    }
}
