use anyhow::Result;
use clap::{Parser, Subcommand};
use render_uploader::{config::AppConfig, logging, server, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// 渲染图上传服务
///
/// 把本地渲染输出批量上传到商品目录服务，支持一次性批处理和常驻服务两种模式
#[derive(Debug, Parser)]
#[command(name = "render-uploader", version)]
struct Cli {
    /// 配置文件路径
    #[arg(long, default_value = "config/app.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 对指定商品跑一次上传批处理后退出
    Run {
        /// 商品ID列表，逗号分隔，例如 --ids 12,13,15
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<i64>,
    },
    /// 以 Web 服务方式常驻，作业通过 HTTP 接口提交
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config).await;

    // 日志守卫必须保持存活直到程序结束
    let _log_guard = logging::init_logging(&config.log);
    info!("render-uploader 启动中, 目录服务: {}", config.catalog.service_root);

    match cli.command {
        Command::Run { ids } => run_once(&config, &ids).await,
        Command::Serve => serve(&config).await,
    }
}

/// 批处理模式：顺序处理每个商品，全部结束后退出
async fn run_once(config: &AppConfig, ids: &[i64]) -> Result<()> {
    use render_uploader::{CatalogClient, UploadManager};

    let client = Arc::new(CatalogClient::new(&config.catalog)?);
    let manager = UploadManager::new(client, config.upload.clone());

    let reports = manager.run(ids).await;

    let mut failed = 0;
    for report in &reports {
        match (&report.report, &report.error) {
            (Some(batch), None) => info!(
                "商品 {}: {}/{} 上传成功, 耗时 {:.1}s",
                report.product_id, batch.succeeded, batch.total, batch.elapsed_secs
            ),
            (_, Some(e)) => {
                error!("商品 {}: 处理失败: {}", report.product_id, e);
                failed += 1;
            }
            _ => {}
        }
    }

    if failed > 0 {
        anyhow::bail!("{} 个商品处理失败", failed);
    }
    Ok(())
}

/// 服务模式：启动 axum，等待 Ctrl+C 优雅退出
async fn serve(config: &AppConfig) -> Result<()> {
    let state = AppState::new(config)?;
    let app = server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("服务器启动在: http://{}", addr);
    info!("API 基础路径: http://{}/api/v1", addr);
    info!("健康检查: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("服务器错误: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("收到 Ctrl+C，开始关闭...");
        }
    }

    info!("应用已安全退出");
    Ok(())
}
