//! Notification Autogroup CLI
//!
//! 回放通知事件轨迹，查看自动分组引擎的决策

use anyhow::Result;
use clap::{Parser, Subcommand};
use notification_autogroup::cli::{handle_config, handle_replay, ConfigArgs, ReplayArgs};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "autogroup")]
#[command(about = "Notification autogroup - 回放通知事件并查看自动分组决策")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 回放 JSONL 事件轨迹并打印回调调用
    Replay(ReplayArgs),
    /// 打印生效的配置
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug autogroup replay trace.jsonl
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notification_autogroup=info,autogroup=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(args) => handle_replay(args).await?,
        Commands::Config(args) => handle_config(args)?,
    }

    Ok(())
}
