//! `autogroup replay` 命令 - 把事件轨迹送入自动分组服务并打印回调

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::AutogroupConfig;
use crate::notification::{
    AutogroupPolicy, AutogroupService, GroupState, PackageKey, RecordingSink, SinkCall, TracingSink,
};
use crate::trace::{check_ordering, final_states, read_trace};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// 事件轨迹文件（JSONL）
    pub file: PathBuf,
    /// 覆盖配置中的阈值
    #[arg(long)]
    pub threshold: Option<usize>,
    /// 按 JSONL 输出回调
    #[arg(long)]
    pub json: bool,
}

/// replay 结果
#[derive(Debug)]
pub struct ReplayReport {
    pub threshold: usize,
    pub events: usize,
    /// 同一 package 内时间戳倒退的事件数
    pub out_of_order: usize,
    pub calls: Vec<SinkCall>,
    pub states: Vec<(PackageKey, GroupState)>,
}

/// 构建人类可读的 replay 输出（纯函数，便于测试）
pub fn build_replay_message(report: &ReplayReport) -> String {
    let mut msg = format!(
        "Replayed {} events (threshold {})\n{} callback calls",
        report.events,
        report.threshold,
        report.calls.len()
    );

    if report.out_of_order > 0 {
        msg.push_str(&format!(
            "\n⚠️ {} events out of order for their package",
            report.out_of_order
        ));
    }

    if !report.calls.is_empty() {
        msg.push('\n');
        for call in &report.calls {
            msg.push_str(&format!("\n  {}", call));
        }
    }

    if !report.states.is_empty() {
        msg.push_str("\n\nFinal state:");
        for (package, state) in &report.states {
            msg.push_str(&format!("\n  {} → {}", package, state));
        }
    }

    msg
}

/// 通过 `AutogroupService` 回放轨迹
pub async fn run_replay(path: &Path, threshold: usize, log_calls: bool) -> Result<ReplayReport> {
    if threshold == 0 {
        bail!("threshold must be at least 1");
    }

    let events = read_trace(path)?;
    let out_of_order = check_ordering(&events);
    if out_of_order > 0 {
        warn!(out_of_order, "Trace has events out of order, replaying in file order");
    }

    let tracing_sink = log_calls.then_some(TracingSink);
    let policy =
        AutogroupPolicy::new((RecordingSink::new(), tracing_sink)).with_threshold(threshold);
    let (handle, task) = AutogroupService::spawn(policy);

    for event in &events {
        if !handle.send(event.clone()) {
            bail!("autogroup service stopped before replay finished");
        }
    }
    handle.shutdown();

    let policy = task.await.context("Autogroup service task failed")?;
    let states = final_states(&events, &policy);
    let (mut recording, _) = policy.into_callback();

    info!(events = events.len(), calls = recording.calls().len(), "Replay finished");

    Ok(ReplayReport {
        threshold,
        events: events.len(),
        out_of_order,
        calls: recording.take(),
        states,
    })
}

/// 执行 replay 命令
pub async fn handle_replay(args: ReplayArgs) -> Result<()> {
    let config = AutogroupConfig::load()?;
    let threshold = args.threshold.unwrap_or(config.threshold);

    let report = run_replay(&args.file, threshold, config.log_summary_calls).await?;

    if args.json {
        for call in &report.calls {
            println!("{}", serde_json::to_string(call)?);
        }
    } else {
        println!("{}", build_replay_message(&report));
    }

    Ok(())
}
