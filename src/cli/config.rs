//! `autogroup config` 命令 - 打印生效的配置

use anyhow::Result;
use clap::Args;

use crate::config::AutogroupConfig;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

pub fn handle_config(args: ConfigArgs) -> Result<()> {
    let path = AutogroupConfig::path();
    let config = AutogroupConfig::load_from(&path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("配置文件: {}", path.display());
        println!("  threshold: {}", config.threshold);
        println!("  log_summary_calls: {}", config.log_summary_calls);
    }

    Ok(())
}
