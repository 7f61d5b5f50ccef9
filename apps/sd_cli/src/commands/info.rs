// apps/sd_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示灵敏度记录中每个分区的概要。

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sd_sensitivity::SensitivityFileReader;
use tracing::info;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 灵敏度记录文件
    #[arg(short, long)]
    pub sensitivity: PathBuf,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== SensDot 信息 ===");

    let store = SensitivityFileReader::read_file(&args.sensitivity)
        .with_context(|| format!("读取灵敏度记录失败: {}", args.sensitivity.display()))?;
    let summary = store.summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("=== 灵敏度记录 ===");
    println!("文件: {}", args.sensitivity.display());
    println!("分区数: {}", store.n_zones());
    for zone in &summary {
        println!();
        println!("zone {} ({}D)", zone.zone, zone.dim);
        let markers = if zone.markers.is_empty() {
            "-".to_string()
        } else {
            zone.markers.join(", ")
        };
        println!("  边界标记: {}", markers);
        println!(
            "  表面节点: {} (灵敏度 {} 个)",
            zone.n_surface_nodes, zone.n_surface_values
        );
        println!(
            "  体节点:   {} (灵敏度 {} 个)",
            zone.n_volume_nodes, zone.n_volume_values
        );
    }
    Ok(())
}
