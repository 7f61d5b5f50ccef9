// apps/sd_cli/src/commands/export.rs

//! 表面灵敏度导出命令

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sd_sensitivity::{SensitivityFileReader, SurfaceCsvExporter};
use tracing::info;

/// 导出参数
#[derive(Args)]
pub struct ExportArgs {
    /// 灵敏度记录文件
    #[arg(short, long)]
    pub sensitivity: PathBuf,

    /// 输出 CSV 文件
    #[arg(short, long, default_value = "surface_sens.csv")]
    pub output: PathBuf,

    /// 小数位数
    #[arg(long, default_value = "10")]
    pub precision: usize,

    /// 只导出有显式灵敏度值的节点
    #[arg(long)]
    pub skip_missing: bool,
}

/// 执行导出命令
pub fn execute(args: ExportArgs) -> Result<()> {
    let store = SensitivityFileReader::read_file(&args.sensitivity)
        .with_context(|| format!("读取灵敏度记录失败: {}", args.sensitivity.display()))?;

    let rows = SurfaceCsvExporter::new()
        .precision(args.precision)
        .skip_missing(args.skip_missing)
        .export(&args.output, &store)
        .with_context(|| format!("导出失败: {}", args.output.display()))?;

    info!("已导出 {} 个表面节点 -> {}", rows, args.output.display());
    Ok(())
}
