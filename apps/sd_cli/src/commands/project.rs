// apps/sd_cli/src/commands/project.rs

//! 梯度投影命令

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use sd_config::ProjectionMethod;
use sd_projection::{GradientReporter, ParametricDeformer, Projector};
use sd_sensitivity::SurfaceCsvExporter;
use tracing::info;

use super::Session;

/// 投影参数
#[derive(Args)]
pub struct ProjectArgs {
    /// 配置文件路径 (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// 覆盖配置中的投影方法 (fd, ad)
    #[arg(short, long)]
    pub method: Option<ProjectionMethod>,

    /// 覆盖配置中的梯度文件路径
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// 执行投影命令
pub fn execute(args: ProjectArgs) -> Result<()> {
    info!("=== SensDot 梯度投影 ===");
    let start = Instant::now();

    let Session {
        config,
        store,
        variables,
    } = Session::load(&args.config)
        .with_context(|| format!("加载失败: {}", args.config.display()))?;

    let method = args.method.unwrap_or(config.method);
    info!("投影方法: {}", method);

    let projector = Projector::from_method(method, config.parallel);
    let deformer = ParametricDeformer::new(&store);
    let gradient = projector
        .project(&variables, &store, &deformer)
        .with_context(|| format!("{} 投影失败", method))?;

    let gradient_file = args.output.unwrap_or(config.output.gradient_file);
    GradientReporter::new(config.output.format, method)
        .write_file(&gradient_file, &gradient, &variables)
        .with_context(|| format!("写出梯度报告失败: {}", gradient_file.display()))?;

    if let Some(surface_file) = &config.output.surface_file {
        SurfaceCsvExporter::new()
            .export(surface_file, &store)
            .with_context(|| format!("导出表面灵敏度失败: {}", surface_file.display()))?;
    }

    info!("=== 投影完成, 耗时 {:.2?} ===", start.elapsed());
    Ok(())
}
