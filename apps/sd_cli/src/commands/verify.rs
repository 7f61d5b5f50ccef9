// apps/sd_cli/src/commands/verify.rs

//! FD/AD 校验命令
//!
//! 对同一组设计变量分别运行两种投影，按步长相关容差比较。

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use sd_config::ProjectionMethod;
use sd_projection::{GradientComparison, ParametricDeformer, Projector};
use tracing::{info, warn};

use super::Session;

/// 校验参数
#[derive(Args)]
pub struct VerifyArgs {
    /// 配置文件路径 (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// 以 JSON 输出比较结果
    #[arg(long)]
    pub json: bool,
}

/// 执行校验命令
pub fn execute(args: VerifyArgs) -> Result<()> {
    info!("=== SensDot FD/AD 校验 ===");

    let session = Session::load(&args.config)
        .with_context(|| format!("加载失败: {}", args.config.display()))?;
    let deformer = ParametricDeformer::new(&session.store);

    let run = |method: ProjectionMethod| {
        Projector::from_method(method, session.config.parallel)
            .project(&session.variables, &session.store, &deformer)
            .with_context(|| format!("{} 投影失败", method))
    };
    let fd = run(ProjectionMethod::FiniteDifference)?;
    let ad = run(ProjectionMethod::Algorithmic)?;

    let comparison =
        GradientComparison::compare(&fd, &ad, &session.variables, &session.config.tolerance)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print!("{}", comparison.to_table());
    }

    let failures = comparison.failures().count();
    if failures > 0 {
        for row in comparison.failures() {
            warn!(
                "设计变量 {} 超出容差: |FD - AD| = {:.3e} > {:.3e}",
                row.variable,
                row.difference(),
                row.bound
            );
        }
        bail!("{} 个设计变量的 FD/AD 偏差超出容差", failures);
    }

    info!(
        "全部 {} 个设计变量通过, 最大偏差 {:.3e}",
        comparison.rows().len(),
        comparison.max_difference()
    );
    Ok(())
}
