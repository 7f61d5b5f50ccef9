// apps/sd_cli/src/main.rs

//! SensDot 命令行界面
//!
//! 把伴随求解器输出的表面灵敏度投影为设计变量梯度。
//!
//! # 架构层级
//!
//! 本模块属于 **Layer 5: Application**：
//! - 投影策略只在这里由配置（或 `--method`）选定一次
//! - 库层错误在这里统一转为 `anyhow::Error` 并附加上下文

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// SensDot 灵敏度投影命令行工具
#[derive(Parser)]
#[command(name = "sd_cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Project surface sensitivities onto design-variable gradients", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 投影梯度并写出报告
    Project(commands::project::ProjectArgs),
    /// 同时运行 FD 与 AD 并比较
    Verify(commands::verify::VerifyArgs),
    /// 显示灵敏度记录概要
    Info(commands::info::InfoArgs),
    /// 导出表面灵敏度 CSV
    Export(commands::export::ExportArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Project(args) => commands::project::execute(args),
        Commands::Verify(args) => commands::verify::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Export(args) => commands::export::execute(args),
    }
}
