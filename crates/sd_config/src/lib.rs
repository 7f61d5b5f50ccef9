// crates/sd_config/src/lib.rs

//! SensDot Config Layer (Layer 2)
//!
//! 配置层，提供投影方法选择、设计变量配置与运行配置。
//!
//! # 模块概览
//!
//! - [`method`]: ProjectionMethod 枚举（FD/AD）
//! - [`design`]: 设计变量类型与配置项
//! - [`dot_config`]: DotConfig 运行配置（JSON）
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: sd_cli          ─> uses DotConfig
//! Layer 4: sd_projection   ─> DesignVariable::from_spec, Projector::from_method
//! Layer 3: sd_sensitivity
//! Layer 2: sd_config       ─> ProjectionMethod, DotConfig (本层)
//! Layer 1: sd_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod design;
pub mod dot_config;
pub mod error;
pub mod method;

// 重导出核心类型
pub use design::{DesignVariableSpec, DvKind};
pub use dot_config::{DotConfig, OutputConfig, ParallelConfig, ParallelStrategy, ReportFormat};
pub use error::ConfigError;
pub use method::ProjectionMethod;
