// crates/sd_config/src/dot_config.rs

//! DotConfig - 梯度投影运行配置
//!
//! 一次运行的全部外部输入：投影方法、灵敏度记录文件、设计变量列表、
//! 并行策略、输出位置与 FD/AD 比较容差。

use sd_foundation::FdTolerance;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::design::DesignVariableSpec;
use crate::error::ConfigError;
use crate::method::ProjectionMethod;

/// 梯度投影运行配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DotConfig {
    /// 投影方法
    #[serde(default)]
    pub method: ProjectionMethod,

    /// 灵敏度记录文件
    pub sensitivity_file: PathBuf,

    /// 设计变量（顺序即输出顺序）
    #[serde(default)]
    pub design_variables: Vec<DesignVariableSpec>,

    /// 并行配置
    #[serde(default)]
    pub parallel: ParallelConfig,

    /// 输出配置
    #[serde(default)]
    pub output: OutputConfig,

    /// FD/AD 比较容差
    #[serde(default)]
    pub tolerance: FdTolerance,
}

/// 并行策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParallelStrategy {
    /// 串行执行
    Sequential,
    /// 总是并行
    Parallel,
    /// 根据任务数自动选择
    #[default]
    Auto,
}

/// 并行配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// 并行策略
    #[serde(default)]
    pub strategy: ParallelStrategy,

    /// `Auto` 模式下启用并行的最小任务数
    #[serde(default = "default_min_parallel_size")]
    pub min_parallel_size: usize,
}

fn default_min_parallel_size() -> usize { 4 }

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            strategy: ParallelStrategy::default(),
            min_parallel_size: default_min_parallel_size(),
        }
    }
}

impl ParallelConfig {
    /// 串行配置
    pub fn sequential() -> Self {
        Self {
            strategy: ParallelStrategy::Sequential,
            ..Self::default()
        }
    }

    /// 给定任务数时是否并行
    pub fn should_parallelize(&self, n_tasks: usize) -> bool {
        match self.strategy {
            ParallelStrategy::Sequential => false,
            ParallelStrategy::Parallel => n_tasks > 1,
            ParallelStrategy::Auto => n_tasks >= self.min_parallel_size.max(2),
        }
    }
}

/// 梯度报告格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// 定宽文本表
    #[default]
    Table,
    /// CSV
    Csv,
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 梯度文件
    #[serde(default = "default_gradient_file")]
    pub gradient_file: PathBuf,

    /// 梯度文件格式
    #[serde(default)]
    pub format: ReportFormat,

    /// 表面灵敏度 CSV（可选）
    #[serde(default)]
    pub surface_file: Option<PathBuf>,
}

fn default_gradient_file() -> PathBuf { PathBuf::from("of_grad.dat") }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            gradient_file: default_gradient_file(),
            format: ReportFormat::default(),
            surface_file: None,
        }
    }
}

impl DotConfig {
    /// 以灵敏度文件和设计变量创建配置
    pub fn new(sensitivity_file: impl Into<PathBuf>, design_variables: Vec<DesignVariableSpec>) -> Self {
        Self {
            method: ProjectionMethod::default(),
            sensitivity_file: sensitivity_file.into(),
            design_variables,
            parallel: ParallelConfig::default(),
            output: OutputConfig::default(),
            tolerance: FdTolerance::default(),
        }
    }

    /// 从 JSON 文件加载配置
    ///
    /// 配置中的相对路径以配置文件所在目录为基准。
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        let mut config: DotConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        config.validate()?;
        Ok(config)
    }

    /// 将相对路径解析到 `base` 下
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.sensitivity_file);
        resolve(&mut self.output.gradient_file);
        if let Some(surface) = self.output.surface_file.as_mut() {
            resolve(surface);
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensitivity_file.as_os_str().is_empty() {
            return Err(ConfigError::Missing("sensitivity_file".to_string()));
        }

        if self.design_variables.is_empty() {
            return Err(ConfigError::Missing("design_variables".to_string()));
        }

        for (i, dv) in self.design_variables.iter().enumerate() {
            dv.validate(i)?;
        }

        let tol = &self.tolerance;
        if !(tol.truncation_factor > 0.0) || !(tol.roundoff_factor >= 0.0) {
            return Err(ConfigError::invalid(
                "tolerance",
                format!("{}/{}", tol.truncation_factor, tol.roundoff_factor),
                "截断系数必须为正，舍入系数不能为负",
            ));
        }

        Ok(())
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }
}
