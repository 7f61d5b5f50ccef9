// crates/sd_projection/src/error.rs
//! 投影错误类型
//!
//! 所有错误对当前优化迭代都是致命的：不重试，也不输出部分梯度表。

use sd_config::ConfigError;
use sd_foundation::{SdError, ZoneIndex};
use sd_sensitivity::SensitivityError;
use thiserror::Error;

/// 投影模块结果类型
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// 投影错误枚举
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// FD 步长非正或非有限
    #[error("无效步长: 设计变量 {variable} 的步长 {step} 必须为正有限值")]
    InvalidStep { variable: usize, step: f64 },

    /// 场与网格维度不符
    #[error("维度不匹配: {context} 期望 {expected} 个分量, 实际 {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// 同一 (设计变量, 分区) 出现多次贡献
    #[error("重复贡献: 设计变量 {variable} 在 zone {zone} 上已有梯度")]
    DuplicateContribution { variable: usize, zone: ZoneIndex },

    /// 引用的分区不存在
    #[error("分区不存在: zone {zone} (共 {n_zones} 个分区)")]
    MissingZone { zone: ZoneIndex, n_zones: usize },

    /// 变形器返回的节点或变量少于请求
    #[error("变形器响应不完整: {context} 期望 {expected}, 实际 {actual}")]
    IncompleteDeformerResponse {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// 设计变量定义无效
    #[error("无效设计变量 {variable}: {reason}")]
    InvalidVariable { variable: usize, reason: String },

    /// 梯度条目引用了不存在的设计变量
    #[error("未知设计变量: 索引 {variable} (共 {n_variables} 个)")]
    UnknownVariable { variable: usize, n_variables: usize },

    /// 灵敏度存储错误
    #[error("灵敏度错误: {0}")]
    Sensitivity(SensitivityError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl ProjectionError {
    /// 无效设计变量
    pub fn invalid_variable(variable: usize, reason: impl Into<String>) -> Self {
        Self::InvalidVariable {
            variable,
            reason: reason.into(),
        }
    }

    /// 变形器响应不完整
    pub fn incomplete(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::IncompleteDeformerResponse {
            context: context.into(),
            expected,
            actual,
        }
    }
}

/// 维度与分区错误原样提升，其余包装
impl From<SensitivityError> for ProjectionError {
    fn from(err: SensitivityError) -> Self {
        match err {
            SensitivityError::DimensionMismatch { context, expected, actual } => {
                Self::DimensionMismatch { context, expected, actual }
            }
            SensitivityError::MissingZone { zone, n_zones } => Self::MissingZone { zone, n_zones },
            other => Self::Sensitivity(other),
        }
    }
}

impl From<ProjectionError> for SdError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::InvalidStep { variable, step } => SdError::invalid_config(
                format!("design_variables[{variable}].step"),
                step.to_string(),
                "FD 步长必须为正有限值",
            ),
            ProjectionError::DimensionMismatch { context, expected, actual } => {
                SdError::validation(format!("维度不匹配 [{context}]: 期望 {expected}, 实际 {actual}"))
            }
            ProjectionError::MissingZone { zone, n_zones } => {
                SdError::index_out_of_bounds("Zone", zone.as_usize(), n_zones)
            }
            ProjectionError::UnknownVariable { variable, n_variables } => {
                SdError::index_out_of_bounds("DesignVariable", variable, n_variables)
            }
            ProjectionError::Sensitivity(e) => e.into(),
            ProjectionError::Config(e) => e.into(),
            ProjectionError::Io(e) => SdError::from(e),
            other => SdError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lift_missing_zone() {
        let err: ProjectionError = SensitivityError::MissingZone {
            zone: ZoneIndex::new(3),
            n_zones: 1,
        }
        .into();
        assert!(matches!(err, ProjectionError::MissingZone { n_zones: 1, .. }));
    }

    #[test]
    fn test_lift_dimension_mismatch() {
        let err: ProjectionError = SensitivityError::dimension_mismatch("coords", 3, 2).into();
        assert!(matches!(
            err,
            ProjectionError::DimensionMismatch { expected: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn test_other_errors_wrapped() {
        let err: ProjectionError = SensitivityError::format(4, "bad").into();
        assert!(matches!(err, ProjectionError::Sensitivity(_)));
    }

    #[test]
    fn test_invalid_step_message() {
        let err = ProjectionError::InvalidStep { variable: 2, step: 0.0 };
        assert!(err.to_string().contains("设计变量 2"));
    }

    #[test]
    fn test_into_foundation_error() {
        let err: SdError = ProjectionError::InvalidStep { variable: 1, step: -1.0 }.into();
        assert!(matches!(err, SdError::InvalidConfig { .. }));

        let err: SdError = ProjectionError::from(SensitivityError::format(7, "bad")).into();
        assert!(matches!(err, SdError::Parse { line: 7, .. }));

        let err: SdError = ProjectionError::UnknownVariable { variable: 9, n_variables: 2 }.into();
        assert!(matches!(err, SdError::IndexOutOfBounds { index: 9, len: 2, .. }));
    }
}
