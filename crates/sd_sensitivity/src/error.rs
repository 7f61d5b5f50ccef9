// crates/sd_sensitivity/src/error.rs
//! 灵敏度存储错误类型
//!
//! 覆盖上游求解器边界的校验失败（维度、分区、节点）与灵敏度记录文件的格式错误。
//! 所有错误可转换为 `SdError` 向上传播。

use sd_foundation::{SdError, ZoneIndex};
use thiserror::Error;

/// 灵敏度模块结果类型
pub type SensResult<T> = Result<T, SensitivityError>;

/// 灵敏度错误枚举
#[derive(Error, Debug)]
pub enum SensitivityError {
    /// 向量分量数与分区几何维度不符
    #[error("维度不匹配: {context} 期望 {expected} 个分量, 实际 {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// 引用的分区不存在
    #[error("分区不存在: zone {zone} (共 {n_zones} 个分区)")]
    MissingZone { zone: ZoneIndex, n_zones: usize },

    /// 灵敏度场中的节点不属于该分区
    #[error("未知节点: zone {zone} 中 {kind} 节点 {node} 超出范围 0..{len}")]
    UnknownNode {
        zone: ZoneIndex,
        kind: &'static str,
        node: u32,
        len: usize,
    },

    /// 未知边界标记
    #[error("未知边界标记: zone {zone} 中不存在 '{name}'")]
    UnknownMarker { zone: ZoneIndex, name: String },

    /// 边界标记名无法原样写入记录
    #[error("无效的边界标记名: zone {zone} 中 {name:?}")]
    InvalidMarkerName { zone: ZoneIndex, name: String },

    /// 调用方给出的分区数与存储不一致
    #[error("分区数不匹配: 期望 {expected}, 存储中有 {actual}")]
    ZoneCountMismatch { expected: usize, actual: usize },

    /// 记录文件格式错误
    #[error("灵敏度记录格式错误: 第{line}行: {message}")]
    Format { line: usize, message: String },

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 基础层错误
    #[error("基础层错误: {0}")]
    Foundation(#[from] SdError),
}

impl SensitivityError {
    /// 维度不匹配
    pub fn dimension_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// 格式错误
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }
}

impl From<SensitivityError> for SdError {
    fn from(err: SensitivityError) -> Self {
        match err {
            SensitivityError::DimensionMismatch { context, expected, actual } => {
                SdError::validation(format!("维度不匹配 [{context}]: 期望 {expected}, 实际 {actual}"))
            }
            SensitivityError::MissingZone { zone, n_zones } => {
                SdError::index_out_of_bounds("Zone", zone.as_usize(), n_zones)
            }
            SensitivityError::UnknownNode { kind, node, len, .. } => {
                SdError::index_out_of_bounds(kind, node as usize, len)
            }
            SensitivityError::UnknownMarker { zone, name } => {
                SdError::not_found(format!("边界标记 '{name}' (zone {zone})"))
            }
            SensitivityError::InvalidMarkerName { zone, name } => {
                SdError::validation(format!("边界标记名 {name:?} 无法写入记录 (zone {zone})"))
            }
            SensitivityError::ZoneCountMismatch { expected, actual } => {
                SdError::size_mismatch("zones", expected, actual)
            }
            SensitivityError::Format { line, message } => SdError::parse(line, message),
            SensitivityError::Io(e) => SdError::from(e),
            SensitivityError::Foundation(e) => e,
        }
    }
}
