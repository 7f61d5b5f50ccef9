// crates/sd_config/src/method.rs

//! 投影方法选择
//!
//! FD 与 AD 是两种互斥的投影策略，每次运行由外部配置选定一次。

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 灵敏度投影方法
///
/// # 示例
///
/// ```rust
/// use sd_config::ProjectionMethod;
///
/// let method: ProjectionMethod = "ad".parse().unwrap();
/// assert_eq!(method, ProjectionMethod::Algorithmic);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProjectionMethod {
    /// 单侧有限差分
    #[default]
    #[serde(rename = "fd")]
    FiniteDifference,
    /// 反向模式算法微分
    #[serde(rename = "ad")]
    Algorithmic,
}

impl ProjectionMethod {
    /// 方法名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::FiniteDifference => "fd",
            Self::Algorithmic => "ad",
        }
    }

    /// 是否使用差分步长
    #[inline]
    pub fn uses_step(&self) -> bool {
        matches!(self, Self::FiniteDifference)
    }
}

impl std::fmt::Display for ProjectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 投影方法解析错误
#[derive(Debug, Clone, thiserror::Error)]
#[error("无效的投影方法: '{0}', 期望 'fd' 或 'ad'")]
pub struct MethodParseError(String);

impl FromStr for ProjectionMethod {
    type Err = MethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fd" | "finite_difference" | "finite-difference" => Ok(Self::FiniteDifference),
            "ad" | "algorithmic" | "discrete_adjoint" => Ok(Self::Algorithmic),
            _ => Err(MethodParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_default() {
        assert_eq!(ProjectionMethod::default(), ProjectionMethod::FiniteDifference);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("FD".parse::<ProjectionMethod>().unwrap(), ProjectionMethod::FiniteDifference);
        assert_eq!("algorithmic".parse::<ProjectionMethod>().unwrap(), ProjectionMethod::Algorithmic);
        let err = "newton".parse::<ProjectionMethod>().unwrap_err();
        assert!(err.to_string().contains("'newton'"));
    }

    #[test]
    fn test_method_serde_names() {
        let json = serde_json::to_string(&ProjectionMethod::Algorithmic).unwrap();
        assert_eq!(json, "\"ad\"");
    }
}
