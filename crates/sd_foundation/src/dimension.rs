// crates/sd_foundation/src/dimension.rs

//! 运行时几何维度
//!
//! 每个分区在读入时确定自身是二维还是三维，
//! 灵敏度向量的分量数必须与所在分区维度一致。
//!
//! ```
//! use sd_foundation::dimension::GeomDim;
//!
//! let dim = GeomDim::from_components(2).unwrap();
//! assert_eq!(dim, GeomDim::Two);
//! assert_eq!(dim.n_components(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// 几何维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeomDim {
    /// 二维（z 分量恒为 0）
    Two,
    /// 三维
    Three,
}

impl GeomDim {
    /// 坐标/灵敏度分量数
    #[inline]
    pub const fn n_components(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// 由分量数推断维度
    pub fn from_components(n: usize) -> Option<Self> {
        match n {
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            _ => None,
        }
    }

    /// 是否为三维
    #[inline]
    pub const fn is_3d(self) -> bool {
        matches!(self, Self::Three)
    }

    /// 维度名称（用于日志和调试）
    pub const fn name(self) -> &'static str {
        match self {
            Self::Two => "2D",
            Self::Three => "3D",
        }
    }
}

impl fmt::Display for GeomDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.n_components())
    }
}
