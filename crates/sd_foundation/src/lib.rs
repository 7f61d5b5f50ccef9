// crates/sd_foundation/src/lib.rs

//! SensDot Foundation Layer
//!
//! 基础层，提供整个项目共享的抽象。
//!
//! # 模块概览
//!
//! - [`index`]: 强类型索引与 (分区, 节点) 复合键
//! - [`arena`]: 追加式 Arena 存储
//! - [`dimension`]: 运行时几何维度
//! - [`tolerance`]: FD/AD 梯度比较容差
//! - [`error`]: 统一错误类型
//!
//! # 设计原则
//!
//! 1. **最少依赖**: 仅依赖 serde 和 thiserror
//! 2. **类型安全**: 编译期防止索引误用

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arena;
pub mod dimension;
pub mod error;
pub mod index;
pub mod tolerance;

// 重导出常用类型
pub use arena::Arena;
pub use dimension::GeomDim;
pub use error::{SdError, SdResult};
pub use index::{
    Idx, IndexKind, MarkerIndex, MarkerTag, NodeKey, SurfaceNodeIndex, SurfaceNodeTag,
    VolumeNodeIndex, VolumeNodeTag, ZoneIndex, ZoneTag,
};
pub use tolerance::FdTolerance;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::arena::Arena;
    pub use crate::dimension::GeomDim;
    pub use crate::error::{SdError, SdResult};
    pub use crate::index::{
        Idx, MarkerIndex, NodeKey, SurfaceNodeIndex, VolumeNodeIndex, ZoneIndex,
    };
}
