// crates/sd_foundation/src/index.rs

//! 强类型索引系统
//!
//! 使用泛型 `Idx<T>` 区分分区、表面节点、体节点与边界标记的索引，
//! 避免跨分区误用原始整数编号。
//!
//! # 设计目标
//!
//! 1. **类型安全**: 编译期区分 Zone/SurfaceNode/VolumeNode/Marker 索引
//! 2. **零开销**: 与 `u32` 相同的内存布局
//! 3. **复合键**: [`NodeKey`] 以 (分区, 局部节点) 唯一定位表面节点
//!
//! # 示例
//!
//! ```
//! use sd_foundation::index::{NodeKey, SurfaceNodeIndex, ZoneIndex};
//!
//! let key = NodeKey::new(ZoneIndex::new(1), SurfaceNodeIndex::new(3));
//! assert_eq!(key.zone.as_usize(), 1);
//! assert_eq!(key.node.index(), 3);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// 无效索引标记
pub const INVALID_INDEX: u32 = u32::MAX;

// ============================================================================
// 标记类型 (Phantom Types)
// ============================================================================

/// 分区索引标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneTag;

/// 表面节点索引标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceNodeTag;

/// 体节点索引标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VolumeNodeTag;

/// 边界标记索引标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerTag;

/// 索引标记的可读名称，用于错误信息
pub trait IndexKind: 'static + Copy + Send + Sync {
    /// 类别名称
    const NAME: &'static str;
}

impl IndexKind for ZoneTag {
    const NAME: &'static str = "Zone";
}

impl IndexKind for SurfaceNodeTag {
    const NAME: &'static str = "SurfaceNode";
}

impl IndexKind for VolumeNodeTag {
    const NAME: &'static str = "VolumeNode";
}

impl IndexKind for MarkerTag {
    const NAME: &'static str = "Marker";
}

// ============================================================================
// 泛型索引类型
// ============================================================================

/// 类型安全索引（4 字节）
///
/// 使用 `PhantomData<fn() -> T>` 确保自动满足 `Send`/`Sync` 且不要求 `T: Copy`。
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Idx<T> {
    index: u32,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for Idx<T> {}

impl<T> Clone for Idx<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Idx<T> {
    /// 无效索引常量
    pub const INVALID: Self = Self {
        index: INVALID_INDEX,
        _marker: PhantomData,
    };

    /// 创建新索引
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// 从 usize 创建
    ///
    /// # Panics
    ///
    /// Debug 模式下若值超过 `u32::MAX - 1` 会 panic。
    #[inline]
    pub fn from_usize(index: usize) -> Self {
        debug_assert!(index < INVALID_INDEX as usize, "索引溢出: {index}");
        Self::new(index as u32)
    }

    /// 获取索引值
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// 获取索引值（usize）
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.index as usize
    }

    /// 判断索引是否有效
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.index != INVALID_INDEX
    }

    /// 转换为 `Option<usize>`
    #[inline]
    pub fn to_option(self) -> Option<usize> {
        self.is_valid().then_some(self.as_usize())
    }
}

// ============================================================================
// Trait 实现
// ============================================================================

impl<T> Default for Idx<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Idx<T> {}

impl<T> PartialOrd for Idx<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Idx<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Idx<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T: IndexKind> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}({})", T::NAME, self.index)
        } else {
            write!(f, "{}(INVALID)", T::NAME)
        }
    }
}

impl<T> fmt::Display for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

impl<T> From<u32> for Idx<T> {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// 类型别名
// ============================================================================

/// 分区索引
pub type ZoneIndex = Idx<ZoneTag>;
/// 分区内表面节点的局部索引
pub type SurfaceNodeIndex = Idx<SurfaceNodeTag>;
/// 分区内体节点的局部索引
pub type VolumeNodeIndex = Idx<VolumeNodeTag>;
/// 分区内边界标记索引
pub type MarkerIndex = Idx<MarkerTag>;

// ============================================================================
// 复合键
// ============================================================================

/// 表面节点的全局唯一键 (分区, 局部节点)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    /// 所属分区
    pub zone: ZoneIndex,
    /// 分区内局部索引
    pub node: SurfaceNodeIndex,
}

impl NodeKey {
    /// 创建复合键
    #[inline]
    pub const fn new(zone: ZoneIndex, node: SurfaceNodeIndex) -> Self {
        Self { zone, node }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone {} / node {}", self.zone, self.node)
    }
}
