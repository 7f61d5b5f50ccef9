// crates/sd_foundation/src/arena.rs

//! 追加式 Arena 存储
//!
//! 分区内的节点记录与边界标记在一次优化迭代内只增不删，
//! 因此 Arena 不需要空闲链表与代际验证：索引一经分配即永久有效。
//!
//! # 示例
//!
//! ```
//! use sd_foundation::arena::Arena;
//! use sd_foundation::index::MarkerTag;
//!
//! let mut arena: Arena<&str, MarkerTag> = Arena::new();
//! let idx = arena.insert("airfoil");
//! assert_eq!(arena.get(idx), Some(&"airfoil"));
//! assert_eq!(arena[idx], "airfoil");
//! ```
//!
//! # 内存布局
//!
//! ```text
//! Arena<T, Tag> {
//!     items: [T0, T1, T2, ...],   // Idx<Tag>(i) 直接对应 items[i]
//! }
//! ```

use std::marker::PhantomData;
use std::ops::Index;

use crate::error::{SdError, SdResult};
use crate::index::{Idx, IndexKind};

/// 追加式内存池
///
/// # 类型参数
/// - `T`: 存储的元素类型
/// - `Tag`: 标记类型，用于防止不同 Arena 的索引混用
#[derive(Debug, Clone)]
pub struct Arena<T, Tag: IndexKind> {
    items: Vec<T>,
    _marker: PhantomData<Tag>,
}

impl<T, Tag: IndexKind> Default for Arena<T, Tag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, Tag: IndexKind> Arena<T, Tag> {
    /// 创建空 Arena
    #[inline]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// 创建指定容量的 Arena
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    /// 有效元素数量
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 插入元素并返回索引
    pub fn insert(&mut self, value: T) -> Idx<Tag> {
        let idx = Idx::from_usize(self.items.len());
        self.items.push(value);
        idx
    }

    /// 获取元素的不可变引用
    #[inline]
    pub fn get(&self, idx: Idx<Tag>) -> Option<&T> {
        idx.to_option().and_then(|i| self.items.get(i))
    }

    /// 获取元素，索引无效时返回越界错误
    pub fn try_get(&self, idx: Idx<Tag>) -> SdResult<&T> {
        self.get(idx)
            .ok_or_else(|| SdError::index_out_of_bounds(Tag::NAME, idx.as_usize(), self.len()))
    }

    /// 检查索引是否指向已分配元素
    #[inline]
    pub fn contains(&self, idx: Idx<Tag>) -> bool {
        idx.is_valid() && idx.as_usize() < self.items.len()
    }

    /// 按索引顺序遍历
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (Idx<Tag>, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (Idx::from_usize(i), v))
    }

    /// 遍历所有值
    pub fn values(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// 所有已分配的索引
    pub fn indices(&self) -> impl ExactSizeIterator<Item = Idx<Tag>> {
        (0..self.items.len()).map(Idx::from_usize)
    }

    /// 查找第一个满足条件的元素
    pub fn position<F>(&self, mut pred: F) -> Option<Idx<Tag>>
    where
        F: FnMut(&T) -> bool,
    {
        self.items.iter().position(|v| pred(v)).map(Idx::from_usize)
    }
}

impl<T, Tag: IndexKind> Index<Idx<Tag>> for Arena<T, Tag> {
    type Output = T;

    #[inline]
    fn index(&self, idx: Idx<Tag>) -> &Self::Output {
        &self.items[idx.as_usize()]
    }
}
