// crates/sd_sensitivity/src/field.rs

//! 节点灵敏度场
//!
//! 目标函数对节点位置的导数，按分区内局部节点索引存储。
//! 场中缺失的节点视为零灵敏度：分区边界上的 halo 节点可能不在场中出现，这不是错误。
//!
//! 场本身只校验分量数；节点是否属于分区由 [`ZoneContext`](crate::zone::ZoneContext)
//! 在接收场时校验。

use glam::DVec3;
use sd_foundation::{GeomDim, Idx, IndexKind};
use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::error::{SensResult, SensitivityError};

/// 灵敏度场种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// 表面节点
    Surface,
    /// 体节点
    Volume,
}

impl FieldKind {
    /// 名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::Volume => "volume",
        }
    }
}

/// 把 `dim` 个分量组装成 `DVec3`，2D 时 z 恒为 0
pub fn vector_from_components(dim: GeomDim, components: &[f64], context: &str) -> SensResult<DVec3> {
    let n = dim.n_components();
    if components.len() != n {
        return Err(SensitivityError::dimension_mismatch(context, n, components.len()));
    }
    Ok(match dim {
        GeomDim::Two => DVec3::new(components[0], components[1], 0.0),
        GeomDim::Three => DVec3::new(components[0], components[1], components[2]),
    })
}

/// 取出 `DVec3` 的前 `dim` 个分量
#[inline]
pub fn vector_components(dim: GeomDim, v: DVec3) -> impl Iterator<Item = f64> {
    v.to_array().into_iter().take(dim.n_components())
}

/// 单个分区、单个种类的灵敏度场
///
/// 以 BTreeMap 保存，遍历顺序即局部索引顺序，写出结果可复现。
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityField<Tag: IndexKind> {
    dim: GeomDim,
    values: BTreeMap<u32, DVec3>,
    _marker: PhantomData<Tag>,
}

impl<Tag: IndexKind> SensitivityField<Tag> {
    /// 创建空场
    pub fn new(dim: GeomDim) -> Self {
        Self {
            dim,
            values: BTreeMap::new(),
            _marker: PhantomData,
        }
    }

    /// 由 (节点, 分量) 序列构建
    pub fn from_components<'a, I>(dim: GeomDim, entries: I) -> SensResult<Self>
    where
        I: IntoIterator<Item = (Idx<Tag>, &'a [f64])>,
    {
        let mut field = Self::new(dim);
        for (node, components) in entries {
            field.insert(node, components)?;
        }
        Ok(field)
    }

    /// 插入节点灵敏度，分量数必须等于场维度
    pub fn insert(&mut self, node: Idx<Tag>, components: &[f64]) -> SensResult<()> {
        let context = format!("{} 节点 {}", Tag::NAME, node);
        let v = vector_from_components(self.dim, components, &context)?;
        self.values.insert(node.index(), v);
        Ok(())
    }

    /// 场维度
    #[inline]
    pub fn dim(&self) -> GeomDim {
        self.dim
    }

    /// 节点灵敏度，缺失时为零向量
    #[inline]
    pub fn get(&self, node: Idx<Tag>) -> DVec3 {
        self.values.get(&node.index()).copied().unwrap_or(DVec3::ZERO)
    }

    /// 节点是否有显式值
    #[inline]
    pub fn contains(&self, node: Idx<Tag>) -> bool {
        self.values.contains_key(&node.index())
    }

    /// 显式值个数
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 按局部索引升序遍历
    pub fn iter(&self) -> impl Iterator<Item = (Idx<Tag>, DVec3)> + '_ {
        self.values.iter().map(|(&i, &v)| (Idx::new(i), v))
    }

    /// 最大局部索引
    pub fn max_index(&self) -> Option<u32> {
        self.values.keys().next_back().copied()
    }

    /// 所有分量是否均为零
    pub fn is_zero(&self) -> bool {
        self.values.values().all(|v| *v == DVec3::ZERO)
    }
}
