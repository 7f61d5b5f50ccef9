// crates/sd_projection/src/assembler.rs

//! 梯度汇总
//!
//! 汇总器是投影结果唯一的排序与同步点：不论各投影任务以何种顺序完成，
//! 输出都按设计变量枚举索引排序，同一变量按分区编号升序。
//! 每个 (设计变量, 分区) 只允许一次贡献。

use std::collections::{HashMap, HashSet};

use sd_foundation::ZoneIndex;
use serde::Serialize;

use crate::error::{ProjectionError, ProjectionResult};

/// 单个 (设计变量, 分区) 的梯度贡献
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientEntry {
    /// 设计变量枚举索引
    pub variable: usize,
    /// 分区
    pub zone: ZoneIndex,
    /// 梯度值
    pub value: f64,
}

impl GradientEntry {
    /// 创建条目
    #[inline]
    pub fn new(variable: usize, zone: ZoneIndex, value: f64) -> Self {
        Self { variable, zone, value }
    }
}

/// 冻结的梯度向量，只能由 [`GradientAssembler`] 生成
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GradientVector {
    entries: Vec<GradientEntry>,
}

impl GradientVector {
    /// 有序条目
    #[inline]
    pub fn entries(&self) -> &[GradientEntry] {
        &self.entries
    }

    /// 条目数
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 遍历条目
    pub fn iter(&self) -> std::slice::Iter<'_, GradientEntry> {
        self.entries.iter()
    }

    /// 指定 (设计变量, 分区) 的梯度
    pub fn value(&self, variable: usize, zone: ZoneIndex) -> Option<f64> {
        self.entries
            .binary_search_by(|e| (e.variable, e.zone).cmp(&(variable, zone)))
            .ok()
            .map(|i| self.entries[i].value)
    }

    /// 按设计变量累加各分区贡献
    ///
    /// 结果与 `indices` 逐位对应，按条目自身的设计变量索引匹配，不依赖位置。
    /// 没有贡献的设计变量为 0；索引不在 `indices` 中的条目报 `UnknownVariable`。
    pub fn totals(&self, indices: &[usize]) -> ProjectionResult<Vec<f64>> {
        let position: HashMap<usize, usize> = indices
            .iter()
            .enumerate()
            .rev()
            .map(|(pos, &v)| (v, pos))
            .collect();
        let mut totals = vec![0.0; indices.len()];
        for e in &self.entries {
            let pos = position.get(&e.variable).ok_or(ProjectionError::UnknownVariable {
                variable: e.variable,
                n_variables: indices.len(),
            })?;
            totals[*pos] += e.value;
        }
        Ok(totals)
    }
}

impl<'a> IntoIterator for &'a GradientVector {
    type Item = &'a GradientEntry;
    type IntoIter = std::slice::Iter<'a, GradientEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// 梯度汇总器
#[derive(Debug, Default)]
pub struct GradientAssembler {
    entries: Vec<GradientEntry>,
    seen: HashSet<(usize, ZoneIndex)>,
}

impl GradientAssembler {
    /// 创建空汇总器
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个贡献
    pub fn push(&mut self, entry: GradientEntry) -> ProjectionResult<()> {
        if !self.seen.insert((entry.variable, entry.zone)) {
            return Err(ProjectionError::DuplicateContribution {
                variable: entry.variable,
                zone: entry.zone,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// 追加多个贡献（可来自多个投影器）
    pub fn extend<I>(&mut self, entries: I) -> ProjectionResult<()>
    where
        I: IntoIterator<Item = GradientEntry>,
    {
        entries.into_iter().try_for_each(|e| self.push(e))
    }

    /// 已收集的条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 排序并冻结
    pub fn finish(mut self) -> GradientVector {
        self.entries.sort_by_key(|e| (e.variable, e.zone));
        GradientVector {
            entries: self.entries,
        }
    }

    /// 一次性汇总
    pub fn assemble<I>(entries: I) -> ProjectionResult<GradientVector>
    where
        I: IntoIterator<Item = GradientEntry>,
    {
        let mut assembler = Self::new();
        assembler.extend(entries)?;
        Ok(assembler.finish())
    }
}
