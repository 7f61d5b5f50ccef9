// crates/sd_sensitivity/src/store.rs

//! SensitivityStore - 多分区灵敏度存储
//!
//! 由上游伴随求解器边界填充，在投影阶段只读共享。
//! 分区按编号稠密有序存放，`ZoneIndex(i)` 即第 i 个分区。
//!
//! # 使用示例
//!
//! ```
//! use sd_foundation::{GeomDim, SurfaceNodeIndex};
//! use sd_sensitivity::{SensitivityField, SensitivityStore};
//!
//! let mut store = SensitivityStore::new();
//! let zone_id = store.add_zone(GeomDim::Two);
//! let zone = store.zone_mut(zone_id).unwrap();
//! let wall = zone.add_marker("wall").unwrap();
//! let n0 = zone.add_surface_node(0, wall, &[0.0, 0.0]).unwrap();
//!
//! let mut field = SensitivityField::new(GeomDim::Two);
//! field.insert(n0, &[1.0, 0.0]).unwrap();
//! zone.set_surface_field(field).unwrap();
//!
//! assert_eq!(store.n_zones(), 1);
//! ```

use glam::DVec3;
use sd_foundation::{GeomDim, NodeKey, ZoneIndex};

use crate::error::{SensResult, SensitivityError};
use crate::zone::{SurfaceNode, ZoneContext, ZoneSummary};

/// 多分区灵敏度存储
#[derive(Debug, Clone, Default)]
pub struct SensitivityStore {
    zones: Vec<ZoneContext>,
}

impl SensitivityStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加分区并返回其编号
    pub fn add_zone(&mut self, dim: GeomDim) -> ZoneIndex {
        let id = ZoneIndex::from_usize(self.zones.len());
        self.zones.push(ZoneContext::new(id, dim));
        id
    }

    /// 分区数
    #[inline]
    pub fn n_zones(&self) -> usize {
        self.zones.len()
    }

    /// 是否没有分区
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// 获取分区
    pub fn zone(&self, id: ZoneIndex) -> SensResult<&ZoneContext> {
        let n_zones = self.zones.len();
        id.to_option()
            .and_then(|i| self.zones.get(i))
            .ok_or(SensitivityError::MissingZone { zone: id, n_zones })
    }

    /// 获取可变分区（仅在填充阶段使用）
    pub fn zone_mut(&mut self, id: ZoneIndex) -> SensResult<&mut ZoneContext> {
        let n_zones = self.zones.len();
        id.to_option()
            .and_then(|i| self.zones.get_mut(i))
            .ok_or(SensitivityError::MissingZone { zone: id, n_zones })
    }

    /// 按编号顺序遍历分区
    pub fn zones(&self) -> std::slice::Iter<'_, ZoneContext> {
        self.zones.iter()
    }

    /// 表面节点记录
    pub fn surface_node(&self, key: NodeKey) -> SensResult<&SurfaceNode> {
        self.zone(key.zone)?.surface_node(key.node)
    }

    /// 表面节点灵敏度；节点存在但场中无值时为零
    pub fn surface_sensitivity(&self, key: NodeKey) -> SensResult<DVec3> {
        let zone = self.zone(key.zone)?;
        zone.surface_node(key.node)?;
        Ok(zone.surface_field().get(key.node))
    }

    /// 所有分区概要
    pub fn summary(&self) -> Vec<ZoneSummary> {
        self.zones.iter().map(ZoneContext::summary).collect()
    }

    /// 表面节点总数
    pub fn total_surface_nodes(&self) -> usize {
        self.zones.iter().map(ZoneContext::n_surface_nodes).sum()
    }
}
