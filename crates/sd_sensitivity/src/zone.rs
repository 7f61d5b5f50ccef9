// crates/sd_sensitivity/src/zone.rs

//! 分区上下文
//!
//! 每个分区独立持有自己的边界标记、表面节点记录与两类灵敏度场，
//! 不依赖任何全局编号假设。
//!
//! # 数据布局
//!
//! ```text
//! ZoneContext {
//!     id, dim,
//!     markers:       Arena<Marker>        MarkerIndex -> 名称
//!     surface_nodes: Arena<SurfaceNode>   SurfaceNodeIndex -> (全局编号, 标记, 坐标)
//!     n_volume_nodes                      体节点数（VolumeNodeIndex 的上界）
//!     surface:       SensitivityField<SurfaceNodeTag>
//!     volume:        SensitivityField<VolumeNodeTag>
//! }
//! ```

use glam::DVec3;
use sd_foundation::{
    Arena, GeomDim, IndexKind, MarkerIndex, MarkerTag, NodeKey, SurfaceNodeIndex, SurfaceNodeTag,
    VolumeNodeTag, ZoneIndex,
};
use serde::Serialize;

use crate::error::{SensResult, SensitivityError};
use crate::field::{vector_from_components, FieldKind, SensitivityField};

/// 边界标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// 标记名
    pub name: String,
}

/// 表面节点记录
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceNode {
    /// 网格全局编号
    pub global_id: u64,
    /// 所属分区
    pub zone: ZoneIndex,
    /// 所在边界标记
    pub marker: MarkerIndex,
    /// 坐标（2D 时 z = 0）
    pub coords: DVec3,
}

/// 单个分区的全部灵敏度数据
#[derive(Debug, Clone)]
pub struct ZoneContext {
    id: ZoneIndex,
    dim: GeomDim,
    markers: Arena<Marker, MarkerTag>,
    surface_nodes: Arena<SurfaceNode, SurfaceNodeTag>,
    n_volume_nodes: usize,
    surface: SensitivityField<SurfaceNodeTag>,
    volume: SensitivityField<VolumeNodeTag>,
}

/// 分区概要（用于日志与 `info` 命令）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSummary {
    /// 分区编号
    pub zone: u32,
    /// 维度分量数
    pub dim: usize,
    /// 边界标记名
    pub markers: Vec<String>,
    /// 表面节点数
    pub n_surface_nodes: usize,
    /// 表面灵敏度显式值个数
    pub n_surface_values: usize,
    /// 体节点数
    pub n_volume_nodes: usize,
    /// 体灵敏度显式值个数
    pub n_volume_values: usize,
}

impl ZoneContext {
    /// 创建空分区（由 `SensitivityStore::add_zone` 调用）
    pub(crate) fn new(id: ZoneIndex, dim: GeomDim) -> Self {
        Self {
            id,
            dim,
            markers: Arena::new(),
            surface_nodes: Arena::new(),
            n_volume_nodes: 0,
            surface: SensitivityField::new(dim),
            volume: SensitivityField::new(dim),
        }
    }

    /// 分区编号
    #[inline]
    pub fn id(&self) -> ZoneIndex {
        self.id
    }

    /// 几何维度
    #[inline]
    pub fn dim(&self) -> GeomDim {
        self.dim
    }

    // ===== 边界标记 =====

    /// 添加边界标记，同名标记返回已有索引
    ///
    /// 名称不能为空，不能有首尾空白，也不能含控制字符（换行等），
    /// 保证写入记录后按原样读回。
    pub fn add_marker(&mut self, name: impl Into<String>) -> SensResult<MarkerIndex> {
        let name = name.into();
        if name.is_empty() || name.trim() != name || name.chars().any(char::is_control) {
            return Err(SensitivityError::InvalidMarkerName { zone: self.id, name });
        }
        if let Some(idx) = self.marker_by_name(&name) {
            return Ok(idx);
        }
        Ok(self.markers.insert(Marker { name }))
    }

    /// 按名称查找边界标记
    pub fn marker_by_name(&self, name: &str) -> Option<MarkerIndex> {
        self.markers.position(|m| m.name == name)
    }

    /// 边界标记名
    pub fn marker_name(&self, idx: MarkerIndex) -> Option<&str> {
        self.markers.get(idx).map(|m| m.name.as_str())
    }

    /// 所有边界标记
    pub fn markers(&self) -> &Arena<Marker, MarkerTag> {
        &self.markers
    }

    // ===== 表面节点 =====

    /// 添加表面节点，坐标分量数必须等于分区维度
    pub fn add_surface_node(
        &mut self,
        global_id: u64,
        marker: MarkerIndex,
        coords: &[f64],
    ) -> SensResult<SurfaceNodeIndex> {
        self.markers.try_get(marker)?;
        let context = format!("zone {} 表面节点 {} 坐标", self.id, global_id);
        let coords = vector_from_components(self.dim, coords, &context)?;
        Ok(self.surface_nodes.insert(SurfaceNode {
            global_id,
            zone: self.id,
            marker,
            coords,
        }))
    }

    /// 表面节点记录
    pub fn surface_node(&self, node: SurfaceNodeIndex) -> SensResult<&SurfaceNode> {
        self.surface_nodes.get(node).ok_or(SensitivityError::UnknownNode {
            zone: self.id,
            kind: SurfaceNodeTag::NAME,
            node: node.index(),
            len: self.surface_nodes.len(),
        })
    }

    /// 所有表面节点
    pub fn surface_nodes(&self) -> &Arena<SurfaceNode, SurfaceNodeTag> {
        &self.surface_nodes
    }

    /// 表面节点数
    #[inline]
    pub fn n_surface_nodes(&self) -> usize {
        self.surface_nodes.len()
    }

    /// 位于给定边界标记上的表面节点；`names` 为空时返回全部节点
    pub fn nodes_on_markers(&self, names: &[String]) -> SensResult<Vec<SurfaceNodeIndex>> {
        if names.is_empty() {
            return Ok(self.surface_nodes.indices().collect());
        }
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let idx = self.marker_by_name(name).ok_or_else(|| SensitivityError::UnknownMarker {
                zone: self.id,
                name: name.clone(),
            })?;
            selected.push(idx);
        }
        Ok(self
            .surface_nodes
            .iter()
            .filter(|(_, n)| selected.contains(&n.marker))
            .map(|(i, _)| i)
            .collect())
    }

    /// 表面节点的复合键
    #[inline]
    pub fn key(&self, node: SurfaceNodeIndex) -> NodeKey {
        NodeKey::new(self.id, node)
    }

    // ===== 体节点 =====

    /// 设置体节点数
    ///
    /// 不能小于已有体灵敏度场引用的最大节点编号。
    pub fn set_volume_node_count(&mut self, n: usize) -> SensResult<()> {
        if let Some(max) = self.volume.max_index() {
            if max as usize >= n {
                return Err(SensitivityError::UnknownNode {
                    zone: self.id,
                    kind: VolumeNodeTag::NAME,
                    node: max,
                    len: n,
                });
            }
        }
        self.n_volume_nodes = n;
        Ok(())
    }

    /// 体节点数
    #[inline]
    pub fn n_volume_nodes(&self) -> usize {
        self.n_volume_nodes
    }

    // ===== 灵敏度场 =====

    /// 接收上游求解器给出的表面灵敏度场
    pub fn set_surface_field(&mut self, field: SensitivityField<SurfaceNodeTag>) -> SensResult<()> {
        self.check_field(FieldKind::Surface, field.dim(), field.max_index(), self.surface_nodes.len())?;
        self.surface = field;
        Ok(())
    }

    /// 接收上游求解器给出的体灵敏度场
    pub fn set_volume_field(&mut self, field: SensitivityField<VolumeNodeTag>) -> SensResult<()> {
        self.check_field(FieldKind::Volume, field.dim(), field.max_index(), self.n_volume_nodes)?;
        self.volume = field;
        Ok(())
    }

    fn check_field(
        &self,
        kind: FieldKind,
        dim: GeomDim,
        max_index: Option<u32>,
        len: usize,
    ) -> SensResult<()> {
        if dim != self.dim {
            return Err(SensitivityError::dimension_mismatch(
                format!("zone {} {} 灵敏度场", self.id, kind.name()),
                self.dim.n_components(),
                dim.n_components(),
            ));
        }
        if let Some(max) = max_index {
            if max as usize >= len {
                let kind_name = match kind {
                    FieldKind::Surface => SurfaceNodeTag::NAME,
                    FieldKind::Volume => VolumeNodeTag::NAME,
                };
                return Err(SensitivityError::UnknownNode {
                    zone: self.id,
                    kind: kind_name,
                    node: max,
                    len,
                });
            }
        }
        Ok(())
    }

    /// 表面灵敏度场
    #[inline]
    pub fn surface_field(&self) -> &SensitivityField<SurfaceNodeTag> {
        &self.surface
    }

    /// 体灵敏度场
    #[inline]
    pub fn volume_field(&self) -> &SensitivityField<VolumeNodeTag> {
        &self.volume
    }

    /// 分区概要
    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary {
            zone: self.id.index(),
            dim: self.dim.n_components(),
            markers: self.markers.values().map(|m| m.name.clone()).collect(),
            n_surface_nodes: self.surface_nodes.len(),
            n_surface_values: self.surface.len(),
            n_volume_nodes: self.n_volume_nodes,
            n_volume_values: self.volume.len(),
        }
    }
}
