// crates/sd_projection/src/deformer.rs

//! 表面变形器接口
//!
//! 投影只通过两个入口使用变形器：
//!
//! - FD: 按给定步长施加单个设计变量的扰动，返回分区内表面节点的新坐标；
//!   `step = 0` 返回基线坐标
//! - AD: 以分区表面灵敏度为种子做一次反向累加，返回该分区每个设计变量的偏导数
//!
//! 变形器在投影期间只读，可被多个线程同时调用。

use glam::DVec3;
use sd_foundation::{SurfaceNodeIndex, SurfaceNodeTag};
use sd_sensitivity::{SensitivityField, ZoneContext};

use crate::design::DesignVariable;
use crate::error::ProjectionResult;

/// 变形后的表面节点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeformedNode {
    /// 分区内局部索引
    pub node: SurfaceNodeIndex,
    /// 新坐标
    pub coords: DVec3,
}

impl DeformedNode {
    /// 创建
    #[inline]
    pub fn new(node: SurfaceNodeIndex, coords: DVec3) -> Self {
        Self { node, coords }
    }
}

/// 表面变形器
pub trait SurfaceDeformer: Sync {
    /// 施加扰动，返回设计变量所在分区全部表面节点的坐标
    fn apply_perturbation(
        &self,
        variable: &DesignVariable,
        step: f64,
    ) -> ProjectionResult<Vec<DeformedNode>>;

    /// 反向累加 `(dX/dv)^T · seed`
    ///
    /// 返回值与 `variables` 一一对应。
    fn accumulate_adjoint(
        &self,
        zone: &ZoneContext,
        seed: &SensitivityField<SurfaceNodeTag>,
        variables: &[&DesignVariable],
    ) -> ProjectionResult<Vec<f64>>;
}

impl<D: SurfaceDeformer + ?Sized> SurfaceDeformer for &D {
    fn apply_perturbation(
        &self,
        variable: &DesignVariable,
        step: f64,
    ) -> ProjectionResult<Vec<DeformedNode>> {
        (**self).apply_perturbation(variable, step)
    }

    fn accumulate_adjoint(
        &self,
        zone: &ZoneContext,
        seed: &SensitivityField<SurfaceNodeTag>,
        variables: &[&DesignVariable],
    ) -> ProjectionResult<Vec<f64>> {
        (**self).accumulate_adjoint(zone, seed, variables)
    }
}
