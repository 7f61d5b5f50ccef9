// crates/sd_projection/src/parametric.rs

//! 参数化表面变形器
//!
//! 直接作用于存储中的表面节点坐标，只移动设计变量边界标记上的节点
//! （未指定标记时移动分区全部表面节点）。
//!
//! | 类型 | 参数 | 位移 `x(v)` |
//! |------|------|------------|
//! | TRANSLATION | `d` | `x + v·d` |
//! | SCALE | `[]` 或中心 `c` | `c + (1 + v)(x - c)` |
//! | ROTATION | 2D 中心 / 3D 轴线 | 绕轴旋转角度 `v` |
//! | HICKS_HENNE | `[side, t_b]` | `y ± v·sin³(π·ξ^e)`, `e = ln0.5 / ln t_b` |
//!
//! AD 入口使用 `v = 0` 处的解析切向量 `∂x/∂v`，对一个分区的全部变量只遍历一次节点。

use std::f64::consts::PI;

use glam::{DQuat, DVec3};
use sd_config::DvKind;
use sd_foundation::{GeomDim, SurfaceNodeTag};
use sd_sensitivity::{SensitivityField, SensitivityStore, ZoneContext};
use tracing::debug;

use crate::deformer::{DeformedNode, SurfaceDeformer};
use crate::design::DesignVariable;
use crate::error::{ProjectionError, ProjectionResult};

/// 单个设计变量的运动模式
#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    Translation { direction: DVec3 },
    Scale { center: DVec3 },
    Rotation { origin: DVec3, axis: DVec3 },
    HicksHenne { sign: f64, x_min: f64, chord: f64, exponent: f64 },
}

impl Motion {
    /// 参数 `v` 处的位置
    fn displace(&self, x: DVec3, v: f64) -> DVec3 {
        match *self {
            Self::Translation { direction } => x + v * direction,
            Self::Scale { center } => center + (1.0 + v) * (x - center),
            Self::Rotation { origin, axis } => origin + DQuat::from_axis_angle(axis, v) * (x - origin),
            Self::HicksHenne { .. } => x + v * self.tangent(x),
        }
    }

    /// `v = 0` 处的切向量
    fn tangent(&self, x: DVec3) -> DVec3 {
        match *self {
            Self::Translation { direction } => direction,
            Self::Scale { center } => x - center,
            Self::Rotation { origin, axis } => axis.cross(x - origin),
            Self::HicksHenne { sign, x_min, chord, exponent } => {
                let xi = ((x.x - x_min) / chord).clamp(0.0, 1.0);
                let bump = (PI * xi.powf(exponent)).sin().powi(3);
                DVec3::new(0.0, sign * bump, 0.0)
            }
        }
    }
}

/// 运动模式与受影响节点
#[derive(Debug, Clone)]
struct PreparedVariable {
    motion: Motion,
    moves: Vec<bool>,
}

/// 基于存储坐标的参数化变形器
#[derive(Debug, Clone, Copy)]
pub struct ParametricDeformer<'a> {
    store: &'a SensitivityStore,
}

impl<'a> ParametricDeformer<'a> {
    /// 创建变形器
    pub fn new(store: &'a SensitivityStore) -> Self {
        Self { store }
    }

    fn prepare(&self, zone: &ZoneContext, variable: &DesignVariable) -> ProjectionResult<PreparedVariable> {
        if variable.zone() != zone.id() {
            return Err(ProjectionError::invalid_variable(
                variable.index(),
                format!("属于 zone {}, 不能在 zone {} 上变形", variable.zone(), zone.id()),
            ));
        }
        variable.check_parameters(zone.dim())?;

        let mut moves = vec![false; zone.n_surface_nodes()];
        for node in zone.nodes_on_markers(variable.markers())? {
            moves[node.as_usize()] = true;
        }

        let p = variable.parameters();
        let motion = match variable.kind() {
            DvKind::Translation => Motion::Translation {
                direction: point(zone.dim(), p),
            },
            DvKind::Scale => Motion::Scale {
                center: if p.is_empty() { DVec3::ZERO } else { point(zone.dim(), p) },
            },
            DvKind::Rotation => match zone.dim() {
                GeomDim::Two => Motion::Rotation {
                    origin: DVec3::new(p[0], p[1], 0.0),
                    axis: DVec3::Z,
                },
                GeomDim::Three => {
                    let origin = DVec3::new(p[0], p[1], p[2]);
                    let axis = (DVec3::new(p[3], p[4], p[5]) - origin).normalize();
                    Motion::Rotation { origin, axis }
                }
            },
            DvKind::HicksHenne => {
                let (x_min, x_max) = zone
                    .surface_nodes()
                    .iter()
                    .filter(|(i, _)| moves[i.as_usize()])
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, n)| {
                        (lo.min(n.coords.x), hi.max(n.coords.x))
                    });
                let chord = x_max - x_min;
                if !(chord > 0.0) {
                    return Err(ProjectionError::invalid_variable(
                        variable.index(),
                        "Hicks-Henne 作用的节点在 x 方向没有展开",
                    ));
                }
                Motion::HicksHenne {
                    sign: if p[0] == 1.0 { 1.0 } else { -1.0 },
                    x_min,
                    chord,
                    exponent: 0.5f64.ln() / p[1].ln(),
                }
            }
        };
        Ok(PreparedVariable { motion, moves })
    }
}

/// 参数前 `dim` 个分量作为点或方向
fn point(dim: GeomDim, p: &[f64]) -> DVec3 {
    match dim {
        GeomDim::Two => DVec3::new(p[0], p[1], 0.0),
        GeomDim::Three => DVec3::new(p[0], p[1], p[2]),
    }
}

impl SurfaceDeformer for ParametricDeformer<'_> {
    fn apply_perturbation(
        &self,
        variable: &DesignVariable,
        step: f64,
    ) -> ProjectionResult<Vec<DeformedNode>> {
        let zone = self.store.zone(variable.zone())?;
        let prepared = self.prepare(zone, variable)?;
        Ok(zone
            .surface_nodes()
            .iter()
            .map(|(idx, node)| {
                let coords = if prepared.moves[idx.as_usize()] {
                    prepared.motion.displace(node.coords, step)
                } else {
                    node.coords
                };
                DeformedNode::new(idx, coords)
            })
            .collect())
    }

    fn accumulate_adjoint(
        &self,
        zone: &ZoneContext,
        seed: &SensitivityField<SurfaceNodeTag>,
        variables: &[&DesignVariable],
    ) -> ProjectionResult<Vec<f64>> {
        let prepared = variables
            .iter()
            .map(|v| self.prepare(zone, v))
            .collect::<ProjectionResult<Vec<_>>>()?;

        let mut gradient = vec![0.0; variables.len()];
        for (idx, s) in seed.iter() {
            let node = zone.surface_node(idx)?;
            for (g, prep) in gradient.iter_mut().zip(&prepared) {
                if prep.moves[idx.as_usize()] {
                    *g += prep.motion.tangent(node.coords).dot(s);
                }
            }
        }
        debug!(
            "zone {}: 反向累加 {} 个设计变量, {} 个种子节点",
            zone.id(),
            variables.len(),
            seed.len()
        );
        Ok(gradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_foundation::ZoneIndex;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn unit_square() -> SensitivityStore {
        let mut store = SensitivityStore::new();
        let z = store.add_zone(GeomDim::Two);
        let zone = store.zone_mut(z).unwrap();
        let lower = zone.add_marker("lower").unwrap();
        let upper = zone.add_marker("upper").unwrap();
        zone.add_surface_node(0, lower, &[0.0, 0.0]).unwrap();
        zone.add_surface_node(1, lower, &[1.0, 0.0]).unwrap();
        zone.add_surface_node(2, upper, &[1.0, 1.0]).unwrap();
        zone.add_surface_node(3, upper, &[0.0, 1.0]).unwrap();
        store
    }

    #[test]
    fn test_translation_moves_only_marker_nodes() {
        let store = unit_square();
        let deformer = ParametricDeformer::new(&store);
        let dv = DesignVariable::new(0, DvKind::Translation, ZoneIndex::new(0), vec![0.0, 2.0])
            .with_markers(["upper"]);
        let nodes = deformer.apply_perturbation(&dv, 0.5).unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0].coords, DVec3::new(0.0, 0.0, 0.0));
        assert_eq!(nodes[2].coords, DVec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_zero_step_is_baseline() {
        let store = unit_square();
        let deformer = ParametricDeformer::new(&store);
        let dv = DesignVariable::new(0, DvKind::Rotation, ZoneIndex::new(0), vec![0.5, 0.5]);
        let nodes = deformer.apply_perturbation(&dv, 0.0).unwrap();
        for (n, (_, orig)) in nodes.iter().zip(store.zone(ZoneIndex::new(0)).unwrap().surface_nodes().iter()) {
            assert!((n.coords - orig.coords).length() < 1e-15);
        }
    }

    #[test]
    fn test_rotation_2d_quarter_turn() {
        let store = unit_square();
        let deformer = ParametricDeformer::new(&store);
        let dv = DesignVariable::new(0, DvKind::Rotation, ZoneIndex::new(0), vec![0.0, 0.0]);
        let nodes = deformer.apply_perturbation(&dv, PI / 2.0).unwrap();
        // (1, 0) -> (0, 1)
        assert!(approx_eq(nodes[1].coords.x, 0.0, 1e-12));
        assert!(approx_eq(nodes[1].coords.y, 1.0, 1e-12));
    }

    #[test]
    fn test_scale_about_center() {
        let store = unit_square();
        let deformer = ParametricDeformer::new(&store);
        let dv = DesignVariable::new(0, DvKind::Scale, ZoneIndex::new(0), vec![0.5, 0.5]);
        let nodes = deformer.apply_perturbation(&dv, 1.0).unwrap();
        assert_eq!(nodes[2].coords, DVec3::new(1.5, 1.5, 0.0));
    }

    #[test]
    fn test_hicks_henne_peak_and_ends() {
        let mut store = SensitivityStore::new();
        let z = store.add_zone(GeomDim::Two);
        let zone = store.zone_mut(z).unwrap();
        let upper = zone.add_marker("upper").unwrap();
        for i in 0..=4 {
            zone.add_surface_node(i, upper, &[i as f64 * 0.25, 0.0]).unwrap();
        }
        let deformer = ParametricDeformer::new(&store);
        let dv = DesignVariable::new(0, DvKind::HicksHenne, z, vec![1.0, 0.5]);
        let nodes = deformer.apply_perturbation(&dv, 0.1).unwrap();
        assert!(approx_eq(nodes[0].coords.y, 0.0, 1e-15));
        assert!(approx_eq(nodes[4].coords.y, 0.0, 1e-15));
        // t_b = 0.5 时峰值在弦长中点
        assert!(approx_eq(nodes[2].coords.y, 0.1, 1e-15));

        let lower = DesignVariable::new(1, DvKind::HicksHenne, z, vec![0.0, 0.5]);
        let nodes = deformer.apply_perturbation(&lower, 0.1).unwrap();
        assert!(approx_eq(nodes[2].coords.y, -0.1, 1e-15));
    }

    #[test]
    fn test_adjoint_matches_tangent() {
        let mut store = unit_square();
        let z = ZoneIndex::new(0);
        let mut seed = SensitivityField::new(GeomDim::Two);
        for i in 0..4u32 {
            seed.insert(sd_foundation::SurfaceNodeIndex::new(i), &[1.0, 1.0]).unwrap();
        }
        store.zone_mut(z).unwrap().set_surface_field(seed).unwrap();

        let deformer = ParametricDeformer::new(&store);
        let tx = DesignVariable::new(0, DvKind::Translation, z, vec![1.0, 0.0]);
        let sc = DesignVariable::new(1, DvKind::Scale, z, vec![]).with_markers(["upper"]);
        let zone = store.zone(z).unwrap();
        let grads = deformer
            .accumulate_adjoint(zone, zone.surface_field(), &[&tx, &sc])
            .unwrap();
        // 平移: 4 个节点各贡献 1
        assert!(approx_eq(grads[0], 4.0, 1e-14));
        // 缩放: (1,1)·(1,1) + (0,1)·(1,1) = 3
        assert!(approx_eq(grads[1], 3.0, 1e-14));
    }

    #[test]
    fn test_variable_from_other_zone_rejected() {
        let mut store = unit_square();
        store.add_zone(GeomDim::Two);
        let deformer = ParametricDeformer::new(&store);
        let dv = DesignVariable::new(0, DvKind::Scale, ZoneIndex::new(1), vec![]);
        let zone = store.zone(ZoneIndex::new(0)).unwrap();
        let err = deformer
            .accumulate_adjoint(zone, zone.surface_field(), &[&dv])
            .unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidVariable { .. }));
    }
}
