// crates/sd_projection/src/design.rs

//! 投影用设计变量
//!
//! 由配置项 [`DesignVariableSpec`] 结合灵敏度存储构造：分区必须存在，
//! 参数个数必须与分区维度相符，边界标记必须在分区中出现。
//! 构造后在一次优化迭代内不可变。

use glam::DVec3;
use sd_config::{DesignVariableSpec, DvKind};
use sd_foundation::{GeomDim, ZoneIndex};
use sd_sensitivity::SensitivityStore;

use crate::error::{ProjectionError, ProjectionResult};

/// 设计变量
#[derive(Debug, Clone, PartialEq)]
pub struct DesignVariable {
    index: usize,
    kind: DvKind,
    zone: ZoneIndex,
    markers: Vec<String>,
    parameters: Vec<f64>,
    step: f64,
}

impl DesignVariable {
    /// 直接创建设计变量（不与存储交叉校验）
    ///
    /// 步长的合法性由 FD 投影在运行前统一检查。
    pub fn new(index: usize, kind: DvKind, zone: ZoneIndex, parameters: Vec<f64>) -> Self {
        Self {
            index,
            kind,
            zone,
            markers: Vec::new(),
            parameters,
            step: 1e-4,
        }
    }

    /// 设置边界标记
    pub fn with_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// 设置差分步长
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// 由配置项构造并校验
    pub fn from_spec(
        index: usize,
        spec: &DesignVariableSpec,
        store: &SensitivityStore,
    ) -> ProjectionResult<Self> {
        spec.validate(index)
            .map_err(|e| ProjectionError::invalid_variable(index, e.to_string()))?;

        let zone_id = ZoneIndex::new(spec.zone);
        let zone = store.zone(zone_id)?;

        let variable = Self::new(index, spec.kind, zone_id, spec.parameters.clone())
            .with_markers(spec.markers.iter().cloned())
            .with_step(spec.step);
        variable.check_parameters(zone.dim())?;

        // 未知标记在构造时即报错
        zone.nodes_on_markers(&variable.markers)?;
        Ok(variable)
    }

    /// 按顺序构造全部设计变量，索引即列表位置
    pub fn from_specs(
        specs: &[DesignVariableSpec],
        store: &SensitivityStore,
    ) -> ProjectionResult<Vec<Self>> {
        specs
            .iter()
            .enumerate()
            .map(|(i, spec)| Self::from_spec(i, spec, store))
            .collect()
    }

    /// 检查参数个数与取值
    pub fn check_parameters(&self, dim: GeomDim) -> ProjectionResult<()> {
        let n = self.parameters.len();
        if !self.kind.accepts_parameter_count(n, dim) {
            return Err(ProjectionError::invalid_variable(
                self.index,
                format!("{} 在 {} 分区上不接受 {} 个参数", self.kind, dim.name(), n),
            ));
        }
        if self.parameters.iter().any(|p| !p.is_finite()) {
            return Err(ProjectionError::invalid_variable(self.index, "参数必须为有限值"));
        }
        match self.kind {
            DvKind::Rotation if dim.is_3d() => {
                let p = &self.parameters;
                let axis = DVec3::new(p[3] - p[0], p[4] - p[1], p[5] - p[2]);
                if axis.length_squared() == 0.0 {
                    return Err(ProjectionError::invalid_variable(self.index, "旋转轴两端点重合"));
                }
            }
            DvKind::HicksHenne => {
                let side = self.parameters[0];
                let t_b = self.parameters[1];
                if side != 0.0 && side != 1.0 {
                    return Err(ProjectionError::invalid_variable(
                        self.index,
                        format!("Hicks-Henne 侧标志必须为 0 或 1, 实际 {side}"),
                    ));
                }
                if !(t_b > 0.0 && t_b < 1.0) {
                    return Err(ProjectionError::invalid_variable(
                        self.index,
                        format!("Hicks-Henne 峰值位置必须在 (0, 1) 内, 实际 {t_b}"),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// 枚举索引
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 参数化类型
    #[inline]
    pub fn kind(&self) -> DvKind {
        self.kind
    }

    /// 所属分区
    #[inline]
    pub fn zone(&self) -> ZoneIndex {
        self.zone
    }

    /// 边界标记
    #[inline]
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// 参数
    #[inline]
    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    /// FD 步长
    #[inline]
    pub fn step(&self) -> f64 {
        self.step
    }

    /// 报告中的标记列，无标记时为 `-`
    pub fn marker_label(&self) -> String {
        if self.markers.is_empty() {
            "-".to_string()
        } else {
            self.markers.join(",")
        }
    }
}
