// crates/sd_config/src/design.rs

//! 设计变量配置
//!
//! 描述每个设计变量的参数化类型、所属分区、作用的边界标记与参数。
//! 参数个数依赖分区维度，在构造投影用的设计变量时结合分区信息校验。

use sd_foundation::GeomDim;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 参数化类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DvKind {
    /// 平移: `[dx, dy(, dz)]`
    Translation,
    /// 缩放: `[]` 或中心点 `[cx, cy(, cz)]`
    Scale,
    /// 旋转: 2D `[cx, cy]`；3D 轴线两点 `[x0, y0, z0, x1, y1, z1]`
    Rotation,
    /// Hicks-Henne 鼓包（仅 2D）: `[upper(1)|lower(0), t_b]`
    HicksHenne,
}

impl DvKind {
    /// 报告中使用的名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Translation => "TRANSLATION",
            Self::Scale => "SCALE",
            Self::Rotation => "ROTATION",
            Self::HicksHenne => "HICKS_HENNE",
        }
    }

    /// 检查参数个数是否与维度相符
    pub fn accepts_parameter_count(&self, n: usize, dim: GeomDim) -> bool {
        let d = dim.n_components();
        match self {
            Self::Translation => n == d,
            Self::Scale => n == 0 || n == d,
            Self::Rotation => match dim {
                GeomDim::Two => n == 2,
                GeomDim::Three => n == 6,
            },
            Self::HicksHenne => dim == GeomDim::Two && n == 2,
        }
    }
}

impl std::fmt::Display for DvKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 单个设计变量的配置项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignVariableSpec {
    /// 参数化类型
    pub kind: DvKind,

    /// 所属分区编号
    #[serde(default)]
    pub zone: u32,

    /// 作用的边界标记名；为空表示作用于分区全部表面节点
    #[serde(default)]
    pub markers: Vec<String>,

    /// 参数
    #[serde(default)]
    pub parameters: Vec<f64>,

    /// 有限差分步长（仅 FD 使用）
    #[serde(default = "default_step")]
    pub step: f64,
}

fn default_step() -> f64 { 1e-4 }

impl DesignVariableSpec {
    /// 创建配置项
    pub fn new(kind: DvKind, zone: u32, parameters: Vec<f64>) -> Self {
        Self {
            kind,
            zone,
            markers: Vec::new(),
            parameters,
            step: default_step(),
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

    /// 与维度无关的校验：参数与步长必须为有限值
    ///
    /// 步长的正负由 FD 投影检查，AD 投影不使用步长。
    pub fn validate(&self, position: usize) -> Result<(), ConfigError> {
        if !self.step.is_finite() {
            return Err(ConfigError::invalid(
                format!("design_variables[{position}].step"),
                self.step,
                "步长必须为有限值",
            ));
        }
        if let Some(bad) = self.parameters.iter().find(|p| !p.is_finite()) {
            return Err(ConfigError::invalid(
                format!("design_variables[{position}].parameters"),
                bad,
                "参数必须为有限值",
            ));
        }
        if self.markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::invalid(
                format!("design_variables[{position}].markers"),
                "\"\"",
                "边界标记名不能为空",
            ));
        }
        Ok(())
    }
}
