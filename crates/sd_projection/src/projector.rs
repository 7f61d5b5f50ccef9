// crates/sd_projection/src/projector.rs

//! 投影策略选择
//!
//! FD 与 AD 是同一能力的两个变体，每次运行在启动时选定一次，
//! 之后通过枚举分派，不需要 trait object。

use sd_config::{ParallelConfig, ProjectionMethod};
use sd_sensitivity::SensitivityStore;

use crate::ad::AdProjector;
use crate::assembler::{GradientAssembler, GradientEntry, GradientVector};
use crate::deformer::SurfaceDeformer;
use crate::design::DesignVariable;
use crate::error::ProjectionResult;
use crate::fd::FdProjector;

/// 灵敏度投影器
#[derive(Debug, Clone, Copy)]
pub enum Projector {
    /// 单侧有限差分
    FiniteDifference(FdProjector),
    /// 反向模式算法微分
    Algorithmic(AdProjector),
}

impl Projector {
    /// 按配置的方法构造
    pub fn from_method(method: ProjectionMethod, parallel: ParallelConfig) -> Self {
        match method {
            ProjectionMethod::FiniteDifference => Self::FiniteDifference(FdProjector::new(parallel)),
            ProjectionMethod::Algorithmic => Self::Algorithmic(AdProjector::new(parallel)),
        }
    }

    /// 对应的方法
    pub fn method(&self) -> ProjectionMethod {
        match self {
            Self::FiniteDifference(_) => ProjectionMethod::FiniteDifference,
            Self::Algorithmic(_) => ProjectionMethod::Algorithmic,
        }
    }

    /// 未排序的梯度贡献
    pub fn contributions<D: SurfaceDeformer>(
        &self,
        variables: &[DesignVariable],
        store: &SensitivityStore,
        deformer: &D,
    ) -> ProjectionResult<Vec<GradientEntry>> {
        match self {
            Self::FiniteDifference(p) => p.contributions(variables, store, deformer),
            Self::Algorithmic(p) => p.contributions(variables, store, deformer),
        }
    }

    /// 投影并汇总
    pub fn project<D: SurfaceDeformer>(
        &self,
        variables: &[DesignVariable],
        store: &SensitivityStore,
        deformer: &D,
    ) -> ProjectionResult<GradientVector> {
        GradientAssembler::assemble(self.contributions(variables, store, deformer)?)
    }
}
