// crates/sd_projection/src/ad.rs

//! 算法微分投影
//!
//! 每个分区一次反向累加：以该分区完整的表面灵敏度场为种子调用变形器，
//! 得到分区内全部设计变量的精确偏导数
//!
//! ```text
//! g_zone = (dX_zone / dv)^T · s_zone
//! ```
//!
//! 调用次数等于含设计变量的分区数，与设计变量个数无关。
//! 分区内变量作为一个整体处理，不同分区之间按并行配置并行。

use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;
use sd_config::ParallelConfig;
use sd_foundation::ZoneIndex;
use sd_sensitivity::SensitivityStore;
use tracing::{debug, info};

use crate::assembler::{GradientAssembler, GradientEntry, GradientVector};
use crate::deformer::SurfaceDeformer;
use crate::design::DesignVariable;
use crate::error::{ProjectionError, ProjectionResult};

/// 算法微分投影器
#[derive(Debug, Clone, Copy, Default)]
pub struct AdProjector {
    parallel: ParallelConfig,
}

impl AdProjector {
    /// 创建投影器
    pub fn new(parallel: ParallelConfig) -> Self {
        Self { parallel }
    }

    /// 并行配置
    pub fn parallel(&self) -> &ParallelConfig {
        &self.parallel
    }

    /// 投影并汇总为梯度向量
    pub fn project<D: SurfaceDeformer>(
        &self,
        variables: &[DesignVariable],
        store: &SensitivityStore,
        deformer: &D,
    ) -> ProjectionResult<GradientVector> {
        GradientAssembler::assemble(self.contributions(variables, store, deformer)?)
    }

    /// 按分区收集梯度条目
    ///
    /// 分区按编号升序，分区内保持设计变量的枚举顺序。
    pub fn contributions<D: SurfaceDeformer>(
        &self,
        variables: &[DesignVariable],
        store: &SensitivityStore,
        deformer: &D,
    ) -> ProjectionResult<Vec<GradientEntry>> {
        let groups: Vec<(ZoneIndex, Vec<&DesignVariable>)> = group_by_zone(variables).into_iter().collect();

        let parallel = self.parallel.should_parallelize(groups.len());
        info!(
            "AD 投影: {} 个设计变量, {} 个分区 (并行: {})",
            variables.len(),
            groups.len(),
            parallel
        );
        let start = Instant::now();

        let per_zone = if parallel {
            groups
                .par_iter()
                .map(|(zone, vars)| accumulate_zone(*zone, vars, store, deformer))
                .collect::<ProjectionResult<Vec<_>>>()?
        } else {
            groups
                .iter()
                .map(|(zone, vars)| accumulate_zone(*zone, vars, store, deformer))
                .collect::<ProjectionResult<Vec<_>>>()?
        };

        info!("AD 投影完成, 耗时 {:?}", start.elapsed());
        Ok(per_zone.into_iter().flatten().collect())
    }
}

/// 按分区分组，保持组内枚举顺序
fn group_by_zone(variables: &[DesignVariable]) -> BTreeMap<ZoneIndex, Vec<&DesignVariable>> {
    let mut groups: BTreeMap<ZoneIndex, Vec<&DesignVariable>> = BTreeMap::new();
    for v in variables {
        groups.entry(v.zone()).or_default().push(v);
    }
    groups
}

/// 单个分区的一次反向累加
fn accumulate_zone<D: SurfaceDeformer>(
    zone_id: ZoneIndex,
    variables: &[&DesignVariable],
    store: &SensitivityStore,
    deformer: &D,
) -> ProjectionResult<Vec<GradientEntry>> {
    let zone = store.zone(zone_id)?;
    let gradient = deformer.accumulate_adjoint(zone, zone.surface_field(), variables)?;
    if gradient.len() != variables.len() {
        return Err(ProjectionError::incomplete(
            format!("zone {} 的反向累加结果数", zone_id),
            variables.len(),
            gradient.len(),
        ));
    }
    debug!("AD zone {}: {} 个设计变量", zone_id, variables.len());
    Ok(variables
        .iter()
        .zip(gradient)
        .map(|(v, value)| GradientEntry::new(v.index(), zone_id, value))
        .collect())
}
