// crates/sd_projection/src/fd.rs

//! 有限差分投影
//!
//! 对每个设计变量做一次单侧差分：
//!
//! ```text
//! g_v = Σ_node dot(x(h) - x(0), s_node) / h
//! ```
//!
//! 截断误差为 O(h)，步长固定使用设计变量给定值，不做自适应调整。
//! 各设计变量之间没有共享可变状态，按并行配置用 rayon 独立求值，
//! 结果按枚举顺序收集。

use std::collections::BTreeMap;
use std::time::Instant;

use glam::DVec3;
use rayon::prelude::*;
use sd_config::ParallelConfig;
use sd_sensitivity::SensitivityStore;
use tracing::{debug, info};

use crate::assembler::{GradientAssembler, GradientEntry, GradientVector};
use crate::deformer::SurfaceDeformer;
use crate::design::DesignVariable;
use crate::error::{ProjectionError, ProjectionResult};

/// 有限差分投影器
#[derive(Debug, Clone, Copy, Default)]
pub struct FdProjector {
    parallel: ParallelConfig,
}

impl FdProjector {
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

    /// 每个设计变量一个梯度条目，按枚举顺序
    pub fn contributions<D: SurfaceDeformer>(
        &self,
        variables: &[DesignVariable],
        store: &SensitivityStore,
        deformer: &D,
    ) -> ProjectionResult<Vec<GradientEntry>> {
        // 任何变形之前先检查全部步长
        for v in variables {
            let step = v.step();
            if !(step.is_finite() && step > 0.0) {
                return Err(ProjectionError::InvalidStep {
                    variable: v.index(),
                    step,
                });
            }
        }

        let parallel = self.parallel.should_parallelize(variables.len());
        info!("FD 投影: {} 个设计变量 (并行: {})", variables.len(), parallel);
        let start = Instant::now();

        let entries = if parallel {
            variables
                .par_iter()
                .map(|v| directional_derivative(v, store, deformer))
                .collect::<ProjectionResult<Vec<_>>>()?
        } else {
            variables
                .iter()
                .map(|v| directional_derivative(v, store, deformer))
                .collect::<ProjectionResult<Vec<_>>>()?
        };

        info!("FD 投影完成, 耗时 {:?}", start.elapsed());
        Ok(entries)
    }
}

/// 单个设计变量的单侧差分
fn directional_derivative<D: SurfaceDeformer>(
    variable: &DesignVariable,
    store: &SensitivityStore,
    deformer: &D,
) -> ProjectionResult<GradientEntry> {
    let zone = store.zone(variable.zone())?;
    let field = zone.surface_field();
    let step = variable.step();

    let baseline = deformer.apply_perturbation(variable, 0.0)?;
    let perturbed = deformer.apply_perturbation(variable, step)?;

    // 两次响应都必须恰好覆盖分区内每个表面节点一次
    let n_nodes = zone.n_surface_nodes();
    let context = || format!("设计变量 {} 的扰动节点数", variable.index());

    let mut base: BTreeMap<u32, DVec3> = BTreeMap::new();
    for n in &baseline {
        zone.surface_node(n.node)?;
        base.insert(n.node.index(), n.coords);
    }
    if baseline.len() != n_nodes {
        return Err(ProjectionError::incomplete(context(), n_nodes, baseline.len()));
    }
    // 重复节点
    if base.len() != n_nodes {
        return Err(ProjectionError::incomplete(context(), n_nodes, base.len()));
    }
    if perturbed.len() != n_nodes {
        return Err(ProjectionError::incomplete(context(), n_nodes, perturbed.len()));
    }

    let mut sum = 0.0;
    let mut matched = 0;
    for n in &perturbed {
        if let Some(x0) = base.remove(&n.node.index()) {
            sum += (n.coords - x0).dot(field.get(n.node));
            matched += 1;
        }
    }
    if matched != n_nodes {
        return Err(ProjectionError::incomplete(context(), n_nodes, matched));
    }

    let value = sum / step;
    debug!(
        "FD 设计变量 {} (zone {}): {} 节点, 梯度 {:+.6e}",
        variable.index(),
        variable.zone(),
        matched,
        value
    );
    Ok(GradientEntry::new(variable.index(), variable.zone(), value))
}
