// crates/sd_projection/src/compare.rs

//! FD 与 AD 梯度比较
//!
//! 以 AD 结果为参考，逐个设计变量检查 FD 偏差是否落在随步长变化的容差内，
//! 容差定义见 [`FdTolerance`]。

use sd_foundation::{FdTolerance, ZoneIndex};
use serde::Serialize;

use crate::assembler::GradientVector;
use crate::design::DesignVariable;
use crate::error::ProjectionResult;

/// 单个设计变量的比较结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonRow {
    /// 设计变量索引
    pub variable: usize,
    /// 分区
    pub zone: ZoneIndex,
    /// FD 步长
    pub step: f64,
    /// FD 梯度
    pub fd: f64,
    /// AD 梯度
    pub ad: f64,
    /// 允许偏差
    pub bound: f64,
}

impl ComparisonRow {
    /// 绝对偏差
    #[inline]
    pub fn difference(&self) -> f64 {
        (self.fd - self.ad).abs()
    }

    /// 是否在容差内
    #[inline]
    pub fn within(&self) -> bool {
        self.difference() <= self.bound
    }
}

/// 全部设计变量的比较结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientComparison {
    rows: Vec<ComparisonRow>,
}

impl GradientComparison {
    /// 比较两组梯度
    pub fn compare(
        fd: &GradientVector,
        ad: &GradientVector,
        variables: &[DesignVariable],
        tolerance: &FdTolerance,
    ) -> ProjectionResult<Self> {
        let indices: Vec<usize> = variables.iter().map(DesignVariable::index).collect();
        let fd_totals = fd.totals(&indices)?;
        let ad_totals = ad.totals(&indices)?;
        let rows = variables
            .iter()
            .zip(fd_totals.into_iter().zip(ad_totals))
            .map(|(v, (fd, ad))| ComparisonRow {
                variable: v.index(),
                zone: v.zone(),
                step: v.step(),
                fd,
                ad,
                bound: tolerance.bound(v.step(), ad),
            })
            .collect();
        Ok(Self { rows })
    }

    /// 逐行结果
    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    /// 全部在容差内
    pub fn all_within(&self) -> bool {
        self.rows.iter().all(ComparisonRow::within)
    }

    /// 超出容差的行
    pub fn failures(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(|r| !r.within())
    }

    /// 最大绝对偏差
    pub fn max_difference(&self) -> f64 {
        self.rows.iter().map(ComparisonRow::difference).fold(0.0, f64::max)
    }

    /// 文本表格
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:>8} {:>4} {:>12} {:>20} {:>20} {:>12} {:>12}  OK\n",
            "VARIABLE", "ZONE", "STEP", "FD", "AD", "DIFF", "BOUND"
        ));
        for r in &self.rows {
            out.push_str(&format!(
                "{:>8} {:>4} {:>12.3e} {:>20.12e} {:>20.12e} {:>12.3e} {:>12.3e}  {}\n",
                r.variable,
                r.zone,
                r.step,
                r.fd,
                r.ad,
                r.difference(),
                r.bound,
                if r.within() { "yes" } else { "NO" }
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{GradientAssembler, GradientEntry};
    use sd_config::DvKind;

    #[test]
    fn test_rows_follow_variables() {
        let z = ZoneIndex::new(0);
        let dvs = vec![
            DesignVariable::new(0, DvKind::Scale, z, vec![]).with_step(1e-3),
            DesignVariable::new(1, DvKind::Scale, z, vec![]).with_step(1e-3),
        ];
        let fd = GradientAssembler::assemble([
            GradientEntry::new(0, z, 1.0 + 1e-4),
            GradientEntry::new(1, z, 2.5),
        ])
        .unwrap();
        let ad = GradientAssembler::assemble([
            GradientEntry::new(0, z, 1.0),
            GradientEntry::new(1, z, 2.0),
        ])
        .unwrap();
        let cmp = GradientComparison::compare(&fd, &ad, &dvs, &FdTolerance::default()).unwrap();
        assert_eq!(cmp.rows().len(), 2);
        assert!(cmp.rows()[0].within());
        assert!(!cmp.rows()[1].within());
        assert!(!cmp.all_within());
        assert_eq!(cmp.failures().count(), 1);
        assert!((cmp.max_difference() - 0.5).abs() < 1e-12);
        assert_eq!(cmp.to_table().lines().count(), 3);
    }

    #[test]
    fn test_compare_non_prefix_indices() {
        let z = ZoneIndex::new(0);
        let dvs = vec![
            DesignVariable::new(3, DvKind::Scale, z, vec![]).with_step(1e-3),
            DesignVariable::new(1, DvKind::Scale, z, vec![]).with_step(1e-3),
        ];
        let fd = GradientAssembler::assemble([
            GradientEntry::new(1, z, 2.0),
            GradientEntry::new(3, z, 7.0),
        ])
        .unwrap();
        let ad = fd.clone();
        let cmp = GradientComparison::compare(&fd, &ad, &dvs, &FdTolerance::default()).unwrap();
        assert_eq!(cmp.rows()[0].variable, 3);
        assert_eq!(cmp.rows()[0].fd, 7.0);
        assert_eq!(cmp.rows()[1].ad, 2.0);
        assert!(cmp.all_within());
    }
}
