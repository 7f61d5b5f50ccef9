// crates/sd_projection/src/reporter.rs

//! 梯度报告
//!
//! 每个设计变量固定一行，列顺序稳定，数值使用 `{:+.12e}`，与区域设置无关。
//! 没有收到贡献的设计变量输出零行而不是省略，下游优化器总能读到完整的定长表。
//!
//! ```text
//! # gradient (fd)
//! VARIABLE KIND          ZONE MARKER           GRADIENT
//!        0 TRANSLATION      0 airfoil          +1.000000000000e0
//! ```

use std::fs;
use std::path::Path;

use sd_config::{ProjectionMethod, ReportFormat};
use tracing::info;

use crate::assembler::GradientVector;
use crate::design::DesignVariable;
use crate::error::ProjectionResult;

/// CSV 表头
pub const GRADIENT_CSV_HEADER: &str =
    "\"VARIABLE\",\"KIND\",\"ZONE\",\"MARKER\",\"GRADIENT\",\"FINDIFF_STEP\"";

/// 梯度报告器
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientReporter {
    format: ReportFormat,
    method: ProjectionMethod,
}

impl GradientReporter {
    /// 创建报告器
    pub fn new(format: ReportFormat, method: ProjectionMethod) -> Self {
        Self { format, method }
    }

    /// 生成报告文本
    pub fn report(&self, gradient: &GradientVector, variables: &[DesignVariable]) -> ProjectionResult<String> {
        let indices: Vec<usize> = variables.iter().map(DesignVariable::index).collect();
        let totals = gradient.totals(&indices)?;
        Ok(match self.format {
            ReportFormat::Table => self.table(&totals, variables),
            ReportFormat::Csv => self.csv(&totals, variables),
        })
    }

    /// 写出报告文件
    ///
    /// 报告先完整生成再写出，失败时不留下部分文件。
    pub fn write_file<P: AsRef<Path>>(
        &self,
        path: P,
        gradient: &GradientVector,
        variables: &[DesignVariable],
    ) -> ProjectionResult<()> {
        let path = path.as_ref();
        let text = self.report(gradient, variables)?;
        fs::write(path, text)?;
        info!("梯度报告已写出: {} ({} 行)", path.display(), variables.len());
        Ok(())
    }

    fn table(&self, totals: &[f64], variables: &[DesignVariable]) -> String {
        let mut out = String::new();
        out.push_str(&format!("# gradient ({})\n", self.method));
        out.push_str(&format!(
            "{:>8} {:<13} {:>4} {:<16} {:>20}\n",
            "VARIABLE", "KIND", "ZONE", "MARKER", "GRADIENT"
        ));
        for (v, value) in variables.iter().zip(totals) {
            out.push_str(&format!(
                "{:>8} {:<13} {:>4} {:<16} {:>20}\n",
                v.index(),
                v.kind().name(),
                v.zone(),
                v.marker_label(),
                format!("{value:+.12e}")
            ));
        }
        out
    }

    fn csv(&self, totals: &[f64], variables: &[DesignVariable]) -> String {
        let mut out = String::new();
        out.push_str(GRADIENT_CSV_HEADER);
        out.push('\n');
        for (v, value) in variables.iter().zip(totals) {
            let step = if self.method.uses_step() { v.step() } else { 0.0 };
            out.push_str(&format!(
                "{},\"{}\",{},\"{}\",{:+.12e},{:e}\n",
                v.index(),
                v.kind().name(),
                v.zone(),
                v.marker_label(),
                value,
                step
            ));
        }
        out
    }
}
