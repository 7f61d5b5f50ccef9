// crates/sd_sensitivity/src/export.rs

//! 表面灵敏度 CSV 导出器
//!
//! 每个表面节点一行，列为分区、全局编号、边界标记、坐标、灵敏度分量及其模长，
//! 用于在后处理工具中查看灵敏度分布。2D 分区的 z 列恒为 0。

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::SensResult;
use crate::store::SensitivityStore;

/// CSV 表头
pub const SURFACE_CSV_HEADER: &str =
    "\"ZONE\",\"POINT\",\"MARKER\",\"x\",\"y\",\"z\",\"Sens_x\",\"Sens_y\",\"Sens_z\",\"Sens_Mag\"";

/// 默认有效数字位数
const DEFAULT_PRECISION: usize = 10;

/// 表面灵敏度 CSV 导出器
#[derive(Debug, Clone)]
pub struct SurfaceCsvExporter {
    /// 科学计数法小数位数
    precision: usize,
    /// 是否跳过无显式灵敏度值的节点
    skip_missing: bool,
}

impl Default for SurfaceCsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceCsvExporter {
    /// 创建导出器
    pub fn new() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            skip_missing: false,
        }
    }

    /// 设置小数位数
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// 只导出场中有显式值的节点
    pub fn skip_missing(mut self, skip: bool) -> Self {
        self.skip_missing = skip;
        self
    }

    /// 导出到文件，返回写出的行数
    pub fn export(&self, path: impl AsRef<Path>, store: &SensitivityStore) -> SensResult<usize> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        let rows = self.write(&mut w, store)?;
        w.flush()?;
        info!("表面灵敏度已导出: {} ({} 行)", path.display(), rows);
        Ok(rows)
    }

    /// 写出全部分区的表面节点
    pub fn write<W: Write>(&self, w: &mut W, store: &SensitivityStore) -> SensResult<usize> {
        writeln!(w, "{SURFACE_CSV_HEADER}")?;
        let p = self.precision;
        let mut rows = 0;
        for zone in store.zones() {
            let field = zone.surface_field();
            for (idx, node) in zone.surface_nodes().iter() {
                if self.skip_missing && !field.contains(idx) {
                    continue;
                }
                let s = field.get(idx);
                let marker = zone.marker_name(node.marker).unwrap_or("-");
                let x = node.coords;
                writeln!(
                    w,
                    "{},{},\"{}\",{:.p$e},{:.p$e},{:.p$e},{:.p$e},{:.p$e},{:.p$e},{:.p$e}",
                    zone.id(),
                    node.global_id,
                    marker,
                    x.x,
                    x.y,
                    x.z,
                    s.x,
                    s.y,
                    s.z,
                    s.length(),
                )?;
                rows += 1;
            }
        }
        Ok(rows)
    }
}
