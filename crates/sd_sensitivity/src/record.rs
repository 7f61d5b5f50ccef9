// crates/sd_sensitivity/src/record.rs

//! 灵敏度记录文件读写
//!
//! 上游伴随求解器与投影阶段之间的持久化契约。每个分区、每类场一个段落，
//! 段落以数量头开始，读取方可在使用前校验完整性；数量为 0 的段落写出显式的
//! `EMPTY` 标记，文件中的分区数始终等于调用方给出的 `zone_count`。
//!
//! # 文件格式 (v1)
//!
//! ```text
//! SDSENS 1
//! NZONE <n>
//! ZONE <id> DIM <2|3>
//! MARKERS <m>                 m 行 "<idx> <name>"，或 EMPTY
//! SURFACE_NODES <k>           k 行 "<local> <global> <marker> <x> <y> [z]"，或 EMPTY
//! SURFACE_SENSITIVITY <k>     k 行 "<local> <sx> <sy> [sz]"，或 EMPTY
//! VOLUME_NODES <n>
//! VOLUME_SENSITIVITY <k>      k 行 "<local> <sx> <sy> [sz]"，或 EMPTY
//! END_ZONE
//! ...
//! END
//! ```
//!
//! 实数使用 `{:e}` 写出（最短可精确回读表示），读回后逐位相同。

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use glam::DVec3;
use sd_foundation::{GeomDim, Idx, IndexKind, MarkerIndex, SurfaceNodeTag, VolumeNodeTag, ZoneIndex};
use tracing::{debug, info};

use crate::error::{SensResult, SensitivityError};
use crate::field::{vector_components, SensitivityField};
use crate::store::SensitivityStore;

/// 文件魔数
const RECORD_MAGIC: &str = "SDSENS";

/// 文件格式版本
const RECORD_VERSION: u32 = 1;

/// 空段落标记
const EMPTY_MARKER: &str = "EMPTY";

// ============================================================
// 写出
// ============================================================

/// 灵敏度记录写出器
#[derive(Debug, Default, Clone, Copy)]
pub struct SensitivityFileWriter;

impl SensitivityFileWriter {
    /// 写出全部分区到文件
    pub fn write_file<P: AsRef<Path>>(
        path: P,
        store: &SensitivityStore,
        zone_count: usize,
    ) -> SensResult<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write(&mut writer, store, zone_count)?;
        writer.flush()?;
        info!("灵敏度记录已写出: {} ({} 个分区)", path.display(), zone_count);
        Ok(())
    }

    /// 写出全部分区
    ///
    /// `zone_count` 必须等于存储中的分区数：更大时报告第一个缺失分区，
    /// 更小时报告分区数不匹配。校验在写出任何内容之前完成。
    pub fn write<W: Write>(w: &mut W, store: &SensitivityStore, zone_count: usize) -> SensResult<()> {
        let n_zones = store.n_zones();
        if zone_count > n_zones {
            return Err(SensitivityError::MissingZone {
                zone: ZoneIndex::from_usize(n_zones),
                n_zones,
            });
        }
        if zone_count < n_zones {
            return Err(SensitivityError::ZoneCountMismatch {
                expected: zone_count,
                actual: n_zones,
            });
        }

        writeln!(w, "{RECORD_MAGIC} {RECORD_VERSION}")?;
        writeln!(w, "NZONE {zone_count}")?;

        for zone in store.zones() {
            let dim = zone.dim();
            writeln!(w, "ZONE {} DIM {}", zone.id(), dim)?;

            // 边界标记
            writeln!(w, "MARKERS {}", zone.markers().len())?;
            if zone.markers().is_empty() {
                writeln!(w, "{EMPTY_MARKER}")?;
            }
            for (idx, marker) in zone.markers().iter() {
                writeln!(w, "{} {}", idx, marker.name)?;
            }

            // 表面节点
            writeln!(w, "SURFACE_NODES {}", zone.n_surface_nodes())?;
            if zone.n_surface_nodes() == 0 {
                writeln!(w, "{EMPTY_MARKER}")?;
            }
            for (idx, node) in zone.surface_nodes().iter() {
                write!(w, "{} {} {}", idx, node.global_id, node.marker)?;
                write_components(w, dim, node.coords)?;
                writeln!(w)?;
            }

            write_field(w, "SURFACE_SENSITIVITY", zone.surface_field())?;

            writeln!(w, "VOLUME_NODES {}", zone.n_volume_nodes())?;
            write_field(w, "VOLUME_SENSITIVITY", zone.volume_field())?;

            writeln!(w, "END_ZONE")?;
            debug!(
                "zone {}: {} 表面节点, {} 表面灵敏度, {} 体灵敏度",
                zone.id(),
                zone.n_surface_nodes(),
                zone.surface_field().len(),
                zone.volume_field().len()
            );
        }

        writeln!(w, "END")?;
        Ok(())
    }
}

fn write_components<W: Write>(w: &mut W, dim: GeomDim, v: DVec3) -> SensResult<()> {
    for c in vector_components(dim, v) {
        write!(w, " {c:e}")?;
    }
    Ok(())
}

fn write_field<W: Write, Tag: IndexKind>(
    w: &mut W,
    header: &str,
    field: &SensitivityField<Tag>,
) -> SensResult<()> {
    writeln!(w, "{header} {}", field.len())?;
    if field.is_empty() {
        writeln!(w, "{EMPTY_MARKER}")?;
    }
    for (idx, v) in field.iter() {
        write!(w, "{idx}")?;
        write_components(w, field.dim(), v)?;
        writeln!(w)?;
    }
    Ok(())
}

// ============================================================
// 读取
// ============================================================

/// 灵敏度记录读取器
#[derive(Debug, Default, Clone, Copy)]
pub struct SensitivityFileReader;

impl SensitivityFileReader {
    /// 从文件读取
    pub fn read_file<P: AsRef<Path>>(path: P) -> SensResult<SensitivityStore> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let store = Self::read(BufReader::new(file))?;
        info!(
            "灵敏度记录已读取: {} ({} 个分区, {} 个表面节点)",
            path.display(),
            store.n_zones(),
            store.total_surface_nodes()
        );
        Ok(store)
    }

    /// 读取并重建存储
    pub fn read<R: BufRead>(reader: R) -> SensResult<SensitivityStore> {
        let mut lines = LineCursor::new(reader)?;

        let (line, header) = lines.next_line()?;
        let mut tokens = header.split_whitespace();
        if tokens.next() != Some(RECORD_MAGIC) {
            return Err(SensitivityError::format(line, "缺少 SDSENS 文件头"));
        }
        let version: u32 = parse_token(tokens.next(), line, "版本号")?;
        if version != RECORD_VERSION {
            return Err(SensitivityError::format(
                line,
                format!("不支持的版本 {version}, 当前版本 {RECORD_VERSION}"),
            ));
        }

        let n_zones = lines.expect_count("NZONE")?;
        let mut store = SensitivityStore::new();

        for expected_id in 0..n_zones {
            read_zone(&mut lines, &mut store, expected_id)?;
        }

        let (line, tail) = lines.next_line()?;
        if tail != "END" {
            return Err(SensitivityError::format(line, format!("期望 END, 实际 '{tail}'")));
        }
        Ok(store)
    }
}

fn read_zone<R: BufRead>(
    lines: &mut LineCursor<R>,
    store: &mut SensitivityStore,
    expected_id: usize,
) -> SensResult<()> {
    // ZONE <id> DIM <d>
    let (line, text) = lines.next_line()?;
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 4 || tokens[0] != "ZONE" || tokens[2] != "DIM" {
        return Err(SensitivityError::format(line, format!("期望 'ZONE <id> DIM <d>', 实际 '{text}'")));
    }
    let id: usize = parse_token(Some(tokens[1]), line, "分区编号")?;
    if id != expected_id {
        return Err(SensitivityError::format(
            line,
            format!("分区编号不连续: 期望 {expected_id}, 实际 {id}"),
        ));
    }
    let n_dim: usize = parse_token(Some(tokens[3]), line, "维度")?;
    let dim = GeomDim::from_components(n_dim)
        .ok_or_else(|| SensitivityError::format(line, format!("无效维度 {n_dim}")))?;
    let n = dim.n_components();

    let zone_id = store.add_zone(dim);
    let zone = store.zone_mut(zone_id)?;

    // 边界标记
    let n_markers = lines.expect_count("MARKERS")?;
    lines.expect_empty_if_zero(n_markers)?;
    for i in 0..n_markers {
        let (line, text) = lines.next_line()?;
        let mut parts = text.splitn(2, char::is_whitespace);
        let idx: usize = parse_token(parts.next(), line, "标记索引")?;
        let name = parts.next().map(str::trim).unwrap_or_default();
        if idx != i || name.is_empty() {
            return Err(SensitivityError::format(line, format!("无效的标记行 '{text}'")));
        }
        let marker = zone
            .add_marker(name)
            .map_err(|e| SensitivityError::format(line, e.to_string()))?;
        if marker.as_usize() != i {
            return Err(SensitivityError::format(line, format!("重复的标记名 '{name}'")));
        }
    }

    // 表面节点
    let n_nodes = lines.expect_count("SURFACE_NODES")?;
    lines.expect_empty_if_zero(n_nodes)?;
    for i in 0..n_nodes {
        let (line, text) = lines.next_line()?;
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != 3 + n {
            return Err(SensitivityError::format(
                line,
                format!("表面节点行应有 {} 列, 实际 {}", 3 + n, tokens.len()),
            ));
        }
        let local: usize = parse_token(Some(tokens[0]), line, "局部索引")?;
        if local != i {
            return Err(SensitivityError::format(line, format!("局部索引不连续: 期望 {i}, 实际 {local}")));
        }
        let global_id: u64 = parse_token(Some(tokens[1]), line, "全局编号")?;
        let marker: u32 = parse_token(Some(tokens[2]), line, "标记索引")?;
        let coords = parse_reals(&tokens[3..], line)?;
        zone.add_surface_node(global_id, MarkerIndex::new(marker), &coords)?;
    }

    let surface = read_field::<R, SurfaceNodeTag>(lines, "SURFACE_SENSITIVITY", dim)?;
    zone.set_surface_field(surface)?;

    let n_volume = lines.expect_count("VOLUME_NODES")?;
    zone.set_volume_node_count(n_volume)?;
    let volume = read_field::<R, VolumeNodeTag>(lines, "VOLUME_SENSITIVITY", dim)?;
    zone.set_volume_field(volume)?;

    let (line, text) = lines.next_line()?;
    if text != "END_ZONE" {
        return Err(SensitivityError::format(line, format!("期望 END_ZONE, 实际 '{text}'")));
    }
    Ok(())
}

fn read_field<R: BufRead, Tag: IndexKind>(
    lines: &mut LineCursor<R>,
    header: &str,
    dim: GeomDim,
) -> SensResult<SensitivityField<Tag>> {
    let count = lines.expect_count(header)?;
    lines.expect_empty_if_zero(count)?;
    let n = dim.n_components();
    let mut field = SensitivityField::new(dim);
    for _ in 0..count {
        let (line, text) = lines.next_line()?;
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != 1 + n {
            return Err(SensitivityError::dimension_mismatch(
                format!("第{line}行 {header}"),
                n,
                tokens.len().saturating_sub(1),
            ));
        }
        let node: u32 = parse_token(Some(tokens[0]), line, "节点索引")?;
        let values = parse_reals(&tokens[1..], line)?;
        let idx: Idx<Tag> = Idx::new(node);
        if field.contains(idx) {
            return Err(SensitivityError::format(line, format!("{header} 中节点 {node} 重复")));
        }
        field.insert(idx, &values)?;
    }
    Ok(field)
}

fn parse_token<T: std::str::FromStr>(token: Option<&str>, line: usize, what: &str) -> SensResult<T> {
    let token = token.ok_or_else(|| SensitivityError::format(line, format!("缺少{what}")))?;
    token
        .parse()
        .map_err(|_| SensitivityError::format(line, format!("无法解析{what} '{token}'")))
}

fn parse_reals(tokens: &[&str], line: usize) -> SensResult<Vec<f64>> {
    tokens
        .iter()
        .map(|t| parse_token::<f64>(Some(t), line, "实数"))
        .collect()
}

/// 带行号的逐行读取，跳过空行与 `#` 注释
struct LineCursor<R: BufRead> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> LineCursor<R> {
    fn new(reader: R) -> SensResult<Self> {
        Ok(Self {
            lines: reader.lines(),
            line_no: 0,
        })
    }

    fn next_line(&mut self) -> SensResult<(usize, String)> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Ok((self.line_no, trimmed.to_string()));
        }
        Err(SensitivityError::format(self.line_no + 1, "文件意外结束"))
    }

    /// 读取 "<KEYWORD> <count>" 行
    fn expect_count(&mut self, keyword: &str) -> SensResult<usize> {
        let (line, text) = self.next_line()?;
        let mut tokens = text.split_whitespace();
        if tokens.next() != Some(keyword) {
            return Err(SensitivityError::format(line, format!("期望 {keyword}, 实际 '{text}'")));
        }
        let count = parse_token(tokens.next(), line, "数量")?;
        if tokens.next().is_some() {
            return Err(SensitivityError::format(line, format!("{keyword} 行多余内容")));
        }
        Ok(count)
    }

    /// 数量为 0 的段落必须跟随 EMPTY 标记
    fn expect_empty_if_zero(&mut self, count: usize) -> SensResult<()> {
        if count == 0 {
            let (line, text) = self.next_line()?;
            if text != EMPTY_MARKER {
                return Err(SensitivityError::format(line, format!("空段落缺少 EMPTY 标记, 实际 '{text}'")));
            }
        }
        Ok(())
    }
}
