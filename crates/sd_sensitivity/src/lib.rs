// crates/sd_sensitivity/src/lib.rs

//! SensDot 灵敏度存储
//!
//! 上游伴随求解器与投影阶段之间的数据边界。
//!
//! # 模块
//!
//! - [`field`]: 按局部节点索引存储的灵敏度场
//! - [`zone`]: 分区上下文（标记、表面节点、两类灵敏度场）
//! - [`store`]: 多分区有序集合
//! - [`record`]: 灵敏度记录文件读写
//! - [`export`]: 表面灵敏度 CSV 导出
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use sd_sensitivity::{SensitivityFileReader, SensitivityFileWriter};
//!
//! let store = SensitivityFileReader::read_file("surface.sens")?;
//! SensitivityFileWriter::write_file("copy.sens", &store, store.n_zones())?;
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod export;
pub mod field;
pub mod record;
pub mod store;
pub mod zone;

// 重导出常用类型
pub use error::{SensResult, SensitivityError};
pub use export::{SurfaceCsvExporter, SURFACE_CSV_HEADER};
pub use field::{FieldKind, SensitivityField};
pub use record::{SensitivityFileReader, SensitivityFileWriter};
pub use store::SensitivityStore;
pub use zone::{Marker, SurfaceNode, ZoneContext, ZoneSummary};

/// 表面灵敏度场
pub type SurfaceField = SensitivityField<sd_foundation::SurfaceNodeTag>;
/// 体灵敏度场
pub type VolumeField = SensitivityField<sd_foundation::VolumeNodeTag>;
