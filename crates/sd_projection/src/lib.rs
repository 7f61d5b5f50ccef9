// crates/sd_projection/src/lib.rs

//! SensDot 灵敏度投影 (Layer 4)
//!
//! 把表面节点灵敏度经参数化变形的链式法则投影到设计变量梯度。
//!
//! # 模块
//!
//! - [`design`]: 设计变量
//! - [`deformer`]: 表面变形器接口
//! - [`parametric`]: 参数化变形器（平移、缩放、旋转、Hicks-Henne）
//! - [`fd`]: 单侧有限差分投影
//! - [`ad`]: 按分区反向累加的算法微分投影
//! - [`projector`]: 策略选择
//! - [`assembler`]: 梯度汇总与排序
//! - [`reporter`]: 梯度报告
//! - [`compare`]: FD/AD 比较
//!
//! # 数据流
//!
//! ```text
//! SensitivityStore ─┐
//!                   ├─> Projector {FD | AD} ─> GradientAssembler ─> GradientReporter
//! SurfaceDeformer ──┘
//! ```
//!
//! # 使用示例
//!
//! ```
//! use sd_config::{DvKind, ParallelConfig, ProjectionMethod};
//! use sd_foundation::GeomDim;
//! use sd_projection::{DesignVariable, GradientReporter, ParametricDeformer, Projector};
//! use sd_sensitivity::{SensitivityStore, SurfaceField};
//!
//! let mut store = SensitivityStore::new();
//! let z = store.add_zone(GeomDim::Two);
//! let zone = store.zone_mut(z).unwrap();
//! let wall = zone.add_marker("wall").unwrap();
//! let n0 = zone.add_surface_node(0, wall, &[0.0, 0.0]).unwrap();
//! let mut field = SurfaceField::new(GeomDim::Two);
//! field.insert(n0, &[2.0, 0.0]).unwrap();
//! zone.set_surface_field(field).unwrap();
//!
//! let dvs = vec![DesignVariable::new(0, DvKind::Translation, z, vec![1.0, 0.0])];
//! let projector = Projector::from_method(ProjectionMethod::Algorithmic, ParallelConfig::default());
//! let gradient = projector.project(&dvs, &store, &ParametricDeformer::new(&store)).unwrap();
//! assert_eq!(gradient.entries()[0].value, 2.0);
//!
//! let report = GradientReporter::default().report(&gradient, &dvs).unwrap();
//! assert_eq!(report.lines().count(), 3);
//! ```

#![warn(clippy::all)]

pub mod ad;
pub mod assembler;
pub mod compare;
pub mod deformer;
pub mod design;
pub mod error;
pub mod fd;
pub mod parametric;
pub mod projector;
pub mod reporter;

// 重导出常用类型
pub use ad::AdProjector;
pub use assembler::{GradientAssembler, GradientEntry, GradientVector};
pub use compare::{ComparisonRow, GradientComparison};
pub use deformer::{DeformedNode, SurfaceDeformer};
pub use design::DesignVariable;
pub use error::{ProjectionError, ProjectionResult};
pub use fd::FdProjector;
pub use parametric::ParametricDeformer;
pub use projector::Projector;
pub use reporter::{GradientReporter, GRADIENT_CSV_HEADER};
