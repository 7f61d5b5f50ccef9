// crates/sd_projection/tests/projection_properties.rs

//! FD/AD 投影端到端性质测试

use std::sync::atomic::{AtomicUsize, Ordering};

use glam::DVec3;
use sd_config::{DvKind, ParallelConfig, ParallelStrategy, ProjectionMethod};
use sd_foundation::{FdTolerance, GeomDim, SurfaceNodeIndex, SurfaceNodeTag, ZoneIndex};
use sd_projection::{
    AdProjector, DeformedNode, DesignVariable, FdProjector, GradientComparison, GradientReporter,
    ParametricDeformer, ProjectionError, ProjectionResult, Projector, SurfaceDeformer,
};
use sd_sensitivity::{SensitivityField, SensitivityStore, SurfaceField, ZoneContext};

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn parallel_always() -> ParallelConfig {
    ParallelConfig {
        strategy: ParallelStrategy::Parallel,
        min_parallel_size: 1,
    }
}

/// 2D 翼型状分区：上下两条边界，节点 x ∈ [0, 1]
fn airfoil_zone(store: &mut SensitivityStore, sens: impl Fn(f64, f64) -> [f64; 2]) -> ZoneIndex {
    let z = store.add_zone(GeomDim::Two);
    let zone = store.zone_mut(z).unwrap();
    let upper = zone.add_marker("upper").unwrap();
    let lower = zone.add_marker("lower").unwrap();
    let mut field = SurfaceField::new(GeomDim::Two);
    let n = 11;
    for i in 0..n {
        let x = i as f64 / (n - 1) as f64;
        let y = 0.1 * (std::f64::consts::PI * x).sin();
        let a = zone.add_surface_node(2 * i as u64, upper, &[x, y]).unwrap();
        field.insert(a, &sens(x, y)).unwrap();
        let b = zone.add_surface_node(2 * i as u64 + 1, lower, &[x, -y]).unwrap();
        field.insert(b, &sens(x, -y)).unwrap();
    }
    zone.set_surface_field(field).unwrap();
    z
}

/// 3D 分区：单位立方体的 8 个顶点
fn cube_zone(store: &mut SensitivityStore, sens: [f64; 3]) -> ZoneIndex {
    let z = store.add_zone(GeomDim::Three);
    let zone = store.zone_mut(z).unwrap();
    let wall = zone.add_marker("body").unwrap();
    let mut field = SurfaceField::new(GeomDim::Three);
    for i in 0..8u64 {
        let p = [(i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64];
        let n = zone.add_surface_node(100 + i, wall, &p).unwrap();
        field.insert(n, &sens).unwrap();
    }
    zone.set_surface_field(field).unwrap();
    z
}

fn mixed_variables(z2: ZoneIndex, z3: ZoneIndex) -> Vec<DesignVariable> {
    vec![
        DesignVariable::new(0, DvKind::Translation, z2, vec![0.0, 1.0]).with_markers(["upper"]),
        DesignVariable::new(1, DvKind::Rotation, z3, vec![0.5, 0.5, 0.0, 0.5, 0.5, 1.0]),
        DesignVariable::new(2, DvKind::HicksHenne, z2, vec![1.0, 0.3]).with_markers(["upper"]),
        DesignVariable::new(3, DvKind::Scale, z3, vec![0.5, 0.5, 0.5]),
        DesignVariable::new(4, DvKind::Rotation, z2, vec![0.25, 0.0]),
        DesignVariable::new(5, DvKind::Scale, z2, vec![]).with_markers(["lower"]),
    ]
}

// ============================================================
// 零灵敏度
// ============================================================

#[test]
fn test_zero_field_gives_zero_gradient() {
    let mut store = SensitivityStore::new();
    let z2 = airfoil_zone(&mut store, |_, _| [0.0, 0.0]);
    let z3 = cube_zone(&mut store, [0.0, 0.0, 0.0]);
    let dvs = mixed_variables(z2, z3);
    let deformer = ParametricDeformer::new(&store);

    for method in [ProjectionMethod::FiniteDifference, ProjectionMethod::Algorithmic] {
        let g = Projector::from_method(method, ParallelConfig::default())
            .project(&dvs, &store, &deformer)
            .unwrap();
        assert_eq!(g.len(), dvs.len(), "{method}");
        assert!(g.iter().all(|e| e.value == 0.0), "{method}");
    }
}

#[test]
fn test_empty_field_gives_zero_gradient() {
    let mut store = SensitivityStore::new();
    let z2 = airfoil_zone(&mut store, |_, _| [0.0, 0.0]);
    store
        .zone_mut(z2)
        .unwrap()
        .set_surface_field(SensitivityField::new(GeomDim::Two))
        .unwrap();
    let dvs = vec![DesignVariable::new(0, DvKind::Scale, z2, vec![])];
    let deformer = ParametricDeformer::new(&store);
    let fd = FdProjector::default().project(&dvs, &store, &deformer).unwrap();
    let ad = AdProjector::default().project(&dvs, &store, &deformer).unwrap();
    assert_eq!(fd.entries()[0].value, 0.0);
    assert_eq!(ad.entries()[0].value, 0.0);
}

// ============================================================
// FD 与 AD 一致性
// ============================================================

#[test]
fn test_linear_deformation_fd_matches_ad() {
    let mut store = SensitivityStore::new();
    let z2 = airfoil_zone(&mut store, |_, _| [0.3, -1.2]);
    let z3 = cube_zone(&mut store, [0.7, 0.1, -0.4]);
    let dvs: Vec<DesignVariable> = vec![
        DesignVariable::new(0, DvKind::Translation, z2, vec![1.0, 2.0]),
        DesignVariable::new(1, DvKind::Scale, z2, vec![0.25, 0.0]).with_markers(["lower"]),
        DesignVariable::new(2, DvKind::HicksHenne, z2, vec![0.0, 0.7]).with_markers(["lower"]),
        DesignVariable::new(3, DvKind::Translation, z3, vec![0.0, 0.0, 1.0]),
        DesignVariable::new(4, DvKind::Scale, z3, vec![]),
    ]
    .into_iter()
    .map(|v| v.with_step(1e-5))
    .collect();
    let deformer = ParametricDeformer::new(&store);

    let fd = FdProjector::default().project(&dvs, &store, &deformer).unwrap();
    let ad = AdProjector::default().project(&dvs, &store, &deformer).unwrap();
    let cmp = GradientComparison::compare(&fd, &ad, &dvs, &FdTolerance::default()).unwrap();
    assert!(cmp.all_within(), "\n{}", cmp.to_table());
    // 线性变形只有舍入误差
    assert!(cmp.max_difference() < 1e-8, "\n{}", cmp.to_table());
    // 平移: 22 个节点 · dot((1,2), (0.3,-1.2))
    assert!(approx_eq(ad.entries()[0].value, 22.0 * (0.3 - 2.4), 1e-12));
}

#[test]
fn test_rotation_discrepancy_shrinks_with_step() {
    let mut store = SensitivityStore::new();
    let z2 = airfoil_zone(&mut store, |_, _| [1.0, 0.5]);
    let z3 = cube_zone(&mut store, [1.0, -0.5, 0.25]);
    let deformer = ParametricDeformer::new(&store);

    let rotations = |step: f64| {
        vec![
            DesignVariable::new(0, DvKind::Rotation, z2, vec![0.25, 0.0]).with_step(step),
            DesignVariable::new(1, DvKind::Rotation, z3, vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0])
                .with_step(step),
        ]
    };

    let discrepancy = |step: f64| -> Vec<f64> {
        let dvs = rotations(step);
        let fd = FdProjector::default().project(&dvs, &store, &deformer).unwrap();
        let ad = AdProjector::default().project(&dvs, &store, &deformer).unwrap();
        let cmp = GradientComparison::compare(&fd, &ad, &dvs, &FdTolerance::default()).unwrap();
        assert!(cmp.all_within(), "\n{}", cmp.to_table());
        cmp.rows().iter().map(|r| r.difference()).collect()
    };

    let coarse = discrepancy(1e-3);
    let fine = discrepancy(1e-4);
    for (c, f) in coarse.iter().zip(&fine) {
        assert!(*c > 0.0);
        let ratio = c / f;
        assert!(ratio > 8.0 && ratio < 12.0, "ratio = {ratio}");
    }
}

// ============================================================
// 具体场景
// ============================================================

/// 只在变量 0 下把节点 0 沿 x 移动 step
struct SingleNodeDeformer<'a> {
    store: &'a SensitivityStore,
}

impl SurfaceDeformer for SingleNodeDeformer<'_> {
    fn apply_perturbation(
        &self,
        variable: &DesignVariable,
        step: f64,
    ) -> ProjectionResult<Vec<DeformedNode>> {
        let zone = self.store.zone(variable.zone())?;
        Ok(zone
            .surface_nodes()
            .iter()
            .map(|(idx, node)| {
                let moved = variable.index() == 0 && idx.index() == 0;
                let coords = if moved { node.coords + DVec3::new(step, 0.0, 0.0) } else { node.coords };
                DeformedNode::new(idx, coords)
            })
            .collect())
    }

    fn accumulate_adjoint(
        &self,
        _zone: &ZoneContext,
        seed: &SensitivityField<SurfaceNodeTag>,
        variables: &[&DesignVariable],
    ) -> ProjectionResult<Vec<f64>> {
        Ok(variables
            .iter()
            .map(|v| if v.index() == 0 { seed.get(SurfaceNodeIndex::new(0)).x } else { 0.0 })
            .collect())
    }
}

fn four_node_store() -> SensitivityStore {
    let mut store = SensitivityStore::new();
    let z = store.add_zone(GeomDim::Two);
    let zone = store.zone_mut(z).unwrap();
    let wall = zone.add_marker("wall").unwrap();
    let coords = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let sens = [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]];
    let mut field = SurfaceField::new(GeomDim::Two);
    for (i, (c, s)) in coords.iter().zip(&sens).enumerate() {
        let n = zone.add_surface_node(i as u64, wall, c).unwrap();
        field.insert(n, s).unwrap();
    }
    zone.set_surface_field(field).unwrap();
    store
}

#[test]
fn test_single_node_scenario() {
    let store = four_node_store();
    let z = ZoneIndex::new(0);
    let dvs: Vec<DesignVariable> = (0..3)
        .map(|i| DesignVariable::new(i, DvKind::Translation, z, vec![1.0, 0.0]).with_step(1e-6))
        .collect();
    let deformer = SingleNodeDeformer { store: &store };

    let fd = FdProjector::default().project(&dvs, &store, &deformer).unwrap();
    assert_eq!(fd.len(), 3);
    assert!(approx_eq(fd.entries()[0].value, 1.0, 1e-9));
    assert_eq!(fd.entries()[1].value, 0.0);
    assert_eq!(fd.entries()[2].value, 0.0);

    let ad = AdProjector::default().project(&dvs, &store, &deformer).unwrap();
    assert_eq!(ad.entries()[0].value, 1.0);
}

// ============================================================
// 调用约定
// ============================================================

/// 记录调用次数的变形器
struct CountingDeformer<'a> {
    inner: ParametricDeformer<'a>,
    perturbations: AtomicUsize,
    adjoint_passes: AtomicUsize,
}

impl<'a> CountingDeformer<'a> {
    fn new(store: &'a SensitivityStore) -> Self {
        Self {
            inner: ParametricDeformer::new(store),
            perturbations: AtomicUsize::new(0),
            adjoint_passes: AtomicUsize::new(0),
        }
    }
}

impl SurfaceDeformer for CountingDeformer<'_> {
    fn apply_perturbation(
        &self,
        variable: &DesignVariable,
        step: f64,
    ) -> ProjectionResult<Vec<DeformedNode>> {
        self.perturbations.fetch_add(1, Ordering::SeqCst);
        self.inner.apply_perturbation(variable, step)
    }

    fn accumulate_adjoint(
        &self,
        zone: &ZoneContext,
        seed: &SensitivityField<SurfaceNodeTag>,
        variables: &[&DesignVariable],
    ) -> ProjectionResult<Vec<f64>> {
        self.adjoint_passes.fetch_add(1, Ordering::SeqCst);
        self.inner.accumulate_adjoint(zone, seed, variables)
    }
}

#[test]
fn test_ad_one_pass_per_zone() {
    let mut store = SensitivityStore::new();
    let z2 = airfoil_zone(&mut store, |x, y| [x, y]);
    let z3 = cube_zone(&mut store, [1.0, 1.0, 1.0]);
    // 第三个分区没有设计变量
    airfoil_zone(&mut store, |_, _| [1.0, 0.0]);
    let dvs = mixed_variables(z2, z3);

    for parallel in [ParallelConfig::sequential(), parallel_always()] {
        let deformer = CountingDeformer::new(&store);
        let g = AdProjector::new(parallel).project(&dvs, &store, &deformer).unwrap();
        assert_eq!(g.len(), dvs.len());
        assert_eq!(deformer.adjoint_passes.load(Ordering::SeqCst), 2);
        assert_eq!(deformer.perturbations.load(Ordering::SeqCst), 0);
    }
}

#[test]
fn test_fd_two_evaluations_per_variable() {
    let mut store = SensitivityStore::new();
    let z2 = airfoil_zone(&mut store, |x, y| [x, y]);
    let z3 = cube_zone(&mut store, [1.0, 1.0, 1.0]);
    let dvs = mixed_variables(z2, z3);
    let deformer = CountingDeformer::new(&store);
    FdProjector::new(parallel_always()).project(&dvs, &store, &deformer).unwrap();
    assert_eq!(deformer.perturbations.load(Ordering::SeqCst), 2 * dvs.len());
    assert_eq!(deformer.adjoint_passes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_invalid_step_before_any_deformation() {
    let mut store = SensitivityStore::new();
    let z2 = airfoil_zone(&mut store, |x, y| [x, y]);
    let z3 = cube_zone(&mut store, [1.0, 1.0, 1.0]);
    let mut dvs = mixed_variables(z2, z3);
    dvs[4] = dvs[4].clone().with_step(0.0);
    let deformer = CountingDeformer::new(&store);
    let err = FdProjector::default().project(&dvs, &store, &deformer).unwrap_err();
    assert!(matches!(err, ProjectionError::InvalidStep { variable: 4, .. }));
    assert_eq!(deformer.perturbations.load(Ordering::SeqCst), 0);

    // AD 不使用步长
    assert!(AdProjector::default().project(&dvs, &store, &deformer).is_ok());
}

#[test]
fn test_results_independent_of_parallelism() {
    let mut store = SensitivityStore::new();
    let z2 = airfoil_zone(&mut store, |x, y| [x * x, 1.0 - y]);
    let z3 = cube_zone(&mut store, [0.1, 0.2, 0.3]);
    let dvs = mixed_variables(z2, z3);
    let deformer = ParametricDeformer::new(&store);

    for method in [ProjectionMethod::FiniteDifference, ProjectionMethod::Algorithmic] {
        let seq = Projector::from_method(method, ParallelConfig::sequential())
            .project(&dvs, &store, &deformer)
            .unwrap();
        let par = Projector::from_method(method, parallel_always())
            .project(&dvs, &store, &deformer)
            .unwrap();
        assert_eq!(seq, par);
        let order: Vec<usize> = par.iter().map(|e| e.variable).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
    }
}

// ============================================================
// 错误
// ============================================================

/// 扰动后丢掉最后一个节点
struct DroppingDeformer<'a> {
    inner: ParametricDeformer<'a>,
}

impl SurfaceDeformer for DroppingDeformer<'_> {
    fn apply_perturbation(
        &self,
        variable: &DesignVariable,
        step: f64,
    ) -> ProjectionResult<Vec<DeformedNode>> {
        let mut nodes = self.inner.apply_perturbation(variable, step)?;
        if step != 0.0 {
            nodes.pop();
        }
        Ok(nodes)
    }

    fn accumulate_adjoint(
        &self,
        zone: &ZoneContext,
        seed: &SensitivityField<SurfaceNodeTag>,
        variables: &[&DesignVariable],
    ) -> ProjectionResult<Vec<f64>> {
        let mut g = self.inner.accumulate_adjoint(zone, seed, variables)?;
        g.pop();
        Ok(g)
    }
}

#[test]
fn test_incomplete_deformer_response() {
    let store = four_node_store();
    let dvs = vec![DesignVariable::new(0, DvKind::Scale, ZoneIndex::new(0), vec![])];
    let deformer = DroppingDeformer {
        inner: ParametricDeformer::new(&store),
    };

    let err = FdProjector::default().project(&dvs, &store, &deformer).unwrap_err();
    assert!(matches!(
        err,
        ProjectionError::IncompleteDeformerResponse { expected: 4, actual: 3, .. }
    ));

    let err = AdProjector::default().project(&dvs, &store, &deformer).unwrap_err();
    assert!(matches!(
        err,
        ProjectionError::IncompleteDeformerResponse { expected: 1, actual: 0, .. }
    ));
}

/// 两次调用都只返回部分节点，可选地用首节点替换末节点
struct PartialDeformer<'a> {
    inner: ParametricDeformer<'a>,
    keep: usize,
    duplicate_first: bool,
}

impl SurfaceDeformer for PartialDeformer<'_> {
    fn apply_perturbation(
        &self,
        variable: &DesignVariable,
        step: f64,
    ) -> ProjectionResult<Vec<DeformedNode>> {
        let mut nodes = self.inner.apply_perturbation(variable, step)?;
        nodes.truncate(self.keep);
        if self.duplicate_first {
            if let (Some(first), Some(last)) = (nodes.first().copied(), nodes.last_mut()) {
                *last = first;
            }
        }
        Ok(nodes)
    }

    fn accumulate_adjoint(
        &self,
        zone: &ZoneContext,
        seed: &SensitivityField<SurfaceNodeTag>,
        variables: &[&DesignVariable],
    ) -> ProjectionResult<Vec<f64>> {
        self.inner.accumulate_adjoint(zone, seed, variables)
    }
}

#[test]
fn test_fd_rejects_short_baseline_and_perturbation() {
    let store = four_node_store();
    let dvs = vec![DesignVariable::new(0, DvKind::Translation, ZoneIndex::new(0), vec![1.0, 0.0])];

    for keep in [0, 2] {
        let deformer = PartialDeformer {
            inner: ParametricDeformer::new(&store),
            keep,
            duplicate_first: false,
        };
        let err = FdProjector::default().project(&dvs, &store, &deformer).unwrap_err();
        assert!(
            matches!(err, ProjectionError::IncompleteDeformerResponse { expected: 4, actual, .. } if actual == keep),
            "keep {keep}: {err:?}"
        );
    }
}

#[test]
fn test_fd_rejects_duplicate_nodes() {
    let store = four_node_store();
    let dvs = vec![DesignVariable::new(0, DvKind::Translation, ZoneIndex::new(0), vec![1.0, 0.0])];
    let deformer = PartialDeformer {
        inner: ParametricDeformer::new(&store),
        keep: 4,
        duplicate_first: true,
    };
    let err = FdProjector::default().project(&dvs, &store, &deformer).unwrap_err();
    assert!(matches!(
        err,
        ProjectionError::IncompleteDeformerResponse { expected: 4, actual: 3, .. }
    ));
}

#[test]
fn test_missing_zone_is_fatal() {
    let store = four_node_store();
    let dvs = vec![
        DesignVariable::new(0, DvKind::Scale, ZoneIndex::new(0), vec![]),
        DesignVariable::new(1, DvKind::Scale, ZoneIndex::new(2), vec![]),
    ];
    let deformer = ParametricDeformer::new(&store);
    for method in [ProjectionMethod::FiniteDifference, ProjectionMethod::Algorithmic] {
        let err = Projector::from_method(method, ParallelConfig::default())
            .project(&dvs, &store, &deformer)
            .unwrap_err();
        assert!(matches!(err, ProjectionError::MissingZone { n_zones: 1, .. }), "{method}");
    }
}

// ============================================================
// 报告
// ============================================================

#[test]
fn test_report_rows_equal_variable_count() {
    let mut store = SensitivityStore::new();
    let z2 = airfoil_zone(&mut store, |_, _| [0.0, 1.0]);
    let z3 = cube_zone(&mut store, [0.0, 0.0, 0.0]);
    let dvs = mixed_variables(z2, z3);
    let deformer = ParametricDeformer::new(&store);

    // 只投影前两个变量，其余应得到零行
    let g = AdProjector::default().project(&dvs[..2], &store, &deformer).unwrap();
    let text = GradientReporter::default().report(&g, &dvs).unwrap();
    let rows: Vec<&str> = text.lines().skip(2).collect();
    assert_eq!(rows.len(), dvs.len());
    assert!(rows[5].ends_with("+0.000000000000e0"));
}

#[test]
fn test_report_subset_of_variables() {
    let mut store = SensitivityStore::new();
    let z2 = airfoil_zone(&mut store, |_, _| [0.0, 1.0]);
    let z3 = cube_zone(&mut store, [1.0, 0.0, 0.0]);
    let dvs = mixed_variables(z2, z3);
    let subset = &dvs[3..];
    let deformer = ParametricDeformer::new(&store);

    let ad = AdProjector::default().project(subset, &store, &deformer).unwrap();
    let text = GradientReporter::default().report(&ad, subset).unwrap();
    let rows: Vec<&str> = text.lines().skip(2).collect();
    assert_eq!(rows.len(), subset.len());
    for (row, v) in rows.iter().zip(subset) {
        assert!(row.starts_with(&format!("{:>8} ", v.index())), "{row}");
    }

    let fd = FdProjector::default().project(subset, &store, &deformer).unwrap();
    let cmp = GradientComparison::compare(&fd, &ad, subset, &FdTolerance::default()).unwrap();
    let order: Vec<usize> = cmp.rows().iter().map(|r| r.variable).collect();
    assert_eq!(order, vec![3, 4, 5]);
}
