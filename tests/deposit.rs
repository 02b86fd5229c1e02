use approx::assert_relative_eq;
use artio_index::config::IndexConfig;
use artio_index::dataset::Dataset;
use artio_index::deposit::DepositRegistry;
use artio_index::index::{DataRequest, Index};
use artio_index::memory::{MemoryFileset, MemoryFilesetBuilder};
use artio_index::selection::RegionSelector;
use artio_index::traits::DepositGrid;
use artio_index::types::{Error, FieldArray};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rlst::RandomAccessByRef;
use std::rc::Rc;

extern crate blas_src;
extern crate lapack_src;

fn fileset() -> MemoryFileset {
    MemoryFilesetBuilder::new(2, &["HVAR_GAS_DENSITY"])
        .unwrap()
        .build()
}

fn random_particles(n: usize) -> (Vec<[f32; 3]>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(42);
    let positions = (0..n)
        .map(|_| [0, 1, 2].map(|_| rng.gen::<f32>() * 2.0))
        .collect();
    let masses = (0..n).map(|_| rng.gen::<f64>()).collect();
    (positions, masses)
}

fn grid_values(grid: &DepositGrid, dims: [usize; 4]) -> Vec<f64> {
    let mut values = vec![];
    for r in 0..dims[3] {
        for k in 0..dims[2] {
            for j in 0..dims[1] {
                for i in 0..dims[0] {
                    values.push(*grid.get([i, j, k, r]).unwrap());
                }
            }
        }
    }
    values
}

#[test]
fn test_deposit_root_mesh() {
    let ds = Dataset::new(fileset(), IndexConfig::default()).unwrap();
    let index = Index::new(&ds);
    let mut request = index.all_data();
    index.identify_base_chunk(&mut request).unwrap();
    let subsets = request.chunk_info().unwrap();
    assert_eq!(subsets.len(), 1);
    let root = subsets[0].as_root_mesh().unwrap();
    let registry = DepositRegistry::default();

    let (positions, masses) = random_particles(200);
    let fields = [FieldArray::F64(masses.clone())];
    let dims = [1, 1, 1, 8];

    let counts = root
        .deposit(&positions, &[], "count", &registry)
        .unwrap()
        .unwrap();
    let counts = grid_values(&counts, dims);
    assert_eq!(counts.len(), 8);
    assert_relative_eq!(counts.iter().sum::<f64>(), 200.0);

    for method in ["sum", "cic"] {
        let grid = root
            .deposit(&positions, &fields, method, &registry)
            .unwrap()
            .unwrap();
        assert_relative_eq!(
            grid_values(&grid, dims).iter().sum::<f64>(),
            masses.iter().sum::<f64>(),
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_deposit_is_deterministic() {
    let ds = Dataset::new(fileset(), IndexConfig::default()).unwrap();
    let index = Index::new(&ds);
    let mut request = index.all_data();
    index.identify_base_chunk(&mut request).unwrap();
    let root = request.chunk_info().unwrap()[0].as_root_mesh().unwrap();
    let registry = DepositRegistry::default();

    let (positions, masses) = random_particles(100);
    let fields = [FieldArray::F64(masses)];
    for method in ["count", "sum", "nearest", "cic"] {
        let first = root
            .deposit(&positions, &fields, method, &registry)
            .unwrap()
            .unwrap();
        let second = root
            .deposit(&positions, &fields, method, &registry)
            .unwrap()
            .unwrap();
        assert_eq!(
            grid_values(&first, [1, 1, 1, 8]),
            grid_values(&second, [1, 1, 1, 8])
        );
    }
}

#[test]
fn test_deposit_selected_regions() {
    let ds = Dataset::new(fileset(), IndexConfig::default()).unwrap();
    let index = Index::new(&ds);
    // The lower octant is the single root cell with SFC index 0
    let mut request: DataRequest<MemoryFileset> =
        DataRequest::new(Rc::new(RegionSelector::new([0.0; 3], [1.0; 3])));
    index.identify_base_chunk(&mut request).unwrap();
    let root = request.chunk_info().unwrap()[0].as_root_mesh().unwrap();
    let registry = DepositRegistry::default();

    let positions = [[0.25, 0.5, 0.75], [0.9, 0.1, 0.2], [1.5, 1.5, 1.5]];
    let grid = root
        .deposit(&positions, &[], "count", &registry)
        .unwrap()
        .unwrap();
    assert_eq!(grid_values(&grid, [1, 1, 1, 1]), vec![2.0]);

    // Nothing lands in the selected cell
    assert!(root
        .deposit(&[[1.5f64, 1.5, 1.5]], &[], "count", &registry)
        .unwrap()
        .is_none());
    assert!(root
        .deposit::<f64>(&[], &[], "count", &registry)
        .unwrap()
        .is_none());
}

#[test]
fn test_deposit_errors() {
    let ds = Dataset::new(fileset(), IndexConfig::default()).unwrap();
    let index = Index::new(&ds);
    let mut request = index.all_data();
    index.identify_base_chunk(&mut request).unwrap();
    let root = request.chunk_info().unwrap()[0].as_root_mesh().unwrap();
    let registry = DepositRegistry::default();
    let positions = [[0.5f64, 0.5, 0.5]];

    assert!(matches!(
        root.deposit(&positions, &[], "tsc", &registry),
        Err(Error::DepositionNotImplemented(_))
    ));
    assert!(matches!(
        root.deposit(
            &positions,
            &[FieldArray::F64(vec![1.0, 2.0])],
            "sum",
            &registry
        ),
        Err(Error::ShapeMismatch(_))
    ));
}

#[test]
fn test_octree_subset_has_no_deposition() {
    let fileset = MemoryFilesetBuilder::new(2, &["HVAR_GAS_DENSITY"])
        .unwrap()
        .refine([0.5, 0.5, 0.5], 1, |_, _| vec![1.0])
        .unwrap()
        .build();
    let ds = Dataset::new(fileset, IndexConfig::default()).unwrap();
    let index = Index::new(&ds);
    let mut request = index.all_data();
    index.identify_base_chunk(&mut request).unwrap();
    let subsets = request.chunk_info().unwrap();
    assert_eq!(subsets.len(), 2);
    assert!(subsets[1].as_root_mesh().is_none());
}
