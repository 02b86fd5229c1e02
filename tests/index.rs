use approx::assert_relative_eq;
use artio_index::chunk::{ChunkKind, ChunkSubset};
use artio_index::config::IndexConfig;
use artio_index::dataset::Dataset;
use artio_index::index::{DataRequest, Index, ZoneMode};
use artio_index::memory::{MemoryFileset, MemoryFilesetBuilder};
use artio_index::selection::RegionSelector;
use artio_index::types::{Error, FieldId, ParameterValue, SfcRange};
use std::rc::Rc;

extern crate blas_src;
extern crate lapack_src;

fn refined_values(centre: [f64; 3], level: u32) -> Vec<f64> {
    vec![100.0 * level as f64 + centre[0], level as f64]
}

/// 4^3 root cells; root cell 0 refined to level 2 at its lower corner, root cell 63 to level 1
fn fileset() -> MemoryFileset {
    MemoryFilesetBuilder::new(4, &["HVAR_GAS_DENSITY", "HVAR_PRESSURE"])
        .unwrap()
        .root_values(|c| vec![c[0] + 4.0 * c[1] + 16.0 * c[2], 50.0])
        .refine([0.1, 0.1, 0.1], 2, refined_values)
        .unwrap()
        .refine([3.5, 3.5, 3.5], 1, refined_values)
        .unwrap()
        .build()
}

fn dataset(max_range: i64) -> Dataset<MemoryFileset> {
    Dataset::new(fileset(), IndexConfig::default().with_max_range(max_range)).unwrap()
}

fn density() -> FieldId {
    FieldId::fluid("HVAR_GAS_DENSITY")
}

#[test]
fn test_open() {
    let ds = Dataset::open("/data/snapshot_a1.0000.art", IndexConfig::default(), |prefix| {
        assert_eq!(prefix, "/data/snapshot_a1.0000");
        Ok(fileset())
    })
    .unwrap();
    assert_eq!(ds.max_level(), 2);
    assert_eq!(ds.geometry().num_root_cells(), 64);
    assert_relative_eq!(ds.smallest_dx(), 0.25);

    let missing = Dataset::<MemoryFileset>::open("snapshot.d", IndexConfig::default(), |_| {
        Ok(fileset())
    });
    assert!(matches!(missing, Err(Error::InvalidFileset(_))));
    let rejected = Dataset::<MemoryFileset>::open("snapshot.art", IndexConfig::default(), |p| {
        Err(Error::InvalidFileset(p.to_string()))
    });
    assert!(matches!(rejected, Err(Error::InvalidFileset(_))));
}

#[test]
fn test_whole_domain_single_range() {
    let ds = dataset(1024);
    let index = Index::new(&ds);
    let mut request = index.all_data();
    index.identify_base_chunk(&mut request).unwrap();

    let subsets = request.chunk_info().unwrap();
    assert_eq!(subsets.len(), 2);
    assert!(matches!(*subsets[0], ChunkSubset::RootMesh(_)));
    assert!(matches!(*subsets[1], ChunkSubset::Octree(_)));
    for s in subsets.iter() {
        assert_eq!(s.sfc_range(), SfcRange::new(0, 63));
    }
    let current = request.current_chunk().unwrap();
    assert_eq!(current.kind, ChunkKind::All);
    assert!(current.cache);
    assert_eq!(current.objs.len(), 2);
}

#[test]
fn test_ranges_capped_by_max_range() {
    let ds = dataset(16);
    let index = Index::new(&ds);
    let mut request = index.all_data();
    index.identify_base_chunk(&mut request).unwrap();

    let subsets = request.chunk_info().unwrap();
    // Four root mesh subsets, octree subsets only where root cells are refined
    assert_eq!(subsets.len(), 6);
    let octree_ranges: Vec<SfcRange> = subsets
        .iter()
        .filter(|s| matches!(***s, ChunkSubset::Octree(_)))
        .map(|s| s.sfc_range())
        .collect();
    assert_eq!(
        octree_ranges,
        vec![SfcRange::new(0, 15), SfcRange::new(48, 63)]
    );
    assert!(subsets.iter().all(|s| s.sfc_range().len() <= 16));
}

#[test]
fn test_identify_is_idempotent() {
    let ds = dataset(16);
    let index = Index::new(&ds);
    let mut request = index.all_data();
    index.identify_base_chunk(&mut request).unwrap();
    let first = request.chunk_info().unwrap().clone();
    index.identify_base_chunk(&mut request).unwrap();
    assert!(Rc::ptr_eq(&first, request.chunk_info().unwrap()));
    assert_eq!(request.current_chunk().unwrap().objs.len(), first.len());
}

#[test]
fn test_zone_modes() {
    let ds = dataset(16);
    let index = Index::new(&ds);

    let mut root_only = index.all_data().with_zones(ZoneMode::RootMesh);
    index.identify_base_chunk(&mut root_only).unwrap();
    let subsets = root_only.chunk_info().unwrap();
    assert_eq!(subsets.len(), 4);
    assert!(subsets.iter().all(|s| s.as_root_mesh().is_some()));

    let mut octree_only = index.all_data().with_zones(ZoneMode::Octree);
    index.identify_base_chunk(&mut octree_only).unwrap();
    let subsets = octree_only.chunk_info().unwrap();
    assert_eq!(subsets.len(), 2);
    assert!(subsets.iter().all(|s| s.num_zones() == 2));
}

#[test]
fn test_octree_only_on_unrefined_range_is_empty() {
    let ds = dataset(1024);
    let index = Index::new(&ds);
    let mut request = index
        .all_data()
        .with_sfc_range(SfcRange::new(16, 31))
        .with_zones(ZoneMode::Octree);
    index.identify_base_chunk(&mut request).unwrap();
    assert!(request.chunk_info().unwrap().is_empty());
    assert_eq!(index.chunk_io(&request, true).count(), 0);
}

#[test]
fn test_selection_ranges() {
    let ds = dataset(1024);
    let index = Index::new(&ds);
    let mut request: DataRequest<MemoryFileset> =
        DataRequest::new(Rc::new(RegionSelector::new([0.0; 3], [2.0; 3])));
    index.identify_base_chunk(&mut request).unwrap();
    let subsets = request.chunk_info().unwrap();
    assert_eq!(subsets.len(), 2);
    assert_eq!(subsets[0].sfc_range(), SfcRange::new(0, 7));

    let (data, generate) = index.read_fluid_fields(&mut request, &[density()]).unwrap();
    assert!(generate.is_empty());
    // 7 unrefined root cells plus 15 refined cells below root cell 0
    assert_eq!(data[&density()].len(), 22);
}

#[test]
fn test_fill_sizes() {
    let ds = dataset(1024);
    let index = Index::new(&ds);
    let mut request = index.all_data();
    index.identify_base_chunk(&mut request).unwrap();
    let fields = [density(), FieldId::fluid("HVAR_PRESSURE")];

    for subset in request.chunk_info().unwrap().iter() {
        assert_eq!(subset.data_size(), None);
        let data = subset.fill(&fields, request.selector().as_ref()).unwrap();
        let size = subset.data_size().unwrap();
        for f in &fields {
            assert_eq!(data[f].len(), size);
        }
        match subset.as_ref() {
            ChunkSubset::RootMesh(_) => assert_eq!(size, 62),
            ChunkSubset::Octree(_) => {
                assert_eq!(size, 23);
                assert!(data[&fields[1]].iter().all(|v| *v == 1.0 || *v == 2.0));
            }
        }
        assert!(subset.fill(&[], request.selector().as_ref()).unwrap().is_empty());
    }
    let chunk = request.current_chunk().unwrap();
    assert_eq!(chunk.data_size(), Some(85));
    assert_eq!(index.data_size(&chunk.objs), Some(85));
}

#[test]
fn test_fill_unknown_variable() {
    let ds = dataset(1024);
    let index = Index::new(&ds);
    let mut request = index.all_data();
    index.identify_base_chunk(&mut request).unwrap();
    let subset = &request.chunk_info().unwrap()[1];
    let result = subset.fill(
        &[FieldId::fluid("HVAR_MOMENTUM_X")],
        request.selector().as_ref(),
    );
    assert!(matches!(result, Err(Error::UnknownVariable(_))));
    assert_eq!(subset.data_size(), None);
}

#[test]
fn test_chunk_iteration() {
    let ds = dataset(16);
    let index = Index::new(&ds);
    let mut request = index.all_data();

    // Before identification there is nothing to iterate
    assert_eq!(index.chunk_io(&request, true).count(), 0);
    index.identify_base_chunk(&mut request).unwrap();

    let all: Vec<_> = index.chunk_all(&request).collect();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].objs.len(), 6);

    let spatial: Vec<_> = index.chunk_spatial(&request, 0).unwrap().collect();
    assert_eq!(spatial.len(), 6);
    assert!(spatial
        .iter()
        .all(|c| c.kind == ChunkKind::Spatial && c.objs.len() == 1 && c.cache));

    let io: Vec<_> = index.chunk_io(&request, false).collect();
    assert_eq!(io.len(), 6);
    assert!(io.iter().all(|c| c.kind == ChunkKind::Io && !c.cache));
    for (chunk, subset) in io.iter().zip(request.chunk_info().unwrap().iter()) {
        assert!(Rc::ptr_eq(&chunk.objs[0], subset));
    }
}

#[test]
fn test_ghost_zones_fail() {
    let ds = dataset(1024);
    let index = Index::new(&ds);
    let mut request = index.all_data();
    index.identify_base_chunk(&mut request).unwrap();
    assert!(matches!(
        index.chunk_spatial(&request, 1),
        Err(Error::GhostZonesUnsupported(1))
    ));
}

#[test]
fn test_from_subset() {
    let ds = dataset(16);
    let index = Index::new(&ds);
    let mut request = index.all_data();
    index.identify_base_chunk(&mut request).unwrap();
    let octree = request
        .chunk_info()
        .unwrap()
        .iter()
        .find(|s| matches!(***s, ChunkSubset::Octree(_)))
        .unwrap()
        .clone();

    let mut sub_request = DataRequest::from_subset(&octree);
    assert_eq!(sub_request.zones(), ZoneMode::Octree);
    index.identify_base_chunk(&mut sub_request).unwrap();
    let subsets = sub_request.chunk_info().unwrap();
    assert_eq!(subsets.len(), 1);
    assert_eq!(subsets[0].sfc_range(), octree.sfc_range());
    assert!(matches!(*subsets[0], ChunkSubset::Octree(_)));
    assert!(Rc::ptr_eq(subsets[0].base_selector(), octree.base_selector()));
}

#[test]
fn test_read_fluid_fields() {
    let ds = dataset(16);
    let index = Index::new(&ds);
    let mut request = index.all_data();

    let (data, generate) = index.read_fluid_fields(&mut request, &[]).unwrap();
    assert!(data.is_empty() && generate.is_empty());
    assert!(request.chunk_info().is_none());

    let temperature = FieldId::fluid("Temperature");
    let (data, generate) = index
        .read_fluid_fields(&mut request, &[temperature.clone()])
        .unwrap();
    assert!(data.is_empty());
    assert_eq!(generate, vec![temperature.clone()]);
    assert!(request.current_chunk().is_some());

    let (data, generate) = index
        .read_fluid_fields(&mut request, &[density(), temperature.clone()])
        .unwrap();
    assert_eq!(generate, vec![temperature]);
    assert_eq!(data.len(), 1);
    assert_eq!(data[&density()].len(), 85);
    let total: f64 = data[&density()].iter().sum();
    let mut expected = 0.0;
    for subset in request.chunk_info().unwrap().iter() {
        expected += subset.fill(&[density()], request.selector().as_ref()).unwrap()[&density()]
            .iter()
            .sum::<f64>();
    }
    assert_relative_eq!(total, expected, epsilon = 1e-9);
}

#[test]
fn test_field_discovery() {
    let ds = dataset(1024);
    let index = Index::new(&ds);
    assert_eq!(
        index.fluid_field_list(),
        &[density(), FieldId::fluid("HVAR_PRESSURE")]
    );
    assert!(index.particle_field_list().is_empty());
    assert_eq!(index.field_list().len(), 2);
}

#[test]
fn test_find_max() {
    let ds = dataset(1024);
    let index = Index::new(&ds);

    let (value, pos) = index.find_max("HVAR_GAS_DENSITY", None).unwrap();
    assert_relative_eq!(value, 200.375);
    assert_eq!(pos, [0.375, 0.125, 0.125]);

    // Root cells hold the largest pressure, refined cells hold their level
    let (value, pos) = index.find_max("HVAR_PRESSURE", None).unwrap();
    assert_relative_eq!(value, 50.0);
    assert_eq!(pos, [0.5, 0.5, 1.5]);
    let (value, pos) = index.find_max("HVAR_PRESSURE", Some(1)).unwrap();
    assert_relative_eq!(value, 2.0);
    assert_eq!(pos, [0.125, 0.125, 0.125]);
    assert_eq!(index.find_max_default("HVAR_PRESSURE").unwrap().0, 50.0);

    let parameters = ds.parameters();
    assert_eq!(
        parameters.get("MaxHVAR_PRESSUREValue"),
        Some(&ParameterValue::Float(vec![50.0]))
    );
    assert_eq!(
        parameters.get("MaxHVAR_GAS_DENSITYPos"),
        Some(&ParameterValue::Str(vec!["(0.375, 0.125, 0.125)".to_string()]))
    );
}

#[test]
fn test_find_max_is_memoized() {
    let ds = dataset(1024);
    let index = Index::new(&ds);
    let first = index.find_max("HVAR_PRESSURE", Some(1)).unwrap();
    ds.parameters_mut()
        .insert("MaxHVAR_PRESSUREValue", ParameterValue::Float(vec![-1.0]));
    assert_eq!(index.find_max("HVAR_PRESSURE", Some(1)).unwrap(), first);
    // The cache hit does not record the result again
    assert_eq!(
        ds.parameters().get("MaxHVAR_PRESSUREValue"),
        Some(&ParameterValue::Float(vec![-1.0]))
    );
}

#[test]
fn test_find_max_unknown_field() {
    let ds = dataset(1024);
    let index = Index::new(&ds);
    assert!(matches!(
        index.find_max("HVAR_GAMMA", None),
        Err(Error::UnknownVariable(_))
    ));
}
