//! The ARTIO index: field discovery, chunking and read dispatch
use crate::chunk::{ChunkKind, ChunkSubset, DataChunk, OctreeSubset, RootMeshSubset, SubsetBase};
use crate::dataset::Dataset;
use crate::definitions::{self, ALL_PARTICLES};
use crate::io::SubsetIo;
use crate::quantities;
use crate::selection::{AllSelector, MinLevelSelector};
use crate::traits::{Fileset, IoHandler, Selector, SfcRangeHandler};
use crate::types::{Error, FieldId, ParameterValue, Result, SfcRange};
use log::{debug, info};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// Which mesh representations base-chunk identification builds subsets for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ZoneMode {
    /// Root mesh and octree subsets
    #[default]
    Both,
    /// Root mesh subsets only
    RootMesh,
    /// Octree subsets only
    Octree,
}

/// A data request: a selection plus the chunks identified for it
pub struct DataRequest<'a, F: Fileset> {
    selector: Rc<dyn Selector>,
    sfc_range: Option<SfcRange>,
    zones: ZoneMode,
    chunk_info: Option<Rc<Vec<Rc<ChunkSubset<'a, F>>>>>,
    current_chunk: Option<DataChunk<'a, F>>,
}

impl<'a, F: Fileset> DataRequest<'a, F> {
    /// Create a request for a selection
    pub fn new(selector: Rc<dyn Selector>) -> Self {
        Self {
            selector,
            sfc_range: None,
            zones: ZoneMode::Both,
            chunk_info: None,
            current_chunk: None,
        }
    }

    /// Create a request restricted to the range and mesh representation of a subset
    pub fn from_subset(subset: &ChunkSubset<'a, F>) -> Self {
        let zones = match subset {
            ChunkSubset::Octree(_) => ZoneMode::Octree,
            ChunkSubset::RootMesh(_) => ZoneMode::RootMesh,
        };
        Self::new(subset.base_selector().clone())
            .with_sfc_range(subset.sfc_range())
            .with_zones(zones)
    }

    /// Restrict the request to one SFC range
    pub fn with_sfc_range(mut self, range: SfcRange) -> Self {
        self.sfc_range = Some(range);
        self
    }

    /// Set which mesh representations are chunked
    pub fn with_zones(mut self, zones: ZoneMode) -> Self {
        self.zones = zones;
        self
    }

    /// Only select cells at or above `min_level`
    pub fn with_min_level(mut self, min_level: u32) -> Self {
        self.selector = Rc::new(MinLevelSelector::new(self.selector, min_level));
        self
    }

    /// The selection
    pub fn selector(&self) -> &Rc<dyn Selector> {
        &self.selector
    }

    /// The explicit SFC range, if any
    pub fn sfc_range(&self) -> Option<SfcRange> {
        self.sfc_range
    }

    /// The zone mode
    pub fn zones(&self) -> ZoneMode {
        self.zones
    }

    /// The cached subsets, once identified
    pub fn chunk_info(&self) -> Option<&Rc<Vec<Rc<ChunkSubset<'a, F>>>>> {
        self.chunk_info.as_ref()
    }

    /// The current aggregate chunk, once identified
    pub fn current_chunk(&self) -> Option<&DataChunk<'a, F>> {
        self.current_chunk.as_ref()
    }
}

/// Index over a dataset
///
/// The index borrows its dataset and cannot outlive it. Field lists and the extremum cache are
/// computed once and never invalidated.
pub struct Index<'a, F: Fileset> {
    dataset: &'a Dataset<F>,
    io: Box<dyn IoHandler<'a, F> + 'a>,
    fluid_field_list: Vec<FieldId>,
    particle_field_list: Vec<FieldId>,
    max_locations: RefCell<HashMap<(String, Option<u32>), (f64, [f64; 3])>>,
}

impl<'a, F: Fileset> Index<'a, F> {
    /// Create an index reading fluid fields with [`SubsetIo`]
    pub fn new(dataset: &'a Dataset<F>) -> Self {
        Self::with_io(dataset, Box::new(SubsetIo))
    }

    /// Create an index with a custom fluid I/O backend
    pub fn with_io(dataset: &'a Dataset<F>, io: Box<dyn IoHandler<'a, F> + 'a>) -> Self {
        debug!("Initializing Geometry Handler empty for now.");
        let mut index = Self {
            dataset,
            io,
            fluid_field_list: vec![],
            particle_field_list: vec![],
            max_locations: RefCell::new(HashMap::new()),
        };
        index.detect_output_fields();
        index
    }

    /// The dataset
    pub fn dataset(&self) -> &'a Dataset<F> {
        self.dataset
    }

    /// Finest refinement level
    pub fn max_level(&self) -> u32 {
        self.dataset.max_level()
    }

    /// Maximum number of root cells per SFC range
    pub fn max_range(&self) -> i64 {
        self.dataset.max_range()
    }

    /// Width of the smallest cell in code units
    pub fn get_smallest_dx(&self) -> f64 {
        self.dataset.smallest_dx()
    }

    fn detect_output_fields(&mut self) {
        self.fluid_field_list = self.detect_fluid_fields();
        self.particle_field_list = self.detect_particle_fields();
        debug!("Detected fields: {:?}", self.field_list());
    }

    fn detect_fluid_fields(&self) -> Vec<FieldId> {
        self.dataset
            .grid_variable_labels()
            .iter()
            .map(|label| FieldId::fluid(label))
            .collect()
    }

    /// A field is exposed for a type only if every species of the type carries it
    fn detect_particle_fields(&self) -> Vec<FieldId> {
        let meta = self.dataset.particles();
        let mut fields = BTreeSet::new();
        for ptype in meta.particle_types() {
            if ptype == ALL_PARTICLES {
                continue;
            }
            let species = meta.species_of(&ptype);
            for (name, label) in definitions::vocabulary() {
                if species.iter().all(|s| meta.has_variable(*s, label)) {
                    fields.insert(FieldId::particle(&ptype, name));
                }
            }
        }
        fields.into_iter().collect()
    }

    /// Fluid fields stored on disk
    pub fn fluid_field_list(&self) -> &[FieldId] {
        &self.fluid_field_list
    }

    /// Particle fields stored on disk
    pub fn particle_field_list(&self) -> &[FieldId] {
        &self.particle_field_list
    }

    /// All fields stored on disk
    pub fn field_list(&self) -> Vec<FieldId> {
        self.fluid_field_list
            .iter()
            .chain(self.particle_field_list.iter())
            .cloned()
            .collect()
    }

    /// A request selecting the whole domain
    pub fn all_data(&self) -> DataRequest<'a, F> {
        let geometry = self.dataset.geometry();
        DataRequest::new(Rc::new(AllSelector::new(
            geometry.left_edge,
            geometry.right_edge,
        )))
    }

    /// Build and cache the subsets covering a request's selection
    ///
    /// The subset list is computed once per request. Every call resets the current chunk to
    /// the single aggregate chunk of the request.
    pub fn identify_base_chunk(&self, request: &mut DataRequest<'a, F>) -> Result<()> {
        if request.chunk_info.is_none() {
            let geometry = self.dataset.geometry();
            let handle = self.dataset.handle();
            let all_data = match request.selector.bounds() {
                Some((left, right)) => geometry.is_whole_domain(&left, &right),
                None => false,
            };
            let list_sfc_ranges = if let Some(range) = request.sfc_range {
                debug!("Restricting to {}", range);
                vec![range]
            } else if all_data {
                debug!("Selecting entire artio domain");
                handle.root_sfc_ranges_all(self.max_range())?
            } else {
                debug!("Running selector on artio base grid");
                handle.root_sfc_ranges(request.selector.as_ref(), self.max_range())?
            };

            let mut ci = Vec::with_capacity(2 * list_sfc_ranges.len());
            for range in &list_sfc_ranges {
                let mut range_handler = handle.range_handler(geometry, *range)?;
                range_handler.construct_mesh()?;
                let range_handler = Rc::new(range_handler);
                if request.zones != ZoneMode::Octree {
                    ci.push(Rc::new(ChunkSubset::RootMesh(RootMeshSubset::new(
                        SubsetBase::new(
                            self.dataset,
                            request.selector.clone(),
                            *range,
                            range_handler.clone(),
                        ),
                    ))));
                }
                if request.zones != ZoneMode::RootMesh && range_handler.total_octs() > 0 {
                    ci.push(Rc::new(ChunkSubset::Octree(OctreeSubset::new(
                        SubsetBase::new(
                            self.dataset,
                            request.selector.clone(),
                            *range,
                            range_handler.clone(),
                        ),
                    ))));
                }
            }
            request.chunk_info = Some(Rc::new(ci));
            if list_sfc_ranges.len() > 1 {
                info!("Created {} chunks for ARTIO", list_sfc_ranges.len());
            }
        }
        request.current_chunk = self.chunk_all(request).next();
        Ok(())
    }

    fn current_objs(&self, request: &DataRequest<'a, F>) -> Vec<Rc<ChunkSubset<'a, F>>> {
        match (&request.current_chunk, &request.chunk_info) {
            (Some(chunk), _) => chunk.objs.clone(),
            (None, Some(ci)) => ci.as_ref().clone(),
            (None, None) => vec![],
        }
    }

    /// Total number of cells selected by a list of filled subsets
    pub fn data_size(&self, subsets: &[Rc<ChunkSubset<'a, F>>]) -> Option<usize> {
        subsets.iter().map(|s| s.data_size()).sum()
    }

    /// One cacheable chunk holding every subset of the request
    pub fn chunk_all(
        &self,
        request: &DataRequest<'a, F>,
    ) -> impl Iterator<Item = DataChunk<'a, F>> {
        std::iter::once(DataChunk::new(
            ChunkKind::All,
            self.current_objs(request),
            true,
        ))
    }

    /// One chunk per subset, for spatial operations
    ///
    /// Ghost zones cannot be grown for these meshes, so `ngz` must be zero.
    pub fn chunk_spatial(
        &self,
        request: &DataRequest<'a, F>,
        ngz: usize,
    ) -> Result<impl Iterator<Item = DataChunk<'a, F>>> {
        if ngz > 0 {
            return Err(Error::GhostZonesUnsupported(ngz));
        }
        Ok(self
            .current_objs(request)
            .into_iter()
            .map(|o| DataChunk::new(ChunkKind::Spatial, vec![o], true)))
    }

    /// One chunk per subset, for disk reads
    pub fn chunk_io(
        &self,
        request: &DataRequest<'a, F>,
        cache: bool,
    ) -> impl Iterator<Item = DataChunk<'a, F>> {
        self.current_objs(request)
            .into_iter()
            .map(move |o| DataChunk::new(ChunkKind::Io, vec![o], cache))
    }

    /// Partition fields into those stored on disk and those to be generated
    pub fn split_fields(&self, fields: &[FieldId]) -> (Vec<FieldId>, Vec<FieldId>) {
        fields
            .iter()
            .cloned()
            .partition(|f| self.fluid_field_list.contains(f))
    }

    /// Read fluid fields for a request
    ///
    /// Returns the arrays read from disk and the fields that must be generated instead.
    pub fn read_fluid_fields(
        &self,
        request: &mut DataRequest<'a, F>,
        fields: &[FieldId],
    ) -> Result<(HashMap<FieldId, Vec<f64>>, Vec<FieldId>)> {
        if fields.is_empty() {
            return Ok((HashMap::new(), vec![]));
        }
        if request.current_chunk.is_none() {
            self.identify_base_chunk(request)?;
        }
        let (fields_to_read, fields_to_generate) = self.split_fields(fields);
        if fields_to_read.is_empty() {
            return Ok((HashMap::new(), fields_to_generate));
        }
        let mut chunks = self.chunk_io(request, true);
        let fields_to_return =
            self.io
                .read_fluid_selection(&mut chunks, request.selector.as_ref(), &fields_to_read)?;
        Ok((fields_to_return, fields_to_generate))
    }

    /// Maximum of a fluid field and the centre of the cell holding it
    ///
    /// With `Some(n)` only cells at level `max_level - n` or finer are searched; `None`
    /// searches every level. Results are memoized.
    pub fn find_max(&self, field: &str, finest_levels: Option<u32>) -> Result<(f64, [f64; 3])> {
        let key = (field.to_string(), finest_levels);
        let cached = self.max_locations.borrow().get(&key).copied();
        if let Some(found) = cached {
            return Ok(found);
        }
        let found = self.find_max_cell_location(field, finest_levels)?;
        self.max_locations.borrow_mut().insert(key, found);
        Ok(found)
    }

    /// [`Index::find_max`] over the configured number of finest levels
    pub fn find_max_default(&self, field: &str) -> Result<(f64, [f64; 3])> {
        self.find_max(field, Some(self.dataset.config().finest_levels))
    }

    /// Search for the maximum of a field and record it in the dataset parameters
    pub fn find_max_cell_location(
        &self,
        field: &str,
        finest_levels: Option<u32>,
    ) -> Result<(f64, [f64; 3])> {
        let mut source = self.all_data();
        if let Some(n) = finest_levels {
            source = source.with_min_level(self.max_level().saturating_sub(n));
        }
        debug!("Searching for maximum value of {}", field);
        let (max_val, pos) = quantities::max_location(self, &mut source, &FieldId::fluid(field))?;
        info!(
            "Max Value is {:0.5e} at {:0.16} {:0.16} {:0.16}",
            max_val, pos[0], pos[1], pos[2]
        );
        let mut parameters = self.dataset.parameters_mut();
        parameters.insert(
            &format!("Max{field}Value"),
            ParameterValue::Float(vec![max_val]),
        );
        parameters.insert(
            &format!("Max{field}Pos"),
            ParameterValue::Str(vec![format!("({}, {}, {})", pos[0], pos[1], pos[2])]),
        );
        Ok((max_val, pos))
    }
}
