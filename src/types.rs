//! Types specific to artio-index

use num::{NumCast, ToPrimitive};
use std::collections::HashMap;
use std::fmt;

/// Generic error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The fileset prefix could not be derived from the name or was rejected on open
    #[error("Invalid ARTIO fileset: {0}")]
    InvalidFileset(String),
    /// No deposition operator is registered under the name
    #[error("Particle deposition method '{0}' is not implemented")]
    DepositionNotImplemented(String),
    /// Ghost zones were requested for a mesh representation that cannot grow them
    #[error("Ghost zones are not supported for ARTIO chunks (requested {0})")]
    GhostZonesUnsupported(usize),
    /// A field name is not part of the vocabulary
    #[error("Unknown field: {0}")]
    UnknownField(String),
    /// A grid variable label is not present in the fileset
    #[error("Unknown grid variable: {0}")]
    UnknownVariable(String),
    /// A particle species label is not part of the vocabulary
    #[error("Unknown particle species label: {0}")]
    UnknownSpeciesLabel(String),
    /// A header parameter is absent or has the wrong kind
    #[error("Missing or malformed parameter: {0}")]
    MissingParameter(String),
    /// A reduction found nothing to reduce over
    #[error("No cells selected when computing {0}")]
    EmptySelection(String),
    /// Array lengths or offsets are inconsistent
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    /// A value could not be represented in the target element type
    #[error("Cannot cast value to {0:?}")]
    Cast(DType),
    /// Failure reported by a range handler or the structures it owns
    #[error("Range handler error: {0}")]
    RangeHandler(String),
}

/// Result Type
pub type Result<T> = std::result::Result<T, Error>;

/// Index along the space-filling curve of a root cell
pub type SfcIndex = i64;

/// An inclusive range `[start, end]` of root cells along the space-filling curve
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SfcRange {
    /// First SFC index in the range
    pub start: SfcIndex,
    /// Last SFC index in the range
    pub end: SfcIndex,
}

impl SfcRange {
    /// Create a range
    pub fn new(start: SfcIndex, end: SfcIndex) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Number of root cells covered
    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }

    /// A range always covers at least one root cell
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check if an SFC index lies in the range
    pub fn contains(&self, sfc: SfcIndex) -> bool {
        sfc >= self.start && sfc <= self.end
    }
}

impl fmt::Display for SfcRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// The category of a field
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    /// Per-cell mesh variable
    Fluid,
    /// Particle field of an analysis-layer particle type (e.g. `nbody`, `stars`, `all`)
    Particle(String),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Fluid => write!(f, "{}", crate::definitions::FLUID_TYPE),
            FieldType::Particle(ptype) => write!(f, "{ptype}"),
        }
    }
}

/// A (type, name) field identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
    /// Field category
    pub ftype: FieldType,
    /// Field name; the on-disk label for fluids, the analysis name for particles
    pub name: String,
}

impl FieldId {
    /// Identifier of a fluid field
    pub fn fluid(name: &str) -> Self {
        Self {
            ftype: FieldType::Fluid,
            name: name.to_string(),
        }
    }

    /// Identifier of a particle field
    pub fn particle(ptype: &str, name: &str) -> Self {
        Self {
            ftype: FieldType::Particle(ptype.to_string()),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.ftype, self.name)
    }
}

/// Element type of a particle array
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// 64 bit float
    F64,
    /// 32 bit float
    F32,
    /// 64 bit signed integer
    I64,
    /// 32 bit signed integer
    I32,
}

/// A flat array whose element type is only known at run time
#[derive(Clone, Debug, PartialEq)]
pub enum FieldArray {
    /// 64 bit float data
    F64(Vec<f64>),
    /// 32 bit float data
    F32(Vec<f32>),
    /// 64 bit integer data
    I64(Vec<i64>),
    /// 32 bit integer data
    I32(Vec<i32>),
}

fn cast_slice<D: NumCast + Copy, S: ToPrimitive + Copy>(
    dst: &mut [D],
    src: &[S],
    dtype: DType,
) -> Result<()> {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d = D::from(*s).ok_or(Error::Cast(dtype))?;
    }
    Ok(())
}

fn cast_from<D: NumCast + Copy>(dst: &mut [D], src: &FieldArray, dtype: DType) -> Result<()> {
    match src {
        FieldArray::F64(s) => cast_slice(dst, s, dtype),
        FieldArray::F32(s) => cast_slice(dst, s, dtype),
        FieldArray::I64(s) => cast_slice(dst, s, dtype),
        FieldArray::I32(s) => cast_slice(dst, s, dtype),
    }
}

impl FieldArray {
    /// Create a zero-filled array
    pub fn zeros(dtype: DType, len: usize) -> Self {
        match dtype {
            DType::F64 => FieldArray::F64(vec![0.0; len]),
            DType::F32 => FieldArray::F32(vec![0.0; len]),
            DType::I64 => FieldArray::I64(vec![0; len]),
            DType::I32 => FieldArray::I32(vec![0; len]),
        }
    }

    /// The element type
    pub fn dtype(&self) -> DType {
        match self {
            FieldArray::F64(_) => DType::F64,
            FieldArray::F32(_) => DType::F32,
            FieldArray::I64(_) => DType::I64,
            FieldArray::I32(_) => DType::I32,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            FieldArray::F64(v) => v.len(),
            FieldArray::F32(v) => v.len(),
            FieldArray::I64(v) => v.len(),
            FieldArray::I32(v) => v.len(),
        }
    }

    /// Check if the array has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the values of the array converted to f64
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            FieldArray::F64(v) => v.clone(),
            FieldArray::F32(v) => v.iter().map(|x| *x as f64).collect(),
            FieldArray::I64(v) => v.iter().map(|x| *x as f64).collect(),
            FieldArray::I32(v) => v.iter().map(|x| *x as f64).collect(),
        }
    }

    /// Write `src` into this array starting at `offset`, casting to this array's element type
    pub fn write_at(&mut self, offset: usize, src: &FieldArray) -> Result<()> {
        let end = offset + src.len();
        if end > self.len() {
            return Err(Error::ShapeMismatch(format!(
                "cannot write {} values at offset {} into array of length {}",
                src.len(),
                offset,
                self.len()
            )));
        }
        let dtype = self.dtype();
        match self {
            FieldArray::F64(d) => cast_from(&mut d[offset..end], src, dtype),
            FieldArray::F32(d) => cast_from(&mut d[offset..end], src, dtype),
            FieldArray::I64(d) => cast_from(&mut d[offset..end], src, dtype),
            FieldArray::I32(d) => cast_from(&mut d[offset..end], src, dtype),
        }
    }
}

/// A header parameter value
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterValue {
    /// Integer values
    Int(Vec<i64>),
    /// Floating point values
    Float(Vec<f64>),
    /// String values
    Str(Vec<String>),
}

/// Key-value table of header parameters
#[derive(Clone, Debug, Default)]
pub struct ParameterTable {
    values: HashMap<String, ParameterValue>,
}

impl ParameterTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, key: &str, value: ParameterValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Get a parameter
    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.values.get(key)
    }

    /// Check if a parameter is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get an integer parameter
    pub fn ints(&self, key: &str) -> Result<&[i64]> {
        match self.values.get(key) {
            Some(ParameterValue::Int(v)) => Ok(v),
            _ => Err(Error::MissingParameter(key.to_string())),
        }
    }

    /// Get a float parameter
    pub fn floats(&self, key: &str) -> Result<&[f64]> {
        match self.values.get(key) {
            Some(ParameterValue::Float(v)) => Ok(v),
            _ => Err(Error::MissingParameter(key.to_string())),
        }
    }

    /// Get a string parameter
    pub fn strings(&self, key: &str) -> Result<&[String]> {
        match self.values.get(key) {
            Some(ParameterValue::Str(v)) => Ok(v),
            _ => Err(Error::MissingParameter(key.to_string())),
        }
    }

    /// Get the first entry of an integer parameter
    pub fn int(&self, key: &str) -> Result<i64> {
        self.ints(key)?
            .first()
            .copied()
            .ok_or_else(|| Error::MissingParameter(key.to_string()))
    }
}
