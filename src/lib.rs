//! ARTIO index
//!
//! Indexing and chunked access for octree adaptive mesh refinement output decomposed along a
//! space-filling curve. Selections are translated into bounded SFC ranges, each range gets a
//! root mesh and an octree, and fluid reads, particle reads and particle deposition are served
//! through chunk subsets over those structures.
#![cfg_attr(feature = "strict", deny(warnings))]
#![warn(missing_docs)]

#[macro_use]
extern crate lazy_static;

pub mod chunk;
pub mod config;
pub mod dataset;
pub mod definitions;
pub mod deposit;
pub mod index;
pub mod io;
pub mod memory;
pub mod quantities;
pub mod selection;
pub mod sfc;
pub mod traits;
pub mod types;
