//! Trait definitions

mod deposit;
mod fileset;
mod io;
mod mesh;
mod selector;

pub use deposit::{DepositGrid, DepositOperator};
pub use fileset::Fileset;
pub use io::IoHandler;
pub use mesh::{OctCellIndices, OctreeContainer, RootMeshContainer, SfcRangeHandler};
pub use selector::Selector;
