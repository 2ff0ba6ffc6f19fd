pub mod address;
pub mod coordinate;
pub mod loaders;
pub mod map_data;
pub mod marker;

pub use address::{normalize_address, Address, AddressCount};
pub use coordinate::{GeodeticCoordinate, ProjectedCoordinate};
pub use loaders::{list_columns, load_address_column, TableFormat};
pub use map_data::MapData;
pub use marker::{FaultedAddress, MapMarker, PipelineResult};
