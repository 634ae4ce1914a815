pub mod composite;
pub mod raster;
pub mod readout;
pub mod symbology;

pub use composite::*;
pub use raster::*;
pub use readout::*;
pub use symbology::*;
