mod build_directories;
mod compress;
mod tile_id;
mod varint;

pub use build_directories::*;
pub use compress::*;
pub use tile_id::*;
pub use varint::*;
