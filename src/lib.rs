pub mod error;
pub mod ioext;
pub mod map;
pub mod octree;

pub use flate2;

pub use error::MpzError;
pub use error::MpzResult;
pub use map::Map;
