pub mod coordinate;
pub mod error;
pub mod requests;

// Re-export commonly used types
pub use coordinate::{Coordinate, EndpointRole, LatLng, Path};
pub use error::SyncError;
pub use requests::{PathRequest, PathResponse, WirePath};
