pub mod geo;
pub mod marker;

pub use geo::{LatLng, LatLngBounds};
pub use marker::MarkerRecord;
