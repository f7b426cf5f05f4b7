pub mod geocode_watcher;
pub mod map_widget;

pub use geocode_watcher::GeocodeOutcome;
pub use map_widget::{InitReport, MapWidget, RouteOutcome};
