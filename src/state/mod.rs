pub mod widget_state;

pub use widget_state::{RenderedMarker, RouteFlags, WidgetState};
