use crate::models::LatLng;

/// Centro del mapa cuando no hay marcadores configurados (París)
pub const FALLBACK_CENTER: LatLng = LatLng::new(48.85, 2.35);

/// Script del proveedor (Google Maps JavaScript API)
pub const PROVIDER_SCRIPT_URL: &str = "https://maps.googleapis.com/maps/api/js";
pub const PROVIDER_VERSION: &str = "weekly";
/// Callback global que el script invoca al terminar de cargar
pub const PROVIDER_CALLBACK: &str = "google.maps.__ib__";

/// Espera tras la última tecla antes de geocodificar
pub const GEOCODE_DEBOUNCE_MS: u32 = 1000;
/// Longitud mínima de una dirección "real"
pub const MIN_ADDRESS_LEN: usize = 10;
/// Eventos de los campos de dirección que relanzan el debounce
pub const ADDRESS_EVENTS: [&str; 3] = ["keyup", "change", "focusout"];

/// Feedback visual en el campo de latitud
pub const FLASH_DURATION_MS: u32 = 500;
pub const FLASH_COLOR: &str = "#d4edda";
pub const FLASH_TRANSITION: &str = "background 0.3s";

/// Colores del icono de marcador
pub const MARKER_COLOR_MAIN: &str = "main";
pub const MARKER_COLOR_ORIGIN: &str = "grey";

/// Clases CSS
pub const OPEN_CLASS: &str = "open";
pub const ROUTE_PANEL_CLASS: &str = "sizedirection";
