// ============================================================================
// MAP PROVIDER - Capacidades del proveedor de mapas como traits
// ============================================================================
// El widget nunca toca el namespace global del proveedor: recibe un objeto
// que implementa `MapProvider` y lo usa para todo (mapa, marcadores, rutas...).
// ============================================================================

use futures::future::LocalBoxFuture;
use thiserror::Error;

use crate::models::{LatLng, LatLngBounds};

/// Futuro de una llamada asíncrona al proveedor (single-thread, sin `Send`)
pub type ProviderFuture<T> = LocalBoxFuture<'static, Result<T, MapError>>;

/// Módulos del proveedor que el widget necesita
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Library {
    Maps,
    Marker,
    Routes,
    Geocoding,
    Core,
}

impl Library {
    /// Orden de carga durante la inicialización
    pub const ALL: [Library; 5] = [
        Library::Maps,
        Library::Marker,
        Library::Routes,
        Library::Geocoding,
        Library::Core,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Library::Maps => "maps",
            Library::Marker => "marker",
            Library::Routes => "routes",
            Library::Geocoding => "geocoding",
            Library::Core => "core",
        }
    }
}

impl std::fmt::Display for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error del mapa
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("map provider could not load: {0}")]
    LoadFailed(String),
    #[error("library `{0}` is not loaded")]
    LibraryNotLoaded(Library),
    #[error("map provider call failed: {0}")]
    Call(String),
    #[error("no route found")]
    NoRoute,
    #[error("no results")]
    NoResults,
}

/// Opciones de construcción del mapa
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: u8,
    pub map_id: String,
    pub map_type_control: bool,
    pub street_view_control: bool,
}

/// Visual personalizado de un marcador (icono + etiqueta centrada)
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcon {
    pub label: String,
    pub color: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub position: LatLng,
    pub title: Option<String>,
    pub icon: MarkerIcon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    Driving,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "DRIVING",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: String,
    pub destination: LatLng,
    pub travel_mode: TravelMode,
}

/// Opciones del renderizador de itinerarios
#[derive(Debug, Clone, PartialEq)]
pub struct RendererOptions {
    /// Selector del panel de instrucciones (si existe en la página)
    pub panel: Option<String>,
    pub suppress_markers: bool,
}

/// Instancia de mapa
pub trait MapHandle {
    fn set_center(&self, center: LatLng);
    fn set_zoom(&self, zoom: u8);
    fn fit_bounds(&self, bounds: &LatLngBounds);
}

/// Marcador colocado en el mapa
pub trait MarkerHandle {
    fn position(&self) -> LatLng;
    /// Registrar el handler de click
    fn on_click(&self, handler: Box<dyn FnMut()>);
    /// Quitar el marcador del mapa (map = null)
    fn detach(&self);
}

/// Ventana de información anclada a un marcador
pub trait InfoWindowHandle<M, K> {
    fn open(&self, map: &M, anchor: &K);
    fn close(&self);
}

/// Resultado de una ruta
pub trait RouteResult {
    /// Inicio y fin del primer tramo de la primera ruta
    fn endpoints(&self) -> Option<(LatLng, LatLng)>;
}

pub trait DirectionsRendererHandle<R> {
    fn set_directions(&self, route: &R);
}

/// Capacidad completa del proveedor de mapas
pub trait MapProvider: 'static {
    type Map: MapHandle;
    type Marker: MarkerHandle;
    type InfoWindow: InfoWindowHandle<Self::Map, Self::Marker>;
    type Route: RouteResult;
    type Renderer: DirectionsRendererHandle<Self::Route>;

    /// Cargar un módulo del proveedor (memoizado por el bootstrap)
    fn import_library(&self, library: Library) -> ProviderFuture<()>;

    fn create_map(&self, container: &str, options: &MapOptions) -> Result<Self::Map, MapError>;

    fn create_marker(
        &self,
        map: &Self::Map,
        options: &MarkerOptions,
    ) -> Result<Self::Marker, MapError>;

    fn create_info_window(&self, content: &str) -> Result<Self::InfoWindow, MapError>;

    fn create_directions_renderer(
        &self,
        map: &Self::Map,
        options: &RendererOptions,
    ) -> Result<Self::Renderer, MapError>;

    fn route(&self, request: RouteRequest) -> ProviderFuture<Self::Route>;

    /// Candidatos de geocodificación, el mejor primero
    fn geocode(&self, address: &str) -> ProviderFuture<Vec<LatLng>>;
}
