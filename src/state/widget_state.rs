// ============================================================================
// WIDGET STATE - Estado mutable de una instancia del widget
// ============================================================================

use crate::maps::{InfoWindowHandle, MapProvider, MarkerHandle};
use crate::models::MarkerRecord;

/// Marcador configurado ya colocado en el mapa
pub struct RenderedMarker<P: MapProvider> {
    pub record: MarkerRecord,
    pub handle: P::Marker,
    pub info_window: P::InfoWindow,
}

/// Banderas A (origen) / B (destino) del itinerario actual
pub struct RouteFlags<P: MapProvider> {
    pub origin: P::Marker,
    pub destination: P::Marker,
}

impl<P: MapProvider> RouteFlags<P> {
    pub fn detach(&self) {
        self.origin.detach();
        self.destination.detach();
    }
}

pub struct WidgetState<P: MapProvider> {
    pub map: Option<P::Map>,
    pub markers: Vec<RenderedMarker<P>>,
    /// Índice del marcador cuya ventana está abierta
    pub active_info_window: Option<usize>,
    pub route_flags: Option<RouteFlags<P>>,
    pub renderer: Option<P::Renderer>,
    /// Cada petición de ruta incrementa la generación; solo la última se aplica
    pub route_generation: u64,
    /// Igual para la geocodificación admin: la última entrada gana
    pub geocode_generation: u64,
}

impl<P: MapProvider> Default for WidgetState<P> {
    fn default() -> Self {
        Self {
            map: None,
            markers: Vec::new(),
            active_info_window: None,
            route_flags: None,
            renderer: None,
            route_generation: 0,
            geocode_generation: 0,
        }
    }
}

impl<P: MapProvider> WidgetState<P> {
    /// Cerrar la ventana activa (si la hay)
    pub fn close_active_info_window(&mut self) {
        if let Some(index) = self.active_info_window.take() {
            if let Some(marker) = self.markers.get(index) {
                marker.info_window.close();
            }
        }
    }

    /// Quitar del mapa las banderas del itinerario anterior
    pub fn clear_route_flags(&mut self) {
        if let Some(flags) = self.route_flags.take() {
            flags.detach();
        }
    }

    pub fn next_route_generation(&mut self) -> u64 {
        self.route_generation += 1;
        self.route_generation
    }

    pub fn next_geocode_generation(&mut self) -> u64 {
        self.geocode_generation += 1;
        self.geocode_generation
    }
}
