// ============================================================================
// MAP WIDGET - Orquestación del mapa del CMS
// ============================================================================
// - Carga de librerías del proveedor (una sola vez, vía bootstrap)
// - Mapa + marcadores numerados + ventana de información única
// - Itinerario desde la dirección del usuario hasta el primer marcador
// El watcher de geocodificación (modo admin) vive en `geocode_watcher.rs`.
// ============================================================================

use futures::FutureExt;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::WidgetConfig;
use crate::dom::{ListenOptions, Page};
use crate::maps::{
    DirectionsRendererHandle, InfoWindowHandle, Library, MapError, MapHandle, MapOptions,
    MapProvider, MarkerHandle, MarkerOptions, RendererOptions, RouteRequest, RouteResult,
    TravelMode,
};
use crate::models::{LatLng, LatLngBounds, MarkerRecord};
use crate::state::{RenderedMarker, RouteFlags, WidgetState};
use crate::utils::constants::{
    FALLBACK_CENTER, GEOCODE_DEBOUNCE_MS, MARKER_COLOR_MAIN, MARKER_COLOR_ORIGIN, OPEN_CLASS,
    ROUTE_PANEL_CLASS,
};
use crate::utils::i18n::t;
use crate::utils::runtime::{Debouncer, Runtime};
use crate::views::{render_info_window, render_marker_icon};

/// Resultado de la inicialización
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    pub libraries_loaded: bool,
    pub map_ready: bool,
    pub watcher_started: bool,
}

/// Resultado de un cálculo de itinerario
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Origen vacío: no se hace nada
    Skipped,
    /// No hay marcador de destino
    NoDestination,
    /// Una petición más reciente tomó el relevo
    Superseded,
    Rendered { start: LatLng, end: LatLng },
    Failed(MapError),
}

pub(super) struct WidgetInner<P: MapProvider, D: Page, R: Runtime> {
    pub(super) config: WidgetConfig,
    pub(super) provider: Rc<P>,
    pub(super) page: Rc<D>,
    pub(super) runtime: Rc<R>,
    pub(super) state: RefCell<WidgetState<P>>,
    pub(super) geocode_debouncer: Debouncer<R>,
    pub(super) flash_timer: RefCell<Option<R::Timer>>,
}

/// Controlador del widget. Clonar es barato (comparte la misma instancia).
pub struct MapWidget<P: MapProvider, D: Page, R: Runtime> {
    pub(super) inner: Rc<WidgetInner<P, D, R>>,
}

impl<P: MapProvider, D: Page, R: Runtime> Clone for MapWidget<P, D, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: MapProvider, D: Page, R: Runtime> MapWidget<P, D, R> {
    pub fn new(config: WidgetConfig, provider: Rc<P>, page: Rc<D>, runtime: Rc<R>) -> Self {
        let geocode_debouncer = Debouncer::new(Rc::clone(&runtime), GEOCODE_DEBOUNCE_MS);
        Self {
            inner: Rc::new(WidgetInner {
                config,
                provider,
                page,
                runtime,
                state: RefCell::new(WidgetState::default()),
                geocode_debouncer,
                flash_timer: RefCell::new(None),
            }),
        }
    }

    pub(super) fn downgrade(&self) -> Weak<WidgetInner<P, D, R>> {
        Rc::downgrade(&self.inner)
    }

    pub(super) fn upgrade(weak: &Weak<WidgetInner<P, D, R>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Lanzar la inicialización en el bucle de eventos
    pub fn mount(&self) {
        let widget = self.clone();
        self.inner.runtime.spawn(
            async move {
                widget.init().await;
            }
            .boxed_local(),
        );
    }

    /// Cargar las librerías y arrancar los modos configurados.
    /// Nunca propaga errores: todo se registra en el log.
    pub async fn init(&self) -> InitReport {
        let mut report = InitReport::default();

        for library in Library::ALL {
            if let Err(err) = self.inner.provider.import_library(library).await {
                log::error!("❌ Error de inicialización del mapa ({}): {}", library, err);
                return report;
            }
        }
        report.libraries_loaded = true;

        let map_selector = self.inner.config.map_selector();
        if self.inner.page.exists(&map_selector) {
            match self.setup_map() {
                Ok(()) => report.map_ready = true,
                Err(err) => log::error!("❌ Error construyendo el mapa: {}", err),
            }
        } else {
            log::debug!("Contenedor {} ausente, sin mapa", map_selector);
        }

        if self.inner.config.admin_fields.is_some() {
            report.watcher_started = self.setup_admin_watcher();
        }

        report
    }

    /// Construir el mapa, colocar los marcadores y conectar la UI
    pub fn setup_map(&self) -> Result<(), MapError> {
        let config = &self.inner.config;
        let provider = &self.inner.provider;
        let map_selector = config.map_selector();

        let map_id = self
            .inner
            .page
            .data_attribute(&map_selector, "mapId")
            .unwrap_or_else(|| config.google_map_id.clone());
        let center = config
            .markers
            .first()
            .map(MarkerRecord::position)
            .unwrap_or(FALLBACK_CENTER);

        let options = MapOptions {
            center,
            zoom: config.zoom,
            map_id,
            map_type_control: true,
            street_view_control: true,
        };
        let map = provider.create_map(&map_selector, &options)?;

        let mut rendered: Vec<RenderedMarker<P>> = Vec::with_capacity(config.markers.len());
        let mut bounds = LatLngBounds::new();

        for (index, record) in config.markers.iter().enumerate() {
            match self.render_marker(&map, index, record) {
                Ok(marker) => {
                    bounds.extend(marker.handle.position());
                    rendered.push(marker);
                }
                Err(err) => {
                    // Sin marcadores huérfanos en el mapa
                    for marker in &rendered {
                        marker.handle.detach();
                    }
                    log::warn!(
                        "⚠️ Marcador {} fallido, {} retirados",
                        index + 1,
                        rendered.len()
                    );
                    return Err(err);
                }
            }
        }

        // Un solo punto: centrar + zoom configurado
        match rendered.len() {
            0 => {}
            1 => {
                map.set_center(rendered[0].handle.position());
                map.set_zoom(config.zoom);
            }
            _ => map.fit_bounds(&bounds),
        }

        let count = rendered.len();
        {
            let mut state = self.inner.state.borrow_mut();
            state.map = Some(map);
            state.markers = rendered;
        }
        log::info!("🗺️ Mapa construido con {} marcadores", count);

        // Primer marcador seleccionado por defecto
        if count > 0 {
            self.select_marker(0);
        }

        self.setup_ui_events();
        Ok(())
    }

    /// Marcador numerado + su ventana de información + click
    fn render_marker(
        &self,
        map: &P::Map,
        index: usize,
        record: &MarkerRecord,
    ) -> Result<RenderedMarker<P>, MapError> {
        let config = &self.inner.config;
        let provider = &self.inner.provider;

        let icon = render_marker_icon(
            &config.icon_url,
            &config.lang,
            &(index + 1).to_string(),
            MARKER_COLOR_MAIN,
        );
        let handle = provider.create_marker(
            map,
            &MarkerOptions {
                position: record.position(),
                title: Some(record.company.clone()),
                icon,
            },
        )?;
        let info_window = match provider.create_info_window(&render_info_window(record)) {
            Ok(window) => window,
            Err(err) => {
                handle.detach();
                return Err(err);
            }
        };

        let weak = self.downgrade();
        handle.on_click(Box::new(move || {
            if let Some(widget) = Self::upgrade(&weak) {
                widget.select_marker(index);
            }
        }));

        Ok(RenderedMarker {
            record: record.clone(),
            handle,
            info_window,
        })
    }

    /// Click en un marcador: cerrar la ventana activa, abrir la suya y
    /// actualizar el panel de dirección
    pub fn select_marker(&self, index: usize) {
        let record = {
            let mut guard = self.inner.state.borrow_mut();
            let state = &mut *guard;
            if index >= state.markers.len() || state.map.is_none() {
                return;
            }

            state.close_active_info_window();
            let Some(map) = state.map.as_ref() else {
                return;
            };
            let marker = &state.markers[index];
            marker.info_window.open(map, &marker.handle);
            let record = marker.record.clone();
            state.active_info_window = Some(index);
            record
        };

        log::debug!("📍 Marcador {} seleccionado", index + 1);
        self.update_address_panel(&record);
    }

    pub fn update_address_panel(&self, record: &MarkerRecord) {
        let selectors = &self.inner.config.selectors;
        let page = &self.inner.page;
        page.set_text(&selectors.address_line, &record.address);
        page.set_text(&selectors.city_line, &record.city_line());
    }

    /// Botón de panel + formulario de itinerario (ambos opcionales)
    fn setup_ui_events(&self) {
        let selectors = &self.inner.config.selectors;
        let page = &self.inner.page;

        let weak = self.downgrade();
        let toggled = page.listen(
            &selectors.panel_toggle,
            "click",
            ListenOptions::default(),
            Box::new(move || {
                if let Some(widget) = Self::upgrade(&weak) {
                    widget.toggle_address_panel();
                }
            }),
        );
        if !toggled {
            log::debug!("Sin botón de panel ({})", selectors.panel_toggle);
        }

        let weak = self.downgrade();
        let form = page.listen(
            &selectors.route_form,
            "submit",
            ListenOptions {
                prevent_default: true,
            },
            Box::new(move || {
                if let Some(widget) = Self::upgrade(&weak) {
                    let origin = widget
                        .inner
                        .page
                        .value(&widget.inner.config.selectors.route_input)
                        .unwrap_or_default();
                    widget.submit_route(origin);
                }
            }),
        );
        if !form {
            log::debug!("Sin formulario de itinerario ({})", selectors.route_form);
        }
    }

    pub fn toggle_address_panel(&self) {
        let selectors = &self.inner.config.selectors;
        self.inner.page.toggle_class(&selectors.address_panel, OPEN_CLASS);
        self.inner.page.toggle_class(&selectors.panel_toggle, OPEN_CLASS);
    }

    /// Envío del formulario: el cálculo corre en segundo plano
    pub fn submit_route(&self, origin: String) {
        let widget = self.clone();
        self.inner.runtime.spawn(
            async move {
                widget.calculate_route(&origin).await;
            }
            .boxed_local(),
        );
    }

    /// Calcular el itinerario en coche desde `origin` hasta el primer marcador.
    ///
    /// Dos envíos seguidos: gana el último. La respuesta de una petición
    /// superada se descarta sin tocar el mapa.
    pub async fn calculate_route(&self, origin: &str) -> RouteOutcome {
        let origin = origin.trim();
        if origin.is_empty() {
            return RouteOutcome::Skipped;
        }

        let (request, generation) = {
            let mut guard = self.inner.state.borrow_mut();
            let state = &mut *guard;
            state.clear_route_flags();
            let generation = state.next_route_generation();

            let Some(destination) = state.markers.first().map(|m| m.handle.position()) else {
                drop(guard);
                log::warn!("⚠️ Itinerario pedido sin marcador de destino");
                self.inner
                    .page
                    .alert(&t("aucune_destination", &self.inner.config.lang));
                return RouteOutcome::NoDestination;
            };

            if state.renderer.is_none() {
                if let Some(map) = state.map.as_ref() {
                    state.renderer = self.create_renderer(map);
                }
            }

            let request = RouteRequest {
                origin: origin.to_string(),
                destination,
                travel_mode: TravelMode::Driving,
            };
            (request, generation)
        };

        log::info!("🚗 Calculando itinerario desde '{}'", origin);
        let result = self.inner.provider.route(request).await;

        let mut guard = self.inner.state.borrow_mut();
        let state = &mut *guard;
        if state.route_generation != generation {
            log::debug!("Itinerario {} descartado (superado)", generation);
            return RouteOutcome::Superseded;
        }

        let route = match result {
            Ok(route) => route,
            Err(err) => {
                drop(guard);
                return self.route_failed(err);
            }
        };
        let Some((start, end)) = route.endpoints() else {
            drop(guard);
            return self.route_failed(MapError::NoRoute);
        };
        let Some(map) = state.map.as_ref() else {
            return RouteOutcome::NoDestination;
        };

        if let Some(renderer) = state.renderer.as_ref() {
            renderer.set_directions(&route);
        }

        let config = &self.inner.config;
        let flag = |label: &str, color: &str, position: LatLng| {
            self.inner.provider.create_marker(
                map,
                &MarkerOptions {
                    position,
                    title: None,
                    icon: render_marker_icon(&config.icon_url, &config.lang, label, color),
                },
            )
        };
        let flags = match (
            flag("A", MARKER_COLOR_ORIGIN, start),
            flag("B", MARKER_COLOR_MAIN, end),
        ) {
            (Ok(origin), Ok(destination)) => RouteFlags {
                origin,
                destination,
            },
            (Ok(marker), Err(err)) | (Err(err), Ok(marker)) => {
                marker.detach();
                drop(guard);
                return self.route_failed(err);
            }
            (Err(err), Err(_)) => {
                drop(guard);
                return self.route_failed(err);
            }
        };

        let bounds: LatLngBounds = [start, end].into_iter().collect();
        map.fit_bounds(&bounds);
        state.route_flags = Some(flags);
        drop(guard);

        self.inner
            .page
            .add_class(&config.selectors.route_panel, ROUTE_PANEL_CLASS);
        log::info!("✅ Itinerario renderizado");
        RouteOutcome::Rendered { start, end }
    }

    fn create_renderer(&self, map: &P::Map) -> Option<P::Renderer> {
        let panel = &self.inner.config.selectors.route_panel;
        let options = RendererOptions {
            panel: self.inner.page.exists(panel).then(|| panel.clone()),
            suppress_markers: true,
        };

        match self.inner.provider.create_directions_renderer(map, &options) {
            Ok(renderer) => Some(renderer),
            Err(err) => {
                log::warn!("⚠️ Renderizador de itinerario no disponible: {}", err);
                None
            }
        }
    }

    fn route_failed(&self, err: MapError) -> RouteOutcome {
        log::warn!("⚠️ Itinerario no encontrado: {}", err);
        self.inner
            .page
            .alert(&t("itineraire_introuvable", &self.inner.config.lang));
        RouteOutcome::Failed(err)
    }
}
