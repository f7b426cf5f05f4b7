// ============================================================================
// GOOGLE MAPS (WEB) - Implementación del proveedor en el navegador
// ============================================================================
// - `GoogleScriptLoader`: inserta el <script> y resuelve `importLibrary`
// - `GoogleMapProvider`: construye mapa, marcadores, ventanas y servicios
//   a partir de los módulos importados
// ============================================================================

use futures::FutureExt;
use js_sys::{Array, Function, Object, Promise};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlScriptElement;

use super::bootstrap::{ProviderBootstrap, ScriptLoader};
use super::traits::{
    DirectionsRendererHandle, InfoWindowHandle, Library, MapError, MapHandle, MapOptions,
    MapProvider, MarkerHandle, MarkerOptions, ProviderFuture, RendererOptions, RouteRequest,
    RouteResult,
};
use crate::dom::element::{append_to_head, create_element, element_with_html, query_selector};
use crate::models::{LatLng, LatLngBounds};
use crate::utils::constants::PROVIDER_CALLBACK;
use crate::utils::google_ffi::{
    construct, error_message, get_path, import_library_fn, maps_namespace, object, to_js,
    JsDirectionsRenderer, JsDirectionsService, JsGeocoder, JsInfoWindow, JsLatLng,
    JsLatLngBounds, JsMap, JsMarker,
};
use crate::views::MARKER_WRAPPER_CLASS;

fn call_error(error: JsValue) -> MapError {
    MapError::Call(error_message(&error))
}

fn to_lat_lng(value: JsValue) -> LatLng {
    let point: JsLatLng = value.unchecked_into();
    LatLng::new(point.lat(), point.lng())
}

// ----------------------------------------------------------------------------
// Script loader
// ----------------------------------------------------------------------------

type DoneSlot = Rc<RefCell<Option<Box<dyn FnOnce(Result<(), MapError>)>>>>;

/// Petición a `importLibrary` hecha antes de que el script termine de cargar
type QueuedImport = (JsValue, Function, Function);

/// Estado del `importLibrary` provisional
#[derive(Default)]
struct StubState {
    queue: Vec<QueuedImport>,
    outcome: Option<Result<(), String>>,
    stub: Option<Function>,
}

/// Carga del script oficial con callback global
#[derive(Default, Clone)]
pub struct GoogleScriptLoader {
    stub: Rc<RefCell<StubState>>,
}

impl GoogleScriptLoader {
    fn insert_script(&self, url: &str, done: &DoneSlot) -> Result<(), JsValue> {
        let script: HtmlScriptElement = create_element("script")?.dyn_into()?;
        script.set_src(url);
        script.set_async(true);

        // CSP: reutilizar el nonce de la página
        let nonce = query_selector("script[nonce]")?
            .and_then(|el| get_path(&el, &["nonce"]))
            .and_then(|n| n.as_string())
            .unwrap_or_default();
        js_sys::Reflect::set(&script, &JsValue::from_str("nonce"), &JsValue::from_str(&nonce))?;

        let on_load = {
            let done = Rc::clone(done);
            let stub = Rc::clone(&self.stub);
            Closure::wrap(Box::new(move || {
                settle_stub(&stub, Ok(()));
                resolve(&done, Ok(()));
            }) as Box<dyn FnMut()>)
        };
        let callback_name = PROVIDER_CALLBACK
            .rsplit('.')
            .next()
            .unwrap_or(PROVIDER_CALLBACK);
        js_sys::Reflect::set(
            &maps_namespace()?,
            &JsValue::from_str(callback_name),
            on_load.as_ref(),
        )?;
        on_load.forget();

        let on_error = {
            let done = Rc::clone(done);
            let stub = Rc::clone(&self.stub);
            Closure::wrap(Box::new(move || {
                let message = "The Google Maps JavaScript API could not load.";
                settle_stub(&stub, Err(message.to_string()));
                resolve(&done, Err(MapError::LoadFailed(message.to_string())));
            }) as Box<dyn FnMut()>)
        };
        script.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();

        append_to_head(&script)
    }
}

fn resolve(done: &DoneSlot, result: Result<(), MapError>) {
    let callback = done.borrow_mut().take();
    if let Some(callback) = callback {
        callback(result);
    }
}

/// Resolver (o rechazar) las peticiones encoladas por el stub
fn settle_stub(state: &RefCell<StubState>, result: Result<(), String>) {
    let (queue, stub) = {
        let mut state = state.borrow_mut();
        if state.outcome.is_some() {
            return;
        }
        state.outcome = Some(result.clone());
        (std::mem::take(&mut state.queue), state.stub.clone())
    };

    log::debug!("importLibrary provisional: {} peticiones en cola", queue.len());
    for (name, on_resolve, on_reject) in queue {
        match &result {
            Ok(()) => forward_import(&name, &on_resolve, &on_reject, stub.as_ref()),
            Err(message) => {
                let _ = on_reject.call1(&JsValue::NULL, &JsValue::from_str(message));
            }
        }
    }
}

/// Pasar la petición al `importLibrary` real (nunca al propio stub)
fn forward_import(
    name: &JsValue,
    on_resolve: &Function,
    on_reject: &Function,
    stub: Option<&Function>,
) {
    let real = import_library_fn().filter(|import| stub.map_or(true, |s| !Object::is(import, s)));
    let result = match real {
        Some(import) => maps_namespace().and_then(|this| import.call1(&this, name)),
        None => Err(JsValue::from_str("google.maps.importLibrary missing")),
    };
    let _ = match result {
        Ok(promise) => on_resolve.call1(&JsValue::NULL, &promise),
        Err(e) => on_reject.call1(&JsValue::NULL, &e),
    };
}

impl ScriptLoader for GoogleScriptLoader {
    type Module = JsValue;

    fn preloaded(&self) -> bool {
        import_library_fn().is_some()
    }

    /// `importLibrary` que encola hasta el callback del script
    fn install_stub(&self) -> Result<(), MapError> {
        if import_library_fn().is_some() {
            return Ok(());
        }

        let state = Rc::clone(&self.stub);
        let stub = Closure::wrap(Box::new(move |name: JsValue| -> Promise {
            Promise::new(&mut |on_resolve, on_reject| {
                let outcome = state.borrow().outcome.clone();
                match outcome {
                    None => state
                        .borrow_mut()
                        .queue
                        .push((name.clone(), on_resolve, on_reject)),
                    Some(Ok(())) => {
                        let stub = state.borrow().stub.clone();
                        forward_import(&name, &on_resolve, &on_reject, stub.as_ref());
                    }
                    Some(Err(message)) => {
                        let _ = on_reject.call1(&JsValue::NULL, &JsValue::from_str(&message));
                    }
                }
            })
        }) as Box<dyn FnMut(JsValue) -> Promise>);

        let function: Function = stub.as_ref().unchecked_ref::<Function>().clone();
        js_sys::Reflect::set(
            &maps_namespace().map_err(call_error)?,
            &JsValue::from_str("importLibrary"),
            &function,
        )
        .map_err(call_error)?;
        self.stub.borrow_mut().stub = Some(function);
        stub.forget();
        Ok(())
    }

    fn inject(&self, url: &str, on_done: Box<dyn FnOnce(Result<(), MapError>)>) {
        let done: DoneSlot = Rc::new(RefCell::new(Some(on_done)));
        if let Err(e) = self.insert_script(url, &done) {
            let message = error_message(&e);
            settle_stub(&self.stub, Err(message.clone()));
            resolve(&done, Err(MapError::LoadFailed(message)));
        }
    }

    fn import(&self, library: Library) -> ProviderFuture<JsValue> {
        let promise = import_library_fn()
            .ok_or_else(|| MapError::LoadFailed("google.maps.importLibrary missing".to_string()))
            .and_then(|import| {
                let this = maps_namespace().map_err(call_error)?;
                import
                    .call1(&this, &JsValue::from_str(library.name()))
                    .and_then(|p| p.dyn_into::<Promise>())
                    .map_err(|e| MapError::LoadFailed(error_message(&e)))
            });

        async move {
            JsFuture::from(promise?)
                .await
                .map_err(|e| MapError::LoadFailed(error_message(&e)))
        }
        .boxed_local()
    }
}

// ----------------------------------------------------------------------------
// Handles
// ----------------------------------------------------------------------------

pub struct GoogleMap {
    map: JsMap,
    core: JsValue,
}

impl MapHandle for GoogleMap {
    fn set_center(&self, center: LatLng) {
        match to_js(&center) {
            Ok(center) => self.map.set_center(&center),
            Err(e) => log::error!("❌ setCenter: {}", error_message(&e)),
        }
    }

    fn set_zoom(&self, zoom: u8) {
        self.map.set_zoom(f64::from(zoom));
    }

    fn fit_bounds(&self, bounds: &LatLngBounds) {
        let result = construct(&self.core, "LatLngBounds", &[]).and_then(|js_bounds| {
            let js_bounds: JsLatLngBounds = js_bounds.unchecked_into();
            for point in bounds.points() {
                js_bounds.extend(&to_js(point)?);
            }
            self.map.fit_bounds(&js_bounds);
            Ok(())
        });
        if let Err(e) = result {
            log::error!("❌ fitBounds: {}", error_message(&e));
        }
    }
}

pub struct GoogleMarker {
    marker: JsMarker,
    position: LatLng,
}

impl MarkerHandle for GoogleMarker {
    fn position(&self) -> LatLng {
        self.position
    }

    fn on_click(&self, handler: Box<dyn FnMut()>) {
        let closure = Closure::wrap(handler);
        self.marker
            .add_listener("click", closure.as_ref().unchecked_ref::<Function>());
        closure.forget();
    }

    fn detach(&self) {
        let _ = js_sys::Reflect::set(&self.marker, &JsValue::from_str("map"), &JsValue::NULL);
    }
}

pub struct GoogleInfoWindow {
    window: JsInfoWindow,
}

impl InfoWindowHandle<GoogleMap, GoogleMarker> for GoogleInfoWindow {
    fn open(&self, map: &GoogleMap, anchor: &GoogleMarker) {
        let map_value: &JsValue = &map.map;
        let anchor_value: &JsValue = &anchor.marker;
        match object(&[("map", map_value), ("anchor", anchor_value)]) {
            Ok(options) => self.window.open(&options),
            Err(e) => log::error!("❌ InfoWindow.open: {}", error_message(&e)),
        }
    }

    fn close(&self) {
        self.window.close();
    }
}

/// `DirectionsResult` tal como lo devuelve el servicio
pub struct GoogleRoute {
    result: JsValue,
}

impl RouteResult for GoogleRoute {
    fn endpoints(&self) -> Option<(LatLng, LatLng)> {
        let start = get_path(&self.result, &["routes", "0", "legs", "0", "start_location"])?;
        let end = get_path(&self.result, &["routes", "0", "legs", "0", "end_location"])?;
        Some((to_lat_lng(start), to_lat_lng(end)))
    }
}

pub struct GoogleRenderer {
    renderer: JsDirectionsRenderer,
}

impl DirectionsRendererHandle<GoogleRoute> for GoogleRenderer {
    fn set_directions(&self, route: &GoogleRoute) {
        self.renderer.set_directions(&route.result);
    }
}

// ----------------------------------------------------------------------------
// Provider
// ----------------------------------------------------------------------------

/// Proveedor Google Maps sobre los módulos importados
pub struct GoogleMapProvider {
    bootstrap: Rc<ProviderBootstrap<GoogleScriptLoader>>,
    modules: Rc<RefCell<HashMap<Library, JsValue>>>,
}

impl GoogleMapProvider {
    pub fn new(bootstrap: Rc<ProviderBootstrap<GoogleScriptLoader>>) -> Self {
        Self {
            bootstrap,
            modules: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    fn module(&self, library: Library) -> Result<JsValue, MapError> {
        self.modules
            .borrow()
            .get(&library)
            .cloned()
            .ok_or(MapError::LibraryNotLoaded(library))
    }

    fn construct(&self, library: Library, class: &str, args: &[&JsValue]) -> Result<JsValue, MapError> {
        construct(&self.module(library)?, class, args).map_err(call_error)
    }
}

impl MapProvider for GoogleMapProvider {
    type Map = GoogleMap;
    type Marker = GoogleMarker;
    type InfoWindow = GoogleInfoWindow;
    type Route = GoogleRoute;
    type Renderer = GoogleRenderer;

    fn import_library(&self, library: Library) -> ProviderFuture<()> {
        if self.modules.borrow().contains_key(&library) {
            return futures::future::ready(Ok(())).boxed_local();
        }

        let import = self.bootstrap.import_library(library);
        let modules = Rc::clone(&self.modules);
        async move {
            let module = import.await?;
            modules.borrow_mut().insert(library, module);
            log::debug!("📦 Librería '{}' cargada", library);
            Ok(())
        }
        .boxed_local()
    }

    fn create_map(&self, container: &str, options: &MapOptions) -> Result<GoogleMap, MapError> {
        let element: JsValue = query_selector(container)
            .map_err(call_error)?
            .ok_or_else(|| MapError::Call(format!("container {} not found", container)))?
            .into();

        let center = to_js(&options.center).map_err(call_error)?;
        let js_options = object(&[
            ("center", &center),
            ("zoom", &JsValue::from(f64::from(options.zoom))),
            ("mapId", &JsValue::from_str(&options.map_id)),
            ("mapTypeControl", &JsValue::from_bool(options.map_type_control)),
            ("streetViewControl", &JsValue::from_bool(options.street_view_control)),
        ])
        .map_err(call_error)?;

        let map = self.construct(Library::Maps, "Map", &[&element, &js_options])?;
        Ok(GoogleMap {
            map: map.unchecked_into(),
            core: self.module(Library::Core)?,
        })
    }

    fn create_marker(&self, map: &GoogleMap, options: &MarkerOptions) -> Result<GoogleMarker, MapError> {
        let content: JsValue = element_with_html("div", MARKER_WRAPPER_CLASS, &options.icon.html)
            .map_err(call_error)?
            .into();
        let position = to_js(&options.position).map_err(call_error)?;
        let map_value: &JsValue = &map.map;

        let js_options = object(&[("map", map_value), ("position", &position), ("content", &content)])
            .map_err(call_error)?;
        if let Some(title) = options.title.as_deref() {
            js_sys::Reflect::set(&js_options, &JsValue::from_str("title"), &JsValue::from_str(title))
                .map_err(call_error)?;
        }

        let marker = self.construct(Library::Marker, "AdvancedMarkerElement", &[&js_options])?;
        Ok(GoogleMarker {
            marker: marker.unchecked_into(),
            position: options.position,
        })
    }

    fn create_info_window(&self, content: &str) -> Result<GoogleInfoWindow, MapError> {
        let js_options = object(&[("content", &JsValue::from_str(content))]).map_err(call_error)?;
        let window = self.construct(Library::Maps, "InfoWindow", &[&js_options])?;
        Ok(GoogleInfoWindow {
            window: window.unchecked_into(),
        })
    }

    fn create_directions_renderer(
        &self,
        map: &GoogleMap,
        options: &RendererOptions,
    ) -> Result<GoogleRenderer, MapError> {
        let map_value: &JsValue = &map.map;
        let js_options = object(&[
            ("map", map_value),
            ("suppressMarkers", &JsValue::from_bool(options.suppress_markers)),
        ])
        .map_err(call_error)?;

        let panel = match options.panel.as_deref() {
            Some(selector) => query_selector(selector).map_err(call_error)?,
            None => None,
        };
        if let Some(panel) = panel {
            js_sys::Reflect::set(&js_options, &JsValue::from_str("panel"), &panel)
                .map_err(call_error)?;
        }

        let renderer = self.construct(Library::Routes, "DirectionsRenderer", &[&js_options])?;
        Ok(GoogleRenderer {
            renderer: renderer.unchecked_into(),
        })
    }

    fn route(&self, request: RouteRequest) -> ProviderFuture<GoogleRoute> {
        let promise = (|| {
            let service: JsDirectionsService = self
                .construct(Library::Routes, "DirectionsService", &[])?
                .unchecked_into();
            let destination = to_js(&request.destination).map_err(call_error)?;
            let js_request = object(&[
                ("origin", &JsValue::from_str(&request.origin)),
                ("destination", &destination),
                ("travelMode", &JsValue::from_str(request.travel_mode.as_str())),
            ])
            .map_err(call_error)?;
            service.route(&js_request).map_err(call_error)
        })();

        async move {
            let result = JsFuture::from(promise?).await.map_err(call_error)?;
            Ok(GoogleRoute { result })
        }
        .boxed_local()
    }

    fn geocode(&self, address: &str) -> ProviderFuture<Vec<LatLng>> {
        let promise = (|| {
            let geocoder: JsGeocoder = self
                .construct(Library::Geocoding, "Geocoder", &[])?
                .unchecked_into();
            let js_request =
                object(&[("address", &JsValue::from_str(address))]).map_err(call_error)?;
            geocoder.geocode(&js_request).map_err(call_error)
        })();

        async move {
            let response = JsFuture::from(promise?).await.map_err(call_error)?;
            let results = get_path(&response, &["results"])
                .map(|r| Array::from(&r))
                .unwrap_or_else(Array::new);

            Ok(results
                .iter()
                .filter_map(|result| get_path(&result, &["geometry", "location"]))
                .map(to_lat_lng)
                .collect())
        }
        .boxed_local()
    }
}
