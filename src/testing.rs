// ============================================================================
// TESTING - Dobles en memoria: proveedor, página y runtime
// ============================================================================

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::config::WidgetConfig;
use crate::dom::{ListenOptions, Page};
use crate::maps::{
    DirectionsRendererHandle, InfoWindowHandle, Library, MapError, MapHandle, MapOptions,
    MapProvider, MarkerHandle, MarkerOptions, ProviderFuture, RendererOptions, RouteRequest,
    RouteResult,
};
use crate::models::{LatLng, LatLngBounds, MarkerRecord};
use crate::utils::runtime::Runtime;
use crate::viewmodels::MapWidget;

// ----------------------------------------------------------------------------
// Proveedor
// ----------------------------------------------------------------------------

/// Llamada registrada por el proveedor falso
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Import(Library),
    CreateMap {
        container: String,
        options: MapOptions,
    },
    SetCenter(LatLng),
    SetZoom(u8),
    FitBounds(Vec<LatLng>),
    CreateMarker {
        id: usize,
        label: String,
        color: String,
        title: Option<String>,
        position: LatLng,
    },
    Detach(usize),
    CreateInfoWindow {
        id: usize,
        content: String,
    },
    OpenInfoWindow {
        window: usize,
        anchor: usize,
    },
    CloseInfoWindow(usize),
    CreateRenderer(RendererOptions),
    SetDirections,
    Route(RouteRequest),
    Geocode(String),
}

type CallLog = Rc<RefCell<Vec<Call>>>;
type ClickHandler = Rc<RefCell<Option<Box<dyn FnMut()>>>>;

/// Respuesta programada para una llamada asíncrona
pub enum Reply<T> {
    Ready(Result<T, MapError>),
    Pending(oneshot::Receiver<Result<T, MapError>>),
}

impl<T: 'static> Reply<T> {
    /// Respuesta que queda pendiente hasta que el test envíe por el canal
    pub fn pending() -> (oneshot::Sender<Result<T, MapError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Reply::Pending(rx))
    }

    fn into_future(self) -> ProviderFuture<T> {
        match self {
            Reply::Ready(result) => futures::future::ready(result).boxed_local(),
            Reply::Pending(rx) => async move {
                rx.await
                    .unwrap_or_else(|_| Err(MapError::Call("reply dropped".to_string())))
            }
            .boxed_local(),
        }
    }
}

pub struct FakeMap {
    calls: CallLog,
}

impl MapHandle for FakeMap {
    fn set_center(&self, center: LatLng) {
        self.calls.borrow_mut().push(Call::SetCenter(center));
    }

    fn set_zoom(&self, zoom: u8) {
        self.calls.borrow_mut().push(Call::SetZoom(zoom));
    }

    fn fit_bounds(&self, bounds: &LatLngBounds) {
        self.calls
            .borrow_mut()
            .push(Call::FitBounds(bounds.points().to_vec()));
    }
}

#[derive(Clone)]
pub struct FakeMarker {
    pub id: usize,
    pub label: String,
    position: LatLng,
    calls: CallLog,
    click: ClickHandler,
    attached: Rc<Cell<bool>>,
}

impl FakeMarker {
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }
}

impl MarkerHandle for FakeMarker {
    fn position(&self) -> LatLng {
        self.position
    }

    fn on_click(&self, handler: Box<dyn FnMut()>) {
        *self.click.borrow_mut() = Some(handler);
    }

    fn detach(&self) {
        self.attached.set(false);
        self.calls.borrow_mut().push(Call::Detach(self.id));
    }
}

pub struct FakeInfoWindow {
    id: usize,
    calls: CallLog,
}

impl InfoWindowHandle<FakeMap, FakeMarker> for FakeInfoWindow {
    fn open(&self, _map: &FakeMap, anchor: &FakeMarker) {
        self.calls.borrow_mut().push(Call::OpenInfoWindow {
            window: self.id,
            anchor: anchor.id,
        });
    }

    fn close(&self) {
        self.calls.borrow_mut().push(Call::CloseInfoWindow(self.id));
    }
}

pub struct FakeRoute {
    endpoints: Option<(LatLng, LatLng)>,
}

impl RouteResult for FakeRoute {
    fn endpoints(&self) -> Option<(LatLng, LatLng)> {
        self.endpoints
    }
}

pub struct FakeRenderer {
    calls: CallLog,
}

impl DirectionsRendererHandle<FakeRoute> for FakeRenderer {
    fn set_directions(&self, _route: &FakeRoute) {
        self.calls.borrow_mut().push(Call::SetDirections);
    }
}

/// Proveedor de mapas en memoria que registra cada llamada
#[derive(Default)]
pub struct FakeProvider {
    calls: CallLog,
    markers: RefCell<Vec<FakeMarker>>,
    next_window: Cell<usize>,
    pub fail_import: Cell<Option<Library>>,
    pub fail_create_map: Cell<bool>,
    /// Índice de la ventana de información que falla al crearse
    pub fail_info_window_at: Cell<Option<usize>>,
    route_replies: RefCell<VecDeque<Reply<Option<(LatLng, LatLng)>>>>,
    geocode_replies: RefCell<VecDeque<Reply<Vec<LatLng>>>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| predicate(c)).count()
    }

    pub fn markers(&self) -> Vec<FakeMarker> {
        self.markers.borrow().clone()
    }

    /// Simular un click del usuario sobre el marcador `id`
    pub fn click_marker(&self, id: usize) {
        let handler = self
            .markers
            .borrow()
            .iter()
            .find(|m| m.id == id)
            .map(|m| Rc::clone(&m.click));
        if let Some(handler) = handler {
            if let Some(callback) = handler.borrow_mut().as_mut() {
                callback();
            }
        }
    }

    pub fn push_route(&self, reply: Reply<Option<(LatLng, LatLng)>>) {
        self.route_replies.borrow_mut().push_back(reply);
    }

    pub fn push_route_ok(&self, start: LatLng, end: LatLng) {
        self.push_route(Reply::Ready(Ok(Some((start, end)))));
    }

    pub fn push_geocode(&self, reply: Reply<Vec<LatLng>>) {
        self.geocode_replies.borrow_mut().push_back(reply);
    }
}

impl MapProvider for FakeProvider {
    type Map = FakeMap;
    type Marker = FakeMarker;
    type InfoWindow = FakeInfoWindow;
    type Route = FakeRoute;
    type Renderer = FakeRenderer;

    fn import_library(&self, library: Library) -> ProviderFuture<()> {
        self.calls.borrow_mut().push(Call::Import(library));
        let result = match self.fail_import.get() {
            Some(failing) if failing == library => {
                Err(MapError::LoadFailed("script blocked".to_string()))
            }
            _ => Ok(()),
        };
        futures::future::ready(result).boxed_local()
    }

    fn create_map(&self, container: &str, options: &MapOptions) -> Result<FakeMap, MapError> {
        self.calls.borrow_mut().push(Call::CreateMap {
            container: container.to_string(),
            options: options.clone(),
        });
        if self.fail_create_map.get() {
            return Err(MapError::Call("Map constructor failed".to_string()));
        }
        Ok(FakeMap {
            calls: Rc::clone(&self.calls),
        })
    }

    fn create_marker(&self, _map: &FakeMap, options: &MarkerOptions) -> Result<FakeMarker, MapError> {
        let id = self.markers.borrow().len();
        let marker = FakeMarker {
            id,
            label: options.icon.label.clone(),
            position: options.position,
            calls: Rc::clone(&self.calls),
            click: Rc::new(RefCell::new(None)),
            attached: Rc::new(Cell::new(true)),
        };
        self.calls.borrow_mut().push(Call::CreateMarker {
            id,
            label: options.icon.label.clone(),
            color: options.icon.color.clone(),
            title: options.title.clone(),
            position: options.position,
        });
        self.markers.borrow_mut().push(marker.clone());
        Ok(marker)
    }

    fn create_info_window(&self, content: &str) -> Result<FakeInfoWindow, MapError> {
        let id = self.next_window.get();
        self.next_window.set(id + 1);
        self.calls.borrow_mut().push(Call::CreateInfoWindow {
            id,
            content: content.to_string(),
        });
        if self.fail_info_window_at.get() == Some(id) {
            return Err(MapError::Call("InfoWindow constructor failed".to_string()));
        }
        Ok(FakeInfoWindow {
            id,
            calls: Rc::clone(&self.calls),
        })
    }

    fn create_directions_renderer(
        &self,
        _map: &FakeMap,
        options: &RendererOptions,
    ) -> Result<FakeRenderer, MapError> {
        self.calls
            .borrow_mut()
            .push(Call::CreateRenderer(options.clone()));
        Ok(FakeRenderer {
            calls: Rc::clone(&self.calls),
        })
    }

    fn route(&self, request: RouteRequest) -> ProviderFuture<FakeRoute> {
        self.calls.borrow_mut().push(Call::Route(request));
        let reply = self
            .route_replies
            .borrow_mut()
            .pop_front()
            .unwrap_or(Reply::Ready(Err(MapError::NoRoute)));
        reply
            .into_future()
            .map(|result| result.map(|endpoints| FakeRoute { endpoints }))
            .boxed_local()
    }

    fn geocode(&self, address: &str) -> ProviderFuture<Vec<LatLng>> {
        self.calls
            .borrow_mut()
            .push(Call::Geocode(address.to_string()));
        self.geocode_replies
            .borrow_mut()
            .pop_front()
            .unwrap_or(Reply::Ready(Ok(Vec::new())))
            .into_future()
    }
}

// ----------------------------------------------------------------------------
// Página
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FakeElement {
    pub text: String,
    pub value: String,
    pub classes: BTreeSet<String>,
    pub styles: BTreeMap<String, String>,
    pub data: BTreeMap<String, String>,
}

struct FakeListener {
    selector: String,
    event: String,
    options: ListenOptions,
    handler: Rc<RefCell<Box<dyn FnMut()>>>,
}

/// DOM en memoria: elementos indexados por selector
#[derive(Default)]
pub struct FakePage {
    elements: RefCell<HashMap<String, FakeElement>>,
    listeners: RefCell<Vec<FakeListener>>,
    alerts: RefCell<Vec<String>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(selectors: &[&str]) -> Self {
        let page = Self::new();
        for selector in selectors {
            page.add(selector);
        }
        page
    }

    pub fn add(&self, selector: &str) {
        self.elements
            .borrow_mut()
            .insert(selector.to_string(), FakeElement::default());
    }

    pub fn set_data(&self, selector: &str, name: &str, value: &str) {
        if let Some(el) = self.elements.borrow_mut().get_mut(selector) {
            el.data.insert(name.to_string(), value.to_string());
        }
    }

    pub fn element(&self, selector: &str) -> Option<FakeElement> {
        self.elements.borrow().get(selector).cloned()
    }

    pub fn text(&self, selector: &str) -> String {
        self.element(selector).map(|el| el.text).unwrap_or_default()
    }

    pub fn style(&self, selector: &str, property: &str) -> Option<String> {
        self.element(selector)?.styles.get(property).cloned()
    }

    pub fn has_class(&self, selector: &str, class: &str) -> bool {
        self.element(selector)
            .map(|el| el.classes.contains(class))
            .unwrap_or(false)
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    pub fn listener_count(&self, selector: &str, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.selector == selector && l.event == event)
            .count()
    }

    /// Disparar un evento; devuelve si algún listener pidió `preventDefault`
    pub fn fire(&self, selector: &str, event: &str) -> bool {
        let matching: Vec<_> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.selector == selector && l.event == event)
            .map(|l| (l.options, Rc::clone(&l.handler)))
            .collect();

        let mut prevented = false;
        for (options, handler) in matching {
            prevented |= options.prevent_default;
            (&mut *handler.borrow_mut())();
        }
        prevented
    }

    /// Escribir en un campo y disparar `keyup`
    pub fn type_into(&self, selector: &str, value: &str) {
        self.set_value(selector, value);
        self.fire(selector, "keyup");
    }

    fn update(&self, selector: &str, f: impl FnOnce(&mut FakeElement)) -> bool {
        match self.elements.borrow_mut().get_mut(selector) {
            Some(el) => {
                f(el);
                true
            }
            None => false,
        }
    }
}

impl Page for FakePage {
    fn exists(&self, selector: &str) -> bool {
        self.elements.borrow().contains_key(selector)
    }

    fn data_attribute(&self, selector: &str, name: &str) -> Option<String> {
        self.element(selector)?.data.get(name).cloned()
    }

    fn set_text(&self, selector: &str, text: &str) -> bool {
        self.update(selector, |el| el.text = text.to_string())
    }

    fn add_class(&self, selector: &str, class: &str) -> bool {
        self.update(selector, |el| {
            el.classes.insert(class.to_string());
        })
    }

    fn toggle_class(&self, selector: &str, class: &str) -> bool {
        self.update(selector, |el| {
            if !el.classes.remove(class) {
                el.classes.insert(class.to_string());
            }
        })
    }

    fn value(&self, selector: &str) -> Option<String> {
        self.element(selector).map(|el| el.value)
    }

    fn set_value(&self, selector: &str, value: &str) -> bool {
        self.update(selector, |el| el.value = value.to_string())
    }

    fn set_style(&self, selector: &str, property: &str, value: &str) -> bool {
        self.update(selector, |el| {
            if value.is_empty() {
                el.styles.remove(property);
            } else {
                el.styles.insert(property.to_string(), value.to_string());
            }
        })
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn listen(
        &self,
        selector: &str,
        event: &str,
        options: ListenOptions,
        handler: Box<dyn FnMut()>,
    ) -> bool {
        if !self.exists(selector) {
            return false;
        }
        self.listeners.borrow_mut().push(FakeListener {
            selector: selector.to_string(),
            event: event.to_string(),
            options,
            handler: Rc::new(RefCell::new(handler)),
        });
        true
    }
}

// ----------------------------------------------------------------------------
// Runtime
// ----------------------------------------------------------------------------

struct ScheduledTask {
    id: u64,
    due: u64,
    task: Box<dyn FnOnce()>,
}

/// Timer del runtime manual: el drop lo cancela
pub struct ManualTimer {
    id: u64,
    cancelled: Rc<RefCell<HashSet<u64>>>,
}

impl Drop for ManualTimer {
    fn drop(&mut self) {
        self.cancelled.borrow_mut().insert(self.id);
    }
}

/// Reloj virtual + `LocalPool` para las tareas asíncronas
pub struct ManualRuntime {
    now: Cell<u64>,
    next_id: Cell<u64>,
    tasks: RefCell<Vec<ScheduledTask>>,
    cancelled: Rc<RefCell<HashSet<u64>>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl Default for ManualRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualRuntime {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            now: Cell::new(0),
            next_id: Cell::new(0),
            tasks: RefCell::new(Vec::new()),
            cancelled: Rc::new(RefCell::new(HashSet::new())),
            pool: RefCell::new(pool),
            spawner,
        }
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Ejecutar las tareas asíncronas hasta que todas estén bloqueadas
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Avanzar el reloj disparando los timers vencidos en orden
    pub fn advance(&self, ms: u64) {
        let target = self.now.get() + ms;
        self.run_until_stalled();

        loop {
            let next = {
                let mut tasks = self.tasks.borrow_mut();
                let cancelled = self.cancelled.borrow();
                tasks.retain(|t| !cancelled.contains(&t.id));
                let due = tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(index, _)| index);
                due.map(|index| tasks.remove(index))
            };

            let Some(task) = next else {
                break;
            };
            self.now.set(task.due.max(self.now.get()));
            (task.task)();
            self.run_until_stalled();
        }

        self.now.set(target);
    }
}

impl Runtime for ManualRuntime {
    type Timer = ManualTimer;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> ManualTimer {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.tasks.borrow_mut().push(ScheduledTask {
            id,
            due: self.now.get() + u64::from(delay_ms),
            task,
        });
        ManualTimer {
            id,
            cancelled: Rc::clone(&self.cancelled),
        }
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.spawner
            .spawn_local(task)
            .expect("local pool is alive");
    }
}

// ----------------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------------

pub type TestWidget = MapWidget<FakeProvider, FakePage, ManualRuntime>;

pub struct Harness {
    pub widget: TestWidget,
    pub provider: Rc<FakeProvider>,
    pub page: Rc<FakePage>,
    pub runtime: Rc<ManualRuntime>,
}

impl Harness {
    pub fn new(config: WidgetConfig, page: FakePage) -> Self {
        let provider = Rc::new(FakeProvider::new());
        let page = Rc::new(page);
        let runtime = Rc::new(ManualRuntime::new());
        let widget = MapWidget::new(
            config,
            Rc::clone(&provider),
            Rc::clone(&page),
            Rc::clone(&runtime),
        );
        Self {
            widget,
            provider,
            page,
            runtime,
        }
    }

    /// `mount()` + ejecutar la inicialización
    pub fn mounted(config: WidgetConfig, page: FakePage) -> Self {
        let harness = Self::new(config, page);
        harness.widget.mount();
        harness.runtime.run_until_stalled();
        harness
    }
}

/// Página con el contenedor por defecto y todo el contrato DOM
pub fn full_page() -> FakePage {
    FakePage::with(&[
        "#main-map",
        "#address .address",
        "#address .city",
        ".hidepanel",
        "#gmap-address",
        ".form-search",
        "#getadress",
        "#r-directions",
    ])
}

pub fn record(company: &str, address: &str, city: &str, lat: f64, lng: f64) -> MarkerRecord {
    MarkerRecord {
        company: company.to_string(),
        address: address.to_string(),
        postcode: None,
        city: city.to_string(),
        lat,
        lng,
    }
}

pub fn config_with(markers: Vec<MarkerRecord>) -> WidgetConfig {
    WidgetConfig {
        markers,
        ..WidgetConfig::default()
    }
}
