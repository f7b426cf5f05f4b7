// ============================================================================
// GOOGLE MAPS FFI - Foreign Function Interface para JavaScript
// ============================================================================
// Solo wrappers para objetos JS - Sin estado, sin lógica.
// Los constructores salen de los módulos devueltos por `importLibrary`.
// ============================================================================

use js_sys::{Array, Function, Object, Promise, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// `google.maps.Map`
    pub type JsMap;

    #[wasm_bindgen(method, js_name = setCenter)]
    pub fn set_center(this: &JsMap, center: &JsValue);

    #[wasm_bindgen(method, js_name = setZoom)]
    pub fn set_zoom(this: &JsMap, zoom: f64);

    #[wasm_bindgen(method, js_name = fitBounds)]
    pub fn fit_bounds(this: &JsMap, bounds: &JsLatLngBounds);

    /// `google.maps.LatLng` (posiciones devueltas por el servicio)
    pub type JsLatLng;

    #[wasm_bindgen(method)]
    pub fn lat(this: &JsLatLng) -> f64;

    #[wasm_bindgen(method)]
    pub fn lng(this: &JsLatLng) -> f64;

    pub type JsLatLngBounds;

    #[wasm_bindgen(method)]
    pub fn extend(this: &JsLatLngBounds, point: &JsValue);

    /// `google.maps.marker.AdvancedMarkerElement`
    pub type JsMarker;

    #[wasm_bindgen(method, js_name = addListener)]
    pub fn add_listener(this: &JsMarker, event: &str, handler: &Function) -> JsValue;

    pub type JsInfoWindow;

    #[wasm_bindgen(method)]
    pub fn open(this: &JsInfoWindow, options: &JsValue);

    #[wasm_bindgen(method)]
    pub fn close(this: &JsInfoWindow);

    pub type JsDirectionsService;

    #[wasm_bindgen(method, catch)]
    pub fn route(this: &JsDirectionsService, request: &JsValue) -> Result<Promise, JsValue>;

    pub type JsDirectionsRenderer;

    #[wasm_bindgen(method, js_name = setDirections)]
    pub fn set_directions(this: &JsDirectionsRenderer, result: &JsValue);

    pub type JsGeocoder;

    #[wasm_bindgen(method, catch)]
    pub fn geocode(this: &JsGeocoder, request: &JsValue) -> Result<Promise, JsValue>;
}

/// `window.google.maps`, creándolo si no existe
pub fn maps_namespace() -> Result<Object, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let google = child_object(&window, "google")?;
    child_object(&google, "maps")
}

fn child_object(parent: &JsValue, key: &str) -> Result<Object, JsValue> {
    let existing = Reflect::get(parent, &JsValue::from_str(key))?;
    if existing.is_object() {
        return Ok(existing.unchecked_into());
    }
    let created = Object::new();
    Reflect::set(parent, &JsValue::from_str(key), &created)?;
    Ok(created)
}

/// `google.maps.importLibrary`, si otro loader ya lo instaló
pub fn import_library_fn() -> Option<Function> {
    let window = web_sys::window()?;
    let google = Reflect::get(&window, &JsValue::from_str("google")).ok()?;
    let maps = Reflect::get(&google, &JsValue::from_str("maps")).ok()?;
    Reflect::get(&maps, &JsValue::from_str("importLibrary"))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

/// `new module[class](...args)`
pub fn construct(module: &JsValue, class: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
    let constructor: Function = Reflect::get(module, &JsValue::from_str(class))?.dyn_into()?;
    let args: Array = args.iter().copied().collect();
    Reflect::construct(&constructor, &args)
}

/// Objeto literal a partir de pares clave/valor
pub fn object(entries: &[(&str, &JsValue)]) -> Result<JsValue, JsValue> {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value)?;
    }
    Ok(object.into())
}

/// Serializar a objeto JS plano (LatLngLiteral, opciones...)
pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

/// `obj.a.b[0].c`: cada segmento es una clave o un índice
pub fn get_path(root: &JsValue, path: &[&str]) -> Option<JsValue> {
    let mut current = root.clone();
    for segment in path {
        let key = match segment.parse::<u32>() {
            Ok(index) => JsValue::from(index),
            Err(_) => JsValue::from_str(segment),
        };
        current = Reflect::get(&current, &key).ok()?;
        if current.is_undefined() || current.is_null() {
            return None;
        }
    }
    Some(current)
}

/// Mensaje legible de un error JS
pub fn error_message(error: &JsValue) -> String {
    if let Some(message) = error.as_string() {
        return message;
    }
    get_path(error, &["message"])
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", error))
}
