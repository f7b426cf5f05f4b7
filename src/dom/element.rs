// ============================================================================
// ELEMENT HELPERS - Funciones básicas para manipular DOM
// ============================================================================

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Window};

/// Obtener window global
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// Obtener document
pub fn document() -> Option<Document> {
    window()?.document()
}

/// Crear elemento
pub fn create_element(tag: &str) -> Result<Element, JsValue> {
    document()
        .ok_or_else(|| JsValue::from_str("No document"))
        .and_then(|doc| doc.create_element(tag))
}

/// Query selector (buscar elemento por selector CSS)
pub fn query_selector(selector: &str) -> Result<Option<Element>, JsValue> {
    document()
        .ok_or_else(|| JsValue::from_str("No document"))?
        .query_selector(selector)
}

/// Crear un elemento con clase y HTML interno (contenido de marcadores)
pub fn element_with_html(tag: &str, class: &str, html: &str) -> Result<Element, JsValue> {
    let element = create_element(tag)?;
    element.set_class_name(class);
    element.set_inner_html(html);
    Ok(element)
}

/// Añadir un hijo a `<head>`
pub fn append_to_head(child: &Element) -> Result<(), JsValue> {
    document()
        .and_then(|doc| doc.head())
        .ok_or_else(|| JsValue::from_str("No <head>"))?
        .append_child(child)
        .map(|_| ())
}
