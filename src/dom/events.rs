// ============================================================================
// EVENT HANDLING
// ============================================================================
// Los listeners viven tanto como la página del CMS: `closure.forget()` es
// intencional, el widget se monta una sola vez y nunca se desmonta.
// ============================================================================

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event};

/// Registrar un handler genérico sobre un elemento
pub fn on_event<F>(element: &Element, event_type: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    element.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}
