// ============================================================================
// PAGE - Contrato DOM del widget
// ============================================================================
// Todo acceso al DOM pasa por este trait. Un selector que no existe en la
// página nunca es un error: la operación devuelve `false` / `None`.
// ============================================================================

/// Opciones de un listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenOptions {
    pub prevent_default: bool,
}

pub trait Page: 'static {
    fn exists(&self, selector: &str) -> bool;

    /// Atributo `data-*` (nombre en camelCase, como `dataset`)
    fn data_attribute(&self, selector: &str, name: &str) -> Option<String>;

    fn set_text(&self, selector: &str, text: &str) -> bool;

    fn add_class(&self, selector: &str, class: &str) -> bool;

    fn toggle_class(&self, selector: &str, class: &str) -> bool;

    /// Valor de un campo de formulario (`<input>`, `<select>`, `<textarea>`)
    fn value(&self, selector: &str) -> Option<String>;

    fn set_value(&self, selector: &str, value: &str) -> bool;

    fn set_style(&self, selector: &str, property: &str, value: &str) -> bool;

    /// Aviso bloqueante al usuario
    fn alert(&self, message: &str);

    /// Registrar un listener; devuelve `false` si el elemento no existe
    fn listen(
        &self,
        selector: &str,
        event: &str,
        options: ListenOptions,
        handler: Box<dyn FnMut()>,
    ) -> bool;
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserPage;

#[cfg(target_arch = "wasm32")]
mod browser {
    use wasm_bindgen::JsCast;
    use web_sys::{
        Element, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
    };

    use super::{ListenOptions, Page};
    use crate::dom::element::{query_selector, window};
    use crate::dom::events::on_event;

    /// Implementación sobre `web_sys::Document`
    #[derive(Debug, Default, Clone, Copy)]
    pub struct BrowserPage;

    impl BrowserPage {
        fn element(&self, selector: &str) -> Option<Element> {
            query_selector(selector).ok().flatten()
        }
    }

    fn field_value(el: &Element) -> Option<String> {
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            return Some(input.value());
        }
        if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            return Some(select.value());
        }
        el.dyn_ref::<HtmlTextAreaElement>().map(|area| area.value())
    }

    fn set_field_value(el: &Element, value: &str) -> bool {
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else {
            return false;
        }
        true
    }

    impl Page for BrowserPage {
        fn exists(&self, selector: &str) -> bool {
            self.element(selector).is_some()
        }

        fn data_attribute(&self, selector: &str, name: &str) -> Option<String> {
            self.element(selector)?
                .dyn_into::<HtmlElement>()
                .ok()?
                .dataset()
                .get(name)
                .filter(|v| !v.is_empty())
        }

        fn set_text(&self, selector: &str, text: &str) -> bool {
            match self.element(selector) {
                Some(el) => {
                    el.set_text_content(Some(text));
                    true
                }
                None => false,
            }
        }

        fn add_class(&self, selector: &str, class: &str) -> bool {
            self.element(selector)
                .map(|el| el.class_list().add_1(class).is_ok())
                .unwrap_or(false)
        }

        fn toggle_class(&self, selector: &str, class: &str) -> bool {
            self.element(selector)
                .map(|el| el.class_list().toggle(class).is_ok())
                .unwrap_or(false)
        }

        fn value(&self, selector: &str) -> Option<String> {
            field_value(&self.element(selector)?)
        }

        fn set_value(&self, selector: &str, value: &str) -> bool {
            self.element(selector)
                .map(|el| set_field_value(&el, value))
                .unwrap_or(false)
        }

        fn set_style(&self, selector: &str, property: &str, value: &str) -> bool {
            self.element(selector)
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                .map(|el| el.style().set_property(property, value).is_ok())
                .unwrap_or(false)
        }

        fn alert(&self, message: &str) {
            if let Some(win) = window() {
                let _ = win.alert_with_message(message);
            }
        }

        fn listen(
            &self,
            selector: &str,
            event: &str,
            options: ListenOptions,
            mut handler: Box<dyn FnMut()>,
        ) -> bool {
            let Some(el) = self.element(selector) else {
                return false;
            };

            let result = on_event(&el, event, move |e| {
                if options.prevent_default {
                    e.prevent_default();
                }
                handler();
            });

            if let Err(e) = result {
                log::warn!("⚠️ No se pudo registrar '{}' en {}: {:?}", event, selector, e);
                return false;
            }
            true
        }
    }
}
