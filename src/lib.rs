// ============================================================================
// CMS MAP WIDGET - Mapa embebido para páginas del CMS (RUST PURO + WASM)
// ============================================================================
// Arquitectura:
// - Maps: capacidad del proveedor (traits) + bootstrap + Google Maps (web)
// - ViewModels: MapWidget (mapa, marcadores, itinerario) + geocodificación admin
// - State: estado mutable del widget con Rc<RefCell>
// - Views: fragmentos HTML (icono de marcador, ventana de información)
// - Dom: contrato DOM (trait Page) + helpers web_sys
// ============================================================================

pub mod config;
pub mod dom;
pub mod maps;
pub mod models;
pub mod state;
pub mod utils;
pub mod viewmodels;
pub mod views;

#[cfg(test)]
mod testing;

pub use config::{AdminFieldIds, ConfigError, DomSelectors, WidgetConfig};
pub use maps::{MapError, MapProvider};
pub use viewmodels::{GeocodeOutcome, InitReport, MapWidget, RouteOutcome};

#[cfg(target_arch = "wasm32")]
pub use entry::mount_map_widget;

#[cfg(target_arch = "wasm32")]
mod entry {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Once;
    use wasm_bindgen::prelude::*;

    use crate::config::WidgetConfig;
    use crate::dom::BrowserPage;
    use crate::maps::web::{GoogleMapProvider, GoogleScriptLoader};
    use crate::maps::{BootstrapParams, BootstrapSlot};
    use crate::utils::BrowserRuntime;
    use crate::viewmodels::MapWidget;

    type BrowserWidget = MapWidget<GoogleMapProvider, BrowserPage, BrowserRuntime>;

    static LOGGER: Once = Once::new();

    // Un solo loader por página; los widgets viven tanto como la página
    thread_local! {
        static BOOTSTRAP: BootstrapSlot<GoogleScriptLoader> = BootstrapSlot::new();
        static WIDGETS: RefCell<Vec<BrowserWidget>> = RefCell::new(Vec::new());
    }

    fn init_logging() {
        console_error_panic_hook::set_once();
        LOGGER.call_once(|| wasm_logger::init(wasm_logger::Config::default()));
    }

    /// Montar un widget. Solo falla si la configuración no se puede leer;
    /// los errores del proveedor quedan en la consola.
    #[wasm_bindgen(js_name = mountMapWidget)]
    pub fn mount_map_widget(config: JsValue) -> Result<(), JsValue> {
        init_logging();

        let config = WidgetConfig::from_js(config).map_err(|e| {
            log::error!("❌ {}", e);
            JsValue::from_str(&e.to_string())
        })?;
        log::info!(
            "🚀 Map widget en #{} ({} marcadores)",
            config.map_id,
            config.markers.len()
        );

        let params = BootstrapParams::new(&config.api_key, &config.lang);
        let bootstrap = BOOTSTRAP.with(|slot| slot.install(params, GoogleScriptLoader::default));

        let widget = MapWidget::new(
            config,
            Rc::new(GoogleMapProvider::new(bootstrap)),
            Rc::new(BrowserPage),
            Rc::new(BrowserRuntime),
        );
        widget.mount();

        WIDGETS.with(|widgets| widgets.borrow_mut().push(widget));
        Ok(())
    }
}
