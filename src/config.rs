use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MarkerRecord;

/// Configuración del widget tal y como la emite la plantilla del CMS.
///
/// `#[serde(default)]` a nivel de struct: cada campo omitido toma su valor por
/// defecto y cada campo presente lo reemplaza entero (merge superficial).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Id del contenedor del mapa en la página
    pub map_id: String,
    /// Map ID de Google (estilos cloud); `data-map-id` del contenedor tiene prioridad
    pub google_map_id: String,
    #[serde(alias = "api_key")]
    pub api_key: String,
    pub lang: String,
    pub zoom: u8,
    pub markers: Vec<MarkerRecord>,
    pub admin_fields: Option<AdminFieldIds>,
    pub selectors: DomSelectors,
    /// Plantilla de la URL del icono: `{lang}` y `{color}` se sustituyen
    pub icon_url: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            map_id: "main-map".to_string(),
            google_map_id: "DEMO_MAP_ID".to_string(),
            api_key: option_env!("MAP_WIDGET_API_KEY").unwrap_or("").to_string(),
            lang: option_env!("MAP_WIDGET_LANG").unwrap_or("fr").to_string(),
            zoom: 15,
            markers: Vec::new(),
            admin_fields: None,
            selectors: DomSelectors::default(),
            icon_url: "/{lang}/gmap/?marker={color}&dotless=true".to_string(),
        }
    }
}

/// Ids de los campos del formulario de administración que se geocodifican
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFieldIds {
    pub street: String,
    pub postcode: String,
    pub city: String,
    #[serde(default)]
    pub country: Option<String>,
    pub lat: String,
    pub lng: String,
}

impl AdminFieldIds {
    /// Campos de entrada observados (la salida lat/lng no se observa)
    pub fn watched(&self) -> Vec<&str> {
        let mut ids = vec![self.street.as_str(), self.postcode.as_str(), self.city.as_str()];
        if let Some(country) = self.country.as_deref() {
            ids.push(country);
        }
        ids
    }
}

/// Selectores CSS del contrato DOM. Cualquiera puede faltar en la página.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DomSelectors {
    pub address_line: String,
    pub city_line: String,
    pub panel_toggle: String,
    pub address_panel: String,
    pub route_form: String,
    pub route_input: String,
    pub route_panel: String,
}

impl Default for DomSelectors {
    fn default() -> Self {
        Self {
            address_line: "#address .address".to_string(),
            city_line: "#address .city".to_string(),
            panel_toggle: ".hidepanel".to_string(),
            address_panel: "#gmap-address".to_string(),
            route_form: ".form-search".to_string(),
            route_input: "#getadress".to_string(),
            route_panel: "#r-directions".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid widget configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid widget configuration: {0}")]
    Js(String),
}

impl WidgetConfig {
    /// Parsear la configuración desde JSON (atributo `data-config`, bloque `<script>`...)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parsear la configuración desde un objeto JS
    #[cfg(target_arch = "wasm32")]
    pub fn from_js(value: wasm_bindgen::JsValue) -> Result<Self, ConfigError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value).map_err(|e| ConfigError::Js(e.to_string()))
    }

    /// Selector CSS del contenedor del mapa
    pub fn map_selector(&self) -> String {
        id_selector(&self.map_id)
    }
}

/// Selector CSS para un id de elemento, escapado como `CSS.escape`
/// (ids que empiezan por dígito, con `:` o `.`...)
pub fn id_selector(id: &str) -> String {
    use std::fmt::Write;

    let mut selector = String::with_capacity(id.len() + 1);
    selector.push('#');
    let lone_dash = id == "-";
    for (index, c) in id.chars().enumerate() {
        let leading_digit = c.is_ascii_digit()
            && (index == 0 || (index == 1 && id.starts_with('-')));
        match c {
            '\0' => selector.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => {
                let _ = write!(selector, "\\{:x} ", c as u32);
            }
            _ if leading_digit => {
                let _ = write!(selector, "\\{:x} ", c as u32);
            }
            '-' if lone_dash => selector.push_str("\\-"),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => {
                selector.push(c)
            }
            c => {
                selector.push('\\');
                selector.push(c);
            }
        }
    }
    selector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = WidgetConfig::from_json("{}").unwrap();
        assert_eq!(config, WidgetConfig::default());
        assert_eq!(config.map_id, "main-map");
        assert_eq!(config.zoom, 15);
        assert!(config.markers.is_empty());
        assert!(config.admin_fields.is_none());
    }

    #[test]
    fn test_supplied_fields_override_defaults() {
        let config = WidgetConfig::from_json(
            r#"{"mapId":"contact-map","lang":"en","zoom":12,"api_key":"secret"}"#,
        )
        .unwrap();
        assert_eq!(config.map_id, "contact-map");
        assert_eq!(config.lang, "en");
        assert_eq!(config.zoom, 12);
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.google_map_id, "DEMO_MAP_ID");
    }

    #[test]
    fn test_partial_selectors_fill_from_defaults() {
        let config =
            WidgetConfig::from_json(r##"{"selectors":{"routeInput":"#origin"}}"##).unwrap();
        assert_eq!(config.selectors.route_input, "#origin");
        assert_eq!(config.selectors.route_form, ".form-search");
    }

    #[test]
    fn test_admin_fields_watched_ids() {
        let config = WidgetConfig::from_json(
            r#"{"adminFields":{"street":"s","postcode":"p","city":"c","lat":"la","lng":"ln"}}"#,
        )
        .unwrap();
        let fields = config.admin_fields.unwrap();
        assert_eq!(fields.watched(), vec!["s", "p", "c"]);

        let with_country = AdminFieldIds {
            country: Some("co".to_string()),
            ..fields
        };
        assert_eq!(with_country.watched(), vec!["s", "p", "c", "co"]);
    }

    #[test]
    fn test_id_selector_escapes_like_css_escape() {
        assert_eq!(id_selector("main-map"), "#main-map");
        assert_eq!(id_selector("1abc"), "#\\31 abc");
        assert_eq!(id_selector("-2x"), "#-\\32 x");
        assert_eq!(id_selector("a:b.c"), "#a\\:b\\.c");
        assert_eq!(id_selector("-"), "#\\-");
        assert_eq!(id_selector("café_1"), "#café_1");
    }

    #[test]
    fn test_map_selector_uses_escaped_id() {
        let config = WidgetConfig::from_json(r#"{"mapId":"2024:map"}"#).unwrap();
        assert_eq!(config.map_selector(), "#\\32 024\\:map");
    }

    #[test]
    fn test_invalid_marker_is_a_config_error() {
        let err = WidgetConfig::from_json(r#"{"markers":[{"lat":"north","lng":1}]}"#);
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }
}
