// ============================================================================
// MARKER ICON VIEW - Icono del endpoint del CMS + etiqueta centrada
// ============================================================================

use super::escape_html;
use crate::maps::MarkerIcon;

/// Clase del contenedor del icono
pub const MARKER_WRAPPER_CLASS: &str = "marker-custom-wrapper";

/// URL del icono a partir de la plantilla configurada
pub fn icon_url(template: &str, lang: &str, color: &str) -> String {
    template.replace("{lang}", lang).replace("{color}", color)
}

/// Construir el visual de un marcador (etiqueta "1", "2"... o "A"/"B")
pub fn render_marker_icon(template: &str, lang: &str, label: &str, color: &str) -> MarkerIcon {
    let url = icon_url(template, lang, color);
    let html = format!(
        concat!(
            r#"<img src="{url}" style="display:block;">"#,
            r#"<span class="marker-label" style="position:absolute; top:12px; left:50%; "#,
            r#"transform:translateX(-50%); color:white; font-weight:bold; font-size:12px;">{label}</span>"#,
        ),
        url = escape_html(&url),
        label = escape_html(label),
    );

    MarkerIcon {
        label: label.to_string(),
        color: color.to_string(),
        html,
    }
}
