use super::escape_html;
use crate::models::MarkerRecord;

/// Contenido HTML de la ventana de información de un marcador
pub fn render_info_window(record: &MarkerRecord) -> String {
    format!(
        "<strong>{}</strong><br>{}<br>{}",
        escape_html(&record.company),
        escape_html(&record.address),
        escape_html(&record.city_line()),
    )
}
