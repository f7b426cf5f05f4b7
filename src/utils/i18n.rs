// ============================================================================
// MÓDULO DE INTERNACIONALIZACIÓN
// ============================================================================

use std::collections::HashMap;

/// Obtener diccionario de traducciones para un idioma
fn get_translations(lang: &str) -> HashMap<&'static str, &'static str> {
    let mut translations = HashMap::new();
    let lang_lower = lang.to_lowercase();

    match lang_lower.as_str() {
        "en" => {
            translations.insert(
                "itineraire_introuvable",
                "Sorry, we could not find a route from this address.",
            );
            translations.insert("aucune_destination", "No destination is configured on this map.");
        }
        "es" => {
            translations.insert(
                "itineraire_introuvable",
                "Lo sentimos, no encontramos un itinerario para esta dirección.",
            );
            translations.insert("aucune_destination", "Este mapa no tiene ningún destino configurado.");
        }
        _ => {
            // Francés por defecto
            translations.insert(
                "itineraire_introuvable",
                "Désolé, nous n'avons pas trouvé d'itinéraire pour cette adresse.",
            );
            translations.insert("aucune_destination", "Aucune destination n'est configurée sur cette carte.");
        }
    }

    translations
}

/// Función de traducción
///
/// # Arguments
/// * `key` - Clave de traducción
/// * `lang` - Idioma del widget ("fr", "en", "es"...)
///
/// # Returns
/// String traducida o la clave si no se encuentra traducción
pub fn t(key: &str, lang: &str) -> String {
    let translations = get_translations(lang);

    if let Some(translation) = translations.get(key) {
        return translation.to_string();
    }

    key.to_string()
}
