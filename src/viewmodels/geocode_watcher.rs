// ============================================================================
// GEOCODE WATCHER - Modo admin: dirección -> coordenadas
// ============================================================================
// Cada tecla / cambio en los campos de dirección relanza un único timer de
// 1 s. Solo cuando el usuario deja de escribir se geocodifica.
// ============================================================================

use futures::FutureExt;
use std::rc::Rc;

use super::map_widget::MapWidget;
use crate::config::{id_selector, AdminFieldIds};
use crate::dom::{ListenOptions, Page};
use crate::maps::{MapError, MapProvider};
use crate::models::LatLng;
use crate::utils::constants::{
    ADDRESS_EVENTS, FLASH_COLOR, FLASH_DURATION_MS, FLASH_TRANSITION, MIN_ADDRESS_LEN,
};
use crate::utils::runtime::Runtime;

/// Resultado de un intento de geocodificación
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    /// Sin campos de administración configurados
    Skipped,
    /// Dirección demasiado corta para ser real
    TooShort,
    NoResult,
    /// Una entrada más reciente tomó el relevo
    Superseded,
    Applied(LatLng),
    Failed(MapError),
}

impl<P: MapProvider, D: Page, R: Runtime> MapWidget<P, D, R> {
    /// Observar los campos de dirección; devuelve `true` si alguno existe
    pub fn setup_admin_watcher(&self) -> bool {
        let Some(fields) = self.inner.config.admin_fields.as_ref() else {
            return false;
        };

        let mut watched = 0;
        for id in fields.watched() {
            let selector = id_selector(id);
            let mut attached = false;
            for event in ADDRESS_EVENTS {
                let weak = self.downgrade();
                attached |= self.inner.page.listen(
                    &selector,
                    event,
                    ListenOptions::default(),
                    Box::new(move || {
                        if let Some(widget) = Self::upgrade(&weak) {
                            widget.schedule_geocode();
                        }
                    }),
                );
            }
            if attached {
                watched += 1;
            } else {
                log::warn!("⚠️ Campo de dirección {} ausente", selector);
            }
        }

        log::info!("📝 Geocodificación admin: {} campos observados", watched);
        watched > 0
    }

    /// Relanzar el debounce; el timer anterior (si lo hay) se cancela
    pub fn schedule_geocode(&self) {
        let weak = self.downgrade();
        self.inner.geocode_debouncer.restart(Box::new(move || {
            let Some(widget) = Self::upgrade(&weak) else {
                return;
            };
            let task = widget.clone();
            widget.inner.runtime.spawn(
                async move {
                    task.geocode_admin_address().await;
                }
                .boxed_local(),
            );
        }));
    }

    /// Dirección concatenada: "calle, CP ciudad, país"
    pub fn admin_address(&self) -> Option<String> {
        let fields = self.inner.config.admin_fields.as_ref()?;
        let value = |id: &str| self.inner.page.value(&id_selector(id)).unwrap_or_default();

        let country = fields.country.as_deref().map(value).unwrap_or_default();
        Some(format!(
            "{}, {} {}, {}",
            value(&fields.street),
            value(&fields.postcode),
            value(&fields.city),
            country
        ))
    }

    /// Geocodificar la dirección actual y escribir lat/lng. Nunca propaga errores.
    pub async fn geocode_admin_address(&self) -> GeocodeOutcome {
        let Some(address) = self.admin_address() else {
            return GeocodeOutcome::Skipped;
        };
        // Cualquier respuesta anterior aún en vuelo queda obsoleta
        let generation = self.inner.state.borrow_mut().next_geocode_generation();
        if address.chars().count() < MIN_ADDRESS_LEN {
            log::debug!("Dirección demasiado corta, sin geocodificar: '{}'", address);
            return GeocodeOutcome::TooShort;
        }

        log::debug!("🔎 Geocodificando '{}'", address);
        let reply = self.inner.provider.geocode(&address).await;
        if self.inner.state.borrow().geocode_generation != generation {
            log::debug!("Geocodificación obsoleta descartada: '{}'", address);
            return GeocodeOutcome::Superseded;
        }

        match reply {
            Ok(candidates) => match candidates.first() {
                Some(&location) => {
                    if let Some(fields) = self.inner.config.admin_fields.as_ref() {
                        self.apply_coordinates(fields, location);
                    }
                    GeocodeOutcome::Applied(location)
                }
                None => {
                    log::info!("Sin resultados de geocodificación para '{}'", address);
                    GeocodeOutcome::NoResult
                }
            },
            Err(err) => {
                log::warn!("⚠️ Geocoding failed: {}", err);
                GeocodeOutcome::Failed(err)
            }
        }
    }

    fn apply_coordinates(&self, fields: &AdminFieldIds, location: LatLng) {
        let lat_selector = id_selector(&fields.lat);
        let page = &self.inner.page;
        page.set_value(&lat_selector, &location.lat.to_string());
        page.set_value(&id_selector(&fields.lng), &location.lng.to_string());
        self.flash_field(lat_selector);
    }

    /// Fondo verde durante 500 ms como confirmación
    fn flash_field(&self, selector: String) {
        let page = &self.inner.page;
        page.set_style(&selector, "transition", FLASH_TRANSITION);
        page.set_style(&selector, "background-color", FLASH_COLOR);

        let page = Rc::clone(&self.inner.page);
        let timer = self.inner.runtime.schedule(
            FLASH_DURATION_MS,
            Box::new(move || {
                page.set_style(&selector, "background-color", "");
            }),
        );
        *self.inner.flash_timer.borrow_mut() = Some(timer);
    }
}
