use serde::{Deserialize, Serialize};

/// Coordenadas geográficas (grados decimales)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Acumulador de límites para `fitBounds`.
///
/// Conserva los puntos en el orden en que se añadieron; el proveedor
/// construye con ellos su propio objeto de límites.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatLngBounds {
    points: Vec<LatLng>,
}

impl LatLngBounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extender los límites para incluir `point`
    pub fn extend(&mut self, point: LatLng) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }
}

impl FromIterator<LatLng> for LatLngBounds {
    fn from_iter<I: IntoIterator<Item = LatLng>>(iter: I) -> Self {
        let mut bounds = LatLngBounds::new();
        for point in iter {
            bounds.extend(point);
        }
        bounds
    }
}
