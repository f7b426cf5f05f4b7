use serde::{de::Visitor, Deserialize, Deserializer, Serialize};
use std::fmt;

use super::geo::LatLng;

/// Punto configurado por el CMS (una sede / tienda)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MarkerRecord {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "deserialize_postcode")]
    pub postcode: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub lat: f64,
    #[serde(deserialize_with = "deserialize_coordinate")]
    pub lng: f64,
}

impl MarkerRecord {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Línea "CP Ciudad" (el código postal solo si existe)
    pub fn city_line(&self) -> String {
        match self.postcode.as_deref() {
            Some(cp) if !cp.is_empty() => format!("{} {}", cp, self.city),
            _ => self.city.clone(),
        }
    }
}

/// Las plantillas del CMS emiten las coordenadas como número o como texto ("48.85")
fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct CoordinateVisitor;

    impl<'de> Visitor<'de> for CoordinateVisitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or a numeric string")
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value as f64)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value as f64)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| E::custom(format!("invalid coordinate: {:?}", value)))
        }
    }

    deserializer.deserialize_any(CoordinateVisitor)
}

/// Código postal: texto, número (75001) o null
fn deserialize_postcode<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PostcodeVisitor;

    impl<'de> Visitor<'de> for PostcodeVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("string, number or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()).filter(|v| !v.is_empty()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(PostcodeVisitor)
}
