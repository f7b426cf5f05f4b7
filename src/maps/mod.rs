// Módulo de mapas: capacidades del proveedor, bootstrap y la implementación web

pub mod bootstrap;
pub mod traits;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use bootstrap::{BootstrapParams, BootstrapSlot, ProviderBootstrap, ScriptLoader};
pub use traits::{
    DirectionsRendererHandle, InfoWindowHandle, Library, MapError, MapHandle, MapOptions,
    MapProvider, MarkerHandle, MarkerIcon, MarkerOptions, ProviderFuture, RendererOptions,
    RouteRequest, RouteResult, TravelMode,
};
