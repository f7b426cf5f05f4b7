// ============================================================================
// DOM MODULE - Contrato DOM + helpers web_sys
// ============================================================================

pub mod page;

#[cfg(target_arch = "wasm32")]
pub mod element;
#[cfg(target_arch = "wasm32")]
pub mod events;

pub use page::{ListenOptions, Page};

#[cfg(target_arch = "wasm32")]
pub use page::BrowserPage;
