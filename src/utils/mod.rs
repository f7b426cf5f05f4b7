// Utils compartidos

pub mod constants;
pub mod i18n;
pub mod runtime;

#[cfg(target_arch = "wasm32")]
pub mod google_ffi;

pub use i18n::t;
pub use runtime::{Debouncer, Runtime};

#[cfg(target_arch = "wasm32")]
pub use runtime::BrowserRuntime;
