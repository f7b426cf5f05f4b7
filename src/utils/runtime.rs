// ============================================================================
// RUNTIME - Timers cancelables y tareas asíncronas (single-thread)
// ============================================================================

use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::rc::Rc;

/// Bucle de eventos del widget
pub trait Runtime: 'static {
    /// Handle de un timer programado: soltarlo (drop) lo cancela
    type Timer: 'static;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Self::Timer;

    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Runtime del navegador: `gloo_timers` + `spawn_local`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserRuntime;

#[cfg(target_arch = "wasm32")]
impl Runtime for BrowserRuntime {
    type Timer = gloo_timers::callback::Timeout;

    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> Self::Timer {
        gloo_timers::callback::Timeout::new(delay_ms, task)
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Un único timer pendiente; `restart` cancela el anterior y programa uno nuevo
pub struct Debouncer<R: Runtime> {
    runtime: Rc<R>,
    delay_ms: u32,
    pending: RefCell<Option<R::Timer>>,
}

impl<R: Runtime> Debouncer<R> {
    pub fn new(runtime: Rc<R>, delay_ms: u32) -> Self {
        Self {
            runtime,
            delay_ms,
            pending: RefCell::new(None),
        }
    }

    pub fn restart(&self, task: Box<dyn FnOnce()>) {
        // Drop del timer anterior = clearTimeout
        let previous = self.pending.borrow_mut().take();
        drop(previous);

        let timer = self.runtime.schedule(self.delay_ms, task);
        *self.pending.borrow_mut() = Some(timer);
    }
}
