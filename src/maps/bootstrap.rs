// ============================================================================
// BOOTSTRAP DEL PROVEEDOR - Carga única del script del mapa
// ============================================================================
// - El primer `import_library` inserta el <script>; los siguientes esperan.
// - Si la carga falla, todas las peticiones (pendientes y futuras) fallan.
// - Una segunda instalación en la misma página se ignora con un warning.
// ============================================================================

use futures::channel::oneshot;
use futures::FutureExt;
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;

use super::traits::{Library, MapError, ProviderFuture};
use crate::utils::constants::{PROVIDER_CALLBACK, PROVIDER_SCRIPT_URL, PROVIDER_VERSION};

/// Parámetros del script del proveedor
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapParams {
    pub api_key: String,
    pub version: String,
    pub language: String,
}

impl BootstrapParams {
    pub fn new(api_key: &str, language: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            version: PROVIDER_VERSION.to_string(),
            language: language.to_string(),
        }
    }

    /// URL del script con las librerías pedidas antes de la primera carga
    pub fn script_url(&self, libraries: &[Library]) -> Result<String, MapError> {
        let libraries = libraries
            .iter()
            .map(Library::name)
            .collect::<Vec<_>>()
            .join(",");

        let url = Url::parse_with_params(
            PROVIDER_SCRIPT_URL,
            &[
                ("key", self.api_key.as_str()),
                ("v", self.version.as_str()),
                ("language", self.language.as_str()),
                ("libraries", libraries.as_str()),
                ("callback", PROVIDER_CALLBACK),
            ],
        )
        .map_err(|e| MapError::LoadFailed(e.to_string()))?;

        Ok(url.into())
    }
}

/// Lado "plataforma" del bootstrap: insertar el script e importar módulos
pub trait ScriptLoader: 'static {
    /// Módulo importado (en web: el objeto JS de la librería)
    type Module: 'static;

    /// El proveedor ya está presente en la página (otro loader lo instaló)
    fn preloaded(&self) -> bool {
        false
    }

    /// Dejar en la página un `importLibrary` que encola peticiones hasta la
    /// carga. Se llama justo antes de `inject`: otros loaders lo ven como
    /// `preloaded` y no insertan un segundo script.
    fn install_stub(&self) -> Result<(), MapError> {
        Ok(())
    }

    /// Insertar el script; `on_done` se llama una sola vez con el resultado
    fn inject(&self, url: &str, on_done: Box<dyn FnOnce(Result<(), MapError>)>);

    /// Importar un módulo una vez cargado el script
    fn import(&self, library: Library) -> ProviderFuture<Self::Module>;
}

type Waiter = oneshot::Sender<Result<(), MapError>>;

enum LoadState {
    Idle,
    Loading(Vec<Waiter>),
    Loaded,
    Failed(MapError),
}

enum Next {
    Inject(oneshot::Receiver<Result<(), MapError>>),
    Wait(oneshot::Receiver<Result<(), MapError>>),
    Ready,
    Failed(MapError),
}

/// Cargador memoizado del proveedor
pub struct ProviderBootstrap<L: ScriptLoader> {
    params: BootstrapParams,
    loader: Rc<L>,
    state: Rc<RefCell<LoadState>>,
    requested: RefCell<Vec<Library>>,
}

impl<L: ScriptLoader> ProviderBootstrap<L> {
    pub fn new(params: BootstrapParams, loader: L) -> Self {
        let state = if loader.preloaded() {
            log::warn!("⚠️ Proveedor de mapas ya presente en la página, se reutiliza su loader");
            LoadState::Loaded
        } else {
            LoadState::Idle
        };

        Self {
            params,
            loader: Rc::new(loader),
            state: Rc::new(RefCell::new(state)),
            requested: RefCell::new(Vec::new()),
        }
    }

    pub fn params(&self) -> &BootstrapParams {
        &self.params
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.borrow(), LoadState::Loaded)
    }

    /// Pedir un módulo. La primera petición dispara la carga del script.
    pub fn import_library(&self, library: Library) -> ProviderFuture<L::Module> {
        {
            let mut requested = self.requested.borrow_mut();
            if !requested.contains(&library) {
                requested.push(library);
            }
        }

        let next = {
            let mut state = self.state.borrow_mut();
            match &mut *state {
                LoadState::Idle => {
                    let (tx, rx) = oneshot::channel();
                    *state = LoadState::Loading(vec![tx]);
                    Next::Inject(rx)
                }
                LoadState::Loading(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Next::Wait(rx)
                }
                LoadState::Loaded => Next::Ready,
                LoadState::Failed(err) => Next::Failed(err.clone()),
            }
        };

        let waiter = match next {
            Next::Inject(rx) => {
                self.start_load();
                Some(rx)
            }
            Next::Wait(rx) => Some(rx),
            Next::Ready => None,
            Next::Failed(err) => return futures::future::ready(Err(err)).boxed_local(),
        };

        let loader = Rc::clone(&self.loader);
        async move {
            if let Some(rx) = waiter {
                match rx.await {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(MapError::LoadFailed("loader dropped".to_string()));
                    }
                }
            }
            loader.import(library).await
        }
        .boxed_local()
    }

    fn start_load(&self) {
        let url = match self.params.script_url(&self.requested.borrow()) {
            Ok(url) => url,
            Err(err) => {
                finish(&self.state, Err(err));
                return;
            }
        };

        if let Err(err) = self.loader.install_stub() {
            log::warn!("⚠️ No se pudo instalar importLibrary provisional: {}", err);
        }

        log::info!("🗺️ Cargando script del proveedor de mapas");
        let state = Rc::clone(&self.state);
        self.loader
            .inject(&url, Box::new(move |result| finish(&state, result)));
    }
}

/// Resolver todas las peticiones en espera con el resultado de la carga
fn finish(state: &RefCell<LoadState>, result: Result<(), MapError>) {
    let waiters = {
        let mut state = state.borrow_mut();
        let waiters = match &mut *state {
            LoadState::Loading(waiters) => std::mem::take(waiters),
            _ => return,
        };
        *state = match &result {
            Ok(()) => LoadState::Loaded,
            Err(err) => LoadState::Failed(err.clone()),
        };
        waiters
    };

    match &result {
        Ok(()) => log::info!("✅ Proveedor de mapas cargado"),
        Err(err) => log::error!("❌ {}", err),
    }

    for waiter in waiters {
        let _ = waiter.send(result.clone());
    }
}

/// Ranura "una por página" para el bootstrap
pub struct BootstrapSlot<L: ScriptLoader> {
    installed: RefCell<Option<Rc<ProviderBootstrap<L>>>>,
}

impl<L: ScriptLoader> Default for BootstrapSlot<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ScriptLoader> BootstrapSlot<L> {
    pub fn new() -> Self {
        Self {
            installed: RefCell::new(None),
        }
    }

    /// Instalar el bootstrap; si ya existe se devuelve el existente
    pub fn install(
        &self,
        params: BootstrapParams,
        make_loader: impl FnOnce() -> L,
    ) -> Rc<ProviderBootstrap<L>> {
        if let Some(existing) = self.installed.borrow().as_ref() {
            log::warn!(
                "⚠️ El proveedor de mapas solo se carga una vez. Ignorando: {:?}",
                params
            );
            return Rc::clone(existing);
        }

        let bootstrap = Rc::new(ProviderBootstrap::new(params, make_loader()));
        *self.installed.borrow_mut() = Some(Rc::clone(&bootstrap));
        bootstrap
    }
}
