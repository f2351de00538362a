//! Single-flight lazy loading of expensive models.
//!
//! A [`LazyModel`] starts its load at most once. Every caller awaits the same
//! in-flight load under its own deadline; a caller that gives up does not
//! cancel the load, so later callers still benefit from it. A failed load is
//! remembered as unavailable.

use crate::error::{Error, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<T>>> + Send + Sync>;
type SharedLoad<T> = Shared<BoxFuture<'static, Option<Arc<T>>>>;

/// Lazily loaded, shareable model handle.
pub struct LazyModel<T: ?Sized + Send + Sync + 'static> {
    name: &'static str,
    loader: Loader<T>,
    state: Mutex<Option<SharedLoad<T>>>,
}

impl<T: ?Sized + Send + Sync + 'static> LazyModel<T> {
    /// Model loaded by an async `loader`, started on first use.
    pub fn new<F, Fut>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<T>>> + Send + 'static,
    {
        Self {
            name,
            loader: Arc::new(move || loader().boxed()),
            state: Mutex::new(None),
        }
    }

    /// Model loaded by a blocking function on the blocking thread pool.
    pub fn blocking<F>(name: &'static str, load: F) -> Self
    where
        F: Fn() -> Result<Arc<T>> + Send + Sync + 'static,
    {
        let load = Arc::new(load);
        Self::new(name, move || {
            let load = Arc::clone(&load);
            async move {
                tokio::task::spawn_blocking(move || load())
                    .await
                    .map_err(|e| Error::ModelLoad(format!("{} loader panicked: {}", name, e)))?
            }
        })
    }

    /// Model that is available immediately.
    pub fn ready(name: &'static str, model: Arc<T>) -> Self {
        let handle = Arc::clone(&model);
        let lazy = Self::new(name, move || {
            let model = Arc::clone(&handle);
            async move { Ok(model) }
        });
        let loaded = futures::future::ready(Some(model)).boxed().shared();
        *lazy.lock() = Some(loaded);
        lazy
    }

    /// Model name used in log messages.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Start loading in the background. Without a tokio runtime this does
    /// nothing.
    pub fn warm(&self) {
        if tokio::runtime::Handle::try_current().is_err() {
            log::debug!("no async runtime; not warming {}", self.name);
            return;
        }
        let _ = self.start();
    }

    /// Wait up to `deadline` for the model. `None` when the load failed or is
    /// still running.
    pub async fn get(&self, deadline: Duration) -> Option<Arc<T>> {
        let load = self.start();
        match tokio::time::timeout(deadline, load).await {
            Ok(model) => model,
            Err(_) => {
                log::debug!("{} not ready within {:?}", self.name, deadline);
                None
            }
        }
    }

    /// The model if its load has already finished successfully.
    pub fn loaded(&self) -> Option<Arc<T>> {
        self.lock()
            .as_ref()
            .and_then(|load| load.peek().cloned())
            .flatten()
    }

    /// Whether a load has been started.
    pub fn is_started(&self) -> bool {
        self.lock().is_some()
    }

    fn start(&self) -> SharedLoad<T> {
        let mut state = self.lock();
        if let Some(load) = state.as_ref() {
            return load.clone();
        }

        let loader = Arc::clone(&self.loader);
        let name = self.name;
        let load = async move {
            let started = Instant::now();
            match loader().await {
                Ok(model) => {
                    log::debug!("{} loaded in {:?}", name, started.elapsed());
                    Some(model)
                }
                Err(e) => {
                    log::warn!("{} unavailable: {}", name, e);
                    None
                }
            }
        }
        .boxed()
        .shared();

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(load.clone());
        }
        *state = Some(load.clone());
        load
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<SharedLoad<T>>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: ?Sized + Send + Sync + 'static> fmt::Debug for LazyModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyModel")
            .field("name", &self.name)
            .field("started", &self.is_started())
            .finish()
    }
}
