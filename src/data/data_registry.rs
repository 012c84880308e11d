//! One-shot holder for the dataset store.
//! Built at most once per registry; shared via Arc with handlers so nothing reloads per request.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{error, info};

use crate::data::rules::CleaningRules;
use crate::data::store::{DatasetSource, DatasetStore, LoadError};

type StoreLoader = Box<dyn Fn() -> Result<DatasetStore, LoadError> + Send + Sync>;

/// Lazily built, read-only store. Concurrent first callers block on the same
/// initialization; the outcome, success or failure, is kept for the process lifetime.
pub struct DataRegistry {
    loader: StoreLoader,
    store: OnceCell<Result<DatasetStore, LoadError>>,
}

impl DataRegistry {
    /// Registry that builds its store from `source` on first access.
    pub fn new(source: DatasetSource, rules: CleaningRules) -> Arc<Self> {
        Self::with_loader(move || {
            info!(path = %source.path.display(), "building dataset store");
            DatasetStore::setup(&source, &rules)
        })
    }

    pub fn with_loader<F>(loader: F) -> Arc<Self>
    where
        F: Fn() -> Result<DatasetStore, LoadError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            loader: Box::new(loader),
            store: OnceCell::new(),
        })
    }

    /// The store, running setup on first access.
    pub fn get(&self) -> Result<&DatasetStore, &LoadError> {
        self.store
            .get_or_init(|| {
                let built = (self.loader)();
                if let Err(err) = &built {
                    error!("dataset setup failed: {err}");
                }
                built
            })
            .as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.store.get(), Some(Ok(_)))
    }

    /// Whether setup has already run, successfully or not.
    pub fn is_initialized(&self) -> bool {
        self.store.get().is_some()
    }
}

impl fmt::Debug for DataRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataRegistry")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
