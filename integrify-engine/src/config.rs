use integrify_model::ConfigOptions;
use integrify_store::DocumentStore;
use std::fmt;
use std::sync::Arc;

/// Store handle and options shared by every compiled trigger.
///
/// Set once on [`Integrify`](crate::Integrify) before rules are compiled.
/// Handlers hold it behind an `Arc` and never mutate it.
#[derive(Clone)]
pub struct IntegrifyConfig {
    pub store: Arc<dyn DocumentStore>,
    pub options: ConfigOptions,
}

impl IntegrifyConfig {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            options: ConfigOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConfigOptions) -> Self {
        self.options = options;
        self
    }

    pub fn verbose(&self) -> bool {
        self.options.verbose
    }
}

impl fmt::Debug for IntegrifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrifyConfig")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
