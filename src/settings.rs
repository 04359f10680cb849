//! Settings loading: the first bootstrap phase.

use tracing::{debug, info};

use crate::config::{load_document, substitute_mapping, BootOptions};
use crate::store::Store;
use crate::Error;

/// Loads the settings document into the store.
///
/// The placeholder token is replaced with the application root in every
/// string value, then each top-level key is written to the store,
/// overwriting what was there.
#[derive(Debug, Clone, Copy)]
pub struct SettingsLoader<'a> {
    options: &'a BootOptions,
}

impl<'a> SettingsLoader<'a> {
    pub fn new(options: &'a BootOptions) -> Self {
        Self { options }
    }

    /// Loads `path` (relative to the root) or `<root>/config/settings[_<env>].yml`.
    pub fn load(&self, path: Option<&str>, store: &mut Store) -> Result<(), Error> {
        let file = self
            .options
            .resolve_path(path, &self.options.settings_file());
        debug!(path = %file.display(), "loading settings");

        let document = load_document(&file)?;
        let compiled = substitute_mapping(
            &document,
            &self.options.placeholder,
            &self.options.root_string(),
        );

        let count = compiled.len();
        for (key, value) in compiled {
            store.set(key, value);
        }

        info!(path = %file.display(), count, "settings loaded");
        Ok(())
    }
}
