//! Bootstrap options: where the application lives and how names are resolved.

use std::path::{Path, PathBuf};

/// Root namespace used when none is configured.
pub const DEFAULT_ROOT_NAMESPACE: &str = "Calma";

/// Token replaced by the application root in settings values.
pub const DEFAULT_PLACEHOLDER: &str = "ROOT";

/// Directory, relative to the root, holding the default config files.
pub const CONFIG_DIR: &str = "config";

/// Options shared by the three loaders.
#[derive(Debug, Clone, PartialEq)]
pub struct BootOptions {
    pub root: PathBuf,
    pub environment: Option<String>,
    pub root_namespace: String,
    pub placeholder: String,
}

impl BootOptions {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            environment: None,
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    /// Default settings file name, e.g. `settings_dev.yml` for environment `dev`.
    pub fn settings_file(&self) -> String {
        match self.environment.as_deref() {
            Some(env) if !env.is_empty() => format!("settings_{env}.yml"),
            _ => "settings.yml".to_string(),
        }
    }

    /// Resolves a config file path against the application root.
    ///
    /// An explicit path is always taken relative to the root, even when it
    /// starts with `/`. Without one, `<root>/config/<default_file>` is used.
    pub fn resolve_path(&self, explicit: Option<&str>, default_file: &str) -> PathBuf {
        match explicit {
            Some(path) => self.root.join(path.trim_start_matches('/')),
            None => self.root.join(CONFIG_DIR).join(default_file),
        }
    }

    /// The root path as substituted into settings values.
    pub fn root_string(&self) -> String {
        self.root.to_string_lossy().into_owned()
    }

    /// Overrides options from environment variables named `<PREFIX>_<OPTION>`.
    ///
    /// Recognised options are `ROOT`, `ENV`, `ROOT_NAMESPACE` and
    /// `PLACEHOLDER`. An empty `ENV` clears the environment; other empty
    /// values are ignored.
    pub fn apply_env<I, K, V>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let prefix_with_sep = format!("{prefix}_");

        for (key, value) in vars {
            let Some(option) = key.as_ref().strip_prefix(&prefix_with_sep) else {
                continue;
            };
            let value = value.into();

            match option {
                "ENV" => self.environment = (!value.is_empty()).then_some(value),
                _ if value.is_empty() => {}
                "ROOT" => self.root = PathBuf::from(value),
                "ROOT_NAMESPACE" => self.root_namespace = value,
                "PLACEHOLDER" => self.placeholder = value,
                _ => {}
            }
        }
    }

    /// Overrides options from the process environment. See [`apply_env`](Self::apply_env).
    pub fn apply_process_env(&mut self, prefix: &str) {
        self.apply_env(prefix, std::env::vars());
    }
}
