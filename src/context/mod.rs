//! Application context: the store, route table and class registry that the
//! bootstrap phases populate.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::BootOptions;
use crate::naming::ClassResolver;
use crate::routing::{RouteCompiler, RouteTable};
use crate::services::{ClassRegistry, ServiceRegistrar};
use crate::settings::SettingsLoader;
use crate::store::{Entry, Store};
use crate::Error;

/// Central application context.
///
/// Bootstrap runs once, single-threaded: [`init`](Self::init) loads settings,
/// then routes, then services. Each phase either applies fully or fails
/// without touching the context. Services are built later, on first
/// [`service`](Self::service) call, and shared afterwards.
///
/// ## Example
///
/// ```no_run
/// use calma_boot::AppContext;
///
/// struct Mailer;
///
/// let mut ctx = AppContext::builder()
///     .with_root("/srv/app")
///     .with_environment("prod")
///     .with_class("Mail/Service", |_| Mailer)
///     .build()?;
///
/// ctx.init(None)?;
///
/// let mailer = ctx.service::<Mailer>("mailer")?;
/// # Ok::<(), calma_boot::Error>(())
/// ```
#[derive(Debug)]
pub struct AppContext {
    options: BootOptions,
    resolver: ClassResolver,
    store: Store,
    routes: RouteTable,
    classes: ClassRegistry,
}

impl AppContext {
    /// Creates a new builder for constructing an `AppContext`.
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::default()
    }

    /// Runs the three bootstrap phases in order.
    ///
    /// `settings_path` overrides the settings file, relative to the root.
    pub fn init(&mut self, settings_path: Option<&str>) -> Result<(), Error> {
        self.load_settings(settings_path)?;
        self.load_routes(None)?;
        self.load_services(None)?;
        info!(
            root = %self.options.root.display(),
            routes = self.routes.len(),
            entries = self.store.len(),
            "application initialized"
        );
        Ok(())
    }

    pub fn load_settings(&mut self, path: Option<&str>) -> Result<(), Error> {
        SettingsLoader::new(&self.options).load(path, &mut self.store)
    }

    pub fn load_routes(&mut self, path: Option<&str>) -> Result<(), Error> {
        RouteCompiler::new(&self.options, &self.resolver).load(path, &self.store, &mut self.routes)
    }

    pub fn load_services(&mut self, path: Option<&str>) -> Result<(), Error> {
        ServiceRegistrar::new(&self.options, &self.resolver).load(path, &mut self.store)
    }

    /// Resolves a registered service, building it on first access.
    pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, Error> {
        let Some(Entry::Service(slot)) = self.store.entry(name) else {
            return Err(Error::ServiceNotFound(name.to_string()));
        };
        slot.resolve(self)?
            .downcast::<T>()
            .map_err(|_| Error::ServiceType {
                service: name.to_string(),
            })
    }

    /// Reads a stored setting into a typed value.
    ///
    /// Returns `Ok(None)` when no plain value is stored under `key`.
    pub fn setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        self.store
            .get(key)
            .map(|value| serde_yaml::to_value(value).and_then(serde_yaml::from_value))
            .transpose()
            .map_err(|source| Error::Setting {
                key: key.to_string(),
                source,
            })
    }

    pub fn options(&self) -> &BootOptions {
        &self.options
    }

    pub fn resolver(&self) -> &ClassResolver {
        &self.resolver
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }
}

/// Builder for constructing an [`AppContext`].
///
/// Values set on the builder can be overridden from the process environment
/// with [`with_env`](Self::with_env).
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct AppContextBuilder {
    root: Option<PathBuf>,
    environment: Option<String>,
    root_namespace: Option<String>,
    placeholder: Option<String>,
    env_prefix: Option<String>,
    classes: ClassRegistry,
}

impl AppContextBuilder {
    /// Sets the application root. Config files and the settings placeholder
    /// both resolve against it.
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Selects `config/settings_<environment>.yml` as the settings file.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_root_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.root_namespace = Some(namespace.into());
        self
    }

    /// Replaces the `ROOT` token substituted in settings values.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Applies `<prefix>_ROOT`, `<prefix>_ENV`, `<prefix>_ROOT_NAMESPACE` and
    /// `<prefix>_PLACEHOLDER` from the process environment at build time,
    /// overriding the builder's values.
    pub fn with_env(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Registers a constructor for a class that services may name.
    ///
    /// `class` may be relative (`Mail/Service`) or fully qualified
    /// (`\Calma\Mail\Service`); relative names are qualified with the root
    /// namespace at build time.
    pub fn with_class<T, F>(mut self, class: impl Into<String>, constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&AppContext) -> T + Send + Sync + 'static,
    {
        self.classes.register(class, constructor);
        self
    }

    /// Builds the `AppContext`.
    ///
    /// Returns an error if no root directory was provided.
    pub fn build(self) -> Result<AppContext, Error> {
        let mut options = BootOptions::new(self.root.unwrap_or_default());
        if let Some(environment) = self.environment {
            options.environment = Some(environment);
        }
        if let Some(namespace) = self.root_namespace {
            options.root_namespace = namespace;
        }
        if let Some(placeholder) = self.placeholder {
            options.placeholder = placeholder;
        }
        if let Some(prefix) = &self.env_prefix {
            options.apply_process_env(prefix);
        }

        if options.root.as_os_str().is_empty() {
            return Err(Error::MissingRoot);
        }
        options.root = std::path::absolute(&options.root).map_err(|source| Error::InvalidRoot {
            path: options.root.clone(),
            source,
        })?;

        let resolver = ClassResolver::new(options.root_namespace.clone());
        let classes = self.classes.qualified(&resolver);

        Ok(AppContext {
            options,
            resolver,
            store: Store::new(),
            routes: RouteTable::new(),
            classes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, Value};
    use crate::routing::ParamRule;
    use serde::Deserialize;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const SETTINGS: &str = "db_path: ROOT/data\ndebug: false\ndatabase:\n  host: localhost\n  port: 5432\n";

    const ROUTES: &str = r#"
user_show:
  pattern: /users/{id}
  controller: User/Controller
  action: show
  params:
    id: '\d+'
user_edit:
  pattern: /users/{user}/edit
  controller: User/Controller
  action: edit
  method: GET|POST
  params:
    user:
      converter: { class: user.converter, method: convert }
"#;

    const SERVICES: &str = "mailer: Mail/Service\n";

    struct Mailer {
        root: PathBuf,
    }

    fn app_root(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    fn full_app() -> TempDir {
        app_root(&[
            ("config/settings.yml", SETTINGS),
            ("config/routes.yml", ROUTES),
            ("config/services.yml", SERVICES),
        ])
    }

    #[test]
    fn test_build_requires_root() {
        let result = AppContext::builder().build();

        assert!(matches!(result, Err(Error::MissingRoot)));
    }

    #[test]
    fn test_init_wires_everything() {
        let dir = full_app();
        let mut ctx = AppContext::builder()
            .with_root(dir.path())
            .with_class("Mail/Service", |ctx: &AppContext| Mailer {
                root: ctx.options().root.clone(),
            })
            .build()
            .unwrap();

        ctx.init(None).unwrap();

        let expected = format!("{}/data", ctx.options().root.display());
        assert_eq!(ctx.store().get("db_path"), Some(&Value::from(expected)));

        let show = ctx.routes().get("user_show").unwrap();
        assert_eq!(show.handler(), r"\Calma\User\Controller::showAction");
        assert_eq!(show.method(), "GET");

        let edit = ctx.routes().get("user_edit").unwrap();
        assert_eq!(edit.method(), "GET|POST");
        assert!(matches!(edit.param("user"), Some(ParamRule::Assert(_))));

        let mailer = ctx.service::<Mailer>("mailer").unwrap();
        assert_eq!(mailer.root, ctx.options().root);
    }

    #[test]
    fn test_service_constructed_once() {
        let dir = full_app();
        let constructed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructed);
        let mut ctx = AppContext::builder()
            .with_root(dir.path())
            .with_class(r"\Calma\Mail\Service", move |ctx: &AppContext| {
                counter.fetch_add(1, Ordering::SeqCst);
                Mailer {
                    root: ctx.options().root.clone(),
                }
            })
            .build()
            .unwrap();
        ctx.init(None).unwrap();

        assert_eq!(constructed.load(Ordering::SeqCst), 0);

        let first = ctx.service::<Mailer>("mailer").unwrap();
        let second = ctx.service::<Mailer>("mailer").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_converter_bound_when_registered_before_routes() {
        let dir = full_app();
        let mut ctx = AppContext::builder().with_root(dir.path()).build().unwrap();

        ctx.load_settings(None).unwrap();
        ctx.store_mut().set("user.converter:convert", Value::Null);
        ctx.load_routes(None).unwrap();

        assert_eq!(
            ctx.routes().get("user_edit").unwrap().param("user"),
            Some(&ParamRule::Convert("user.converter:convert".into()))
        );
    }

    #[test]
    fn test_unregistered_class_fails_on_access() {
        let dir = full_app();
        let mut ctx = AppContext::builder().with_root(dir.path()).build().unwrap();

        ctx.init(None).unwrap();

        assert!(matches!(
            ctx.service::<Mailer>("mailer"),
            Err(Error::UnresolvedReference(ref class)) if class == r"\Calma\Mail\Service"
        ));
    }

    #[test]
    fn test_service_type_mismatch_and_unknown_service() {
        let dir = full_app();
        let mut ctx = AppContext::builder()
            .with_root(dir.path())
            .with_class("Mail/Service", |_: &AppContext| 7u32)
            .build()
            .unwrap();
        ctx.init(None).unwrap();

        assert!(matches!(
            ctx.service::<Mailer>("mailer"),
            Err(Error::ServiceType { .. })
        ));
        assert_eq!(*ctx.service::<u32>("mailer").unwrap(), 7);
        assert!(matches!(
            ctx.service::<u32>("db_path"),
            Err(Error::ServiceNotFound(_))
        ));
    }

    #[test]
    fn test_custom_root_namespace() {
        let dir = full_app();
        let mut ctx = AppContext::builder()
            .with_root(dir.path())
            .with_root_namespace("Acme")
            .with_class("Mail/Service", |_: &AppContext| 1u8)
            .build()
            .unwrap();

        ctx.init(None).unwrap();

        assert_eq!(
            ctx.routes().get("user_show").unwrap().handler(),
            r"\Acme\User\Controller::showAction"
        );
        assert!(ctx.classes().contains(r"\Acme\Mail\Service"));
        assert!(ctx.service::<u8>("mailer").is_ok());
    }

    #[test]
    fn test_missing_routes_file_aborts_init() {
        let dir = app_root(&[
            ("config/settings.yml", SETTINGS),
            ("config/services.yml", SERVICES),
        ]);
        let mut ctx = AppContext::builder().with_root(dir.path()).build().unwrap();

        let result = ctx.init(None);

        match result {
            Err(Error::Config(ConfigError::FileNotFound(path))) => {
                assert!(path.ends_with("config/routes.yml"));
            }
            other => panic!("expected FileNotFound, got {other:?}"),
        }
        assert!(ctx.routes().is_empty());
        assert!(!ctx.store().has("mailer"));
    }

    #[test]
    fn test_typed_setting() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Database {
            host: String,
            port: u16,
        }

        let dir = full_app();
        let mut ctx = AppContext::builder().with_root(dir.path()).build().unwrap();
        ctx.load_settings(None).unwrap();

        let database: Database = ctx.setting("database").unwrap().unwrap();
        assert_eq!(
            database,
            Database {
                host: "localhost".into(),
                port: 5432
            }
        );
        assert_eq!(ctx.setting::<bool>("debug").unwrap(), Some(false));
        assert_eq!(ctx.setting::<bool>("absent").unwrap(), None);
        assert!(matches!(
            ctx.setting::<u16>("db_path"),
            Err(Error::Setting { .. })
        ));
    }
}
