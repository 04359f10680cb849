//! Service registration: the last bootstrap phase.
//!
//! Services are never built here. Each entry becomes a deferred factory in
//! the store, and the class it names is looked up in the [`ClassRegistry`]
//! when the service is first resolved.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{load_document, BootOptions, Mapping, Value};
use crate::context::AppContext;
use crate::naming::ClassResolver;
use crate::store::{Factory, Instance, Store};
use crate::Error;

const SERVICES_FILE: &str = "services.yml";

type Constructor = Arc<dyn Fn(&AppContext) -> Instance + Send + Sync>;

/// Constructors known to the application, keyed by fully-qualified class name.
#[derive(Clone, Default)]
pub struct ClassRegistry {
    constructors: HashMap<String, Constructor>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `constructor` under `class`, replacing any previous one.
    pub fn register<T, F>(&mut self, class: impl Into<String>, constructor: F)
    where
        T: Any + Send + Sync,
        F: Fn(&AppContext) -> T + Send + Sync + 'static,
    {
        let boxed: Constructor =
            Arc::new(move |ctx: &AppContext| Arc::new(constructor(ctx)) as Instance);
        self.constructors.insert(class.into(), boxed);
    }

    /// Re-keys every constructor by its fully-qualified name.
    pub(crate) fn qualified(self, resolver: &ClassResolver) -> Self {
        Self {
            constructors: self
                .constructors
                .into_iter()
                .map(|(class, constructor)| (resolver.resolve(&class), constructor))
                .collect(),
        }
    }

    pub fn contains(&self, class: &str) -> bool {
        self.constructors.contains_key(class)
    }

    /// Builds an instance of `class` with the application as its argument.
    pub fn construct(&self, class: &str, ctx: &AppContext) -> Result<Instance, Error> {
        let constructor = self
            .constructors
            .get(class)
            .ok_or_else(|| Error::UnresolvedReference(class.to_string()))?;
        Ok(constructor(ctx))
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

/// One entry of the services document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub name: String,
    pub class: String,
}

impl ServiceDefinition {
    pub fn parse(name: &str, entry: &Value) -> Result<Self, Error> {
        let class = entry.as_str().ok_or_else(|| Error::ServiceDefinition {
            service: name.to_string(),
        })?;
        Ok(Self {
            name: name.to_string(),
            class: class.to_string(),
        })
    }
}

/// Loads the services document and registers a deferred factory per entry.
#[derive(Debug, Clone, Copy)]
pub struct ServiceRegistrar<'a> {
    options: &'a BootOptions,
    resolver: &'a ClassResolver,
}

impl<'a> ServiceRegistrar<'a> {
    pub fn new(options: &'a BootOptions, resolver: &'a ClassResolver) -> Self {
        Self { options, resolver }
    }

    /// Loads `path` (relative to the root) or `<root>/config/services.yml`.
    pub fn load(&self, path: Option<&str>, store: &mut Store) -> Result<(), Error> {
        let file = self.options.resolve_path(path, SERVICES_FILE);
        debug!(path = %file.display(), "loading services");

        let document = load_document(&file)?;
        let count = self.register(&document, store)?;

        info!(path = %file.display(), count, "services registered");
        Ok(())
    }

    /// Registers every service of an already loaded document.
    ///
    /// All entries are validated before the first factory is stored.
    pub fn register(&self, document: &Mapping, store: &mut Store) -> Result<usize, Error> {
        let definitions = document
            .iter()
            .map(|(name, entry)| ServiceDefinition::parse(name, entry))
            .collect::<Result<Vec<_>, _>>()?;

        for definition in &definitions {
            let class = self.resolver.resolve(&definition.class);
            debug!(service = %definition.name, class = %class, "registering service");
            store.set_factory(definition.name.clone(), factory_for(class));
        }
        Ok(definitions.len())
    }
}

fn factory_for(class: String) -> Factory {
    Arc::new(move |ctx: &AppContext| ctx.classes().construct(&class, ctx))
}
