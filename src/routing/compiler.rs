//! Compiling the routes document into router bindings.

use tracing::{debug, info, trace};

use super::{RouteHandle, RouteRegistry};
use crate::config::{load_document, BootOptions, Mapping, Value};
use crate::naming::ClassResolver;
use crate::store::{Lookup, Store};
use crate::Error;

/// HTTP method used when a route does not name one.
pub const DEFAULT_METHOD: &str = "GET";

const ROUTES_FILE: &str = "routes.yml";

/// A parameter constraint as written in the routes document.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Any value that is not a converter descriptor, kept verbatim.
    Assertion(Value),
    /// `{converter: {class, method}}`, plus the raw value it was read from.
    Converter {
        class: String,
        method: String,
        raw: Value,
    },
}

impl Constraint {
    pub fn parse(value: &Value) -> Self {
        let converter = value.get("converter");
        let class = converter.and_then(|c| c.get("class")).and_then(Value::as_str);
        let method = converter.and_then(|c| c.get("method")).and_then(Value::as_str);

        match (class, method) {
            (Some(class), Some(method)) => Constraint::Converter {
                class: class.to_string(),
                method: method.to_string(),
                raw: value.clone(),
            },
            _ => Constraint::Assertion(value.clone()),
        }
    }

    /// The `<class>:<method>` identifier of a converter descriptor.
    pub fn converter_key(&self) -> Option<String> {
        match self {
            Constraint::Converter { class, method, .. } => Some(format!("{class}:{method}")),
            Constraint::Assertion(_) => None,
        }
    }

    /// The value as it appeared in the document.
    pub fn raw(&self) -> &Value {
        match self {
            Constraint::Assertion(raw) | Constraint::Converter { raw, .. } => raw,
        }
    }
}

/// One entry of the routes document.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDefinition {
    pub bind_name: String,
    pub pattern: String,
    pub controller: String,
    pub action: String,
    pub method: String,
    pub params: Vec<(String, Constraint)>,
}

impl RouteDefinition {
    pub fn parse(bind_name: &str, entry: &Value) -> Result<Self, Error> {
        let invalid = |reason: String| Error::RouteDefinition {
            route: bind_name.to_string(),
            reason,
        };

        let Some(fields) = entry.as_mapping() else {
            return Err(invalid("entry must be a mapping".to_string()));
        };

        let required = |field: &str| match fields.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(invalid(format!("field '{field}' must be a string"))),
            None => Err(invalid(format!("missing required field '{field}'"))),
        };

        let method = match fields.get("method") {
            None => DEFAULT_METHOD.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(invalid("field 'method' must be a string".to_string())),
        };

        let params = match fields.get("params") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Mapping(params)) => params
                .iter()
                .map(|(name, constraint)| (name.clone(), Constraint::parse(constraint)))
                .collect(),
            Some(_) => return Err(invalid("field 'params' must be a mapping".to_string())),
        };

        Ok(Self {
            bind_name: bind_name.to_string(),
            pattern: required("pattern")?,
            controller: required("controller")?,
            action: required("action")?,
            method,
            params,
        })
    }

    /// `<resolved controller>::<action>Action`.
    pub fn handler(&self, resolver: &ClassResolver) -> String {
        format!("{}::{}Action", resolver.resolve(&self.controller), self.action)
    }
}

/// Loads the routes document and binds each entry in a [`RouteRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct RouteCompiler<'a> {
    options: &'a BootOptions,
    resolver: &'a ClassResolver,
}

impl<'a> RouteCompiler<'a> {
    pub fn new(options: &'a BootOptions, resolver: &'a ClassResolver) -> Self {
        Self { options, resolver }
    }

    /// Loads `path` (relative to the root) or `<root>/config/routes.yml`.
    pub fn load<R: RouteRegistry>(
        &self,
        path: Option<&str>,
        store: &Store,
        registry: &mut R,
    ) -> Result<(), Error> {
        let file = self.options.resolve_path(path, ROUTES_FILE);
        debug!(path = %file.display(), "loading routes");

        let document = load_document(&file)?;
        let count = self.compile(&document, store, registry)?;

        info!(path = %file.display(), count, "routes registered");
        Ok(())
    }

    /// Binds every route of an already loaded document, in document order.
    ///
    /// All entries are validated before the first one is registered.
    pub fn compile<R: RouteRegistry>(
        &self,
        document: &Mapping,
        store: &Store,
        registry: &mut R,
    ) -> Result<usize, Error> {
        let definitions = document
            .iter()
            .map(|(name, entry)| RouteDefinition::parse(name, entry))
            .collect::<Result<Vec<_>, _>>()?;

        for definition in &definitions {
            self.bind(definition, store, registry);
        }
        Ok(definitions.len())
    }

    fn bind<R: RouteRegistry>(&self, definition: &RouteDefinition, store: &Store, registry: &mut R) {
        let handler = definition.handler(self.resolver);
        debug!(
            name = %definition.bind_name,
            pattern = %definition.pattern,
            method = %definition.method,
            handler = %handler,
            "binding route"
        );

        let route = registry.register_route(&definition.pattern, &handler);
        for (param, constraint) in &definition.params {
            match constraint.converter_key() {
                Some(key) if matches!(store.lookup(&key), Lookup::Found(_)) => {
                    route.convert_param(param, &key);
                }
                Some(key) => {
                    // Converters must already be registered; otherwise the
                    // descriptor is kept as a plain assertion.
                    trace!(
                        route = %definition.bind_name,
                        param = %param,
                        converter = %key,
                        "converter not registered, asserting instead"
                    );
                    route.assert_param(param, constraint.raw());
                }
                None => {
                    route.assert_param(param, constraint.raw());
                }
            }
        }
        route.set_method(&definition.method).bind_name(&definition.bind_name);
    }
}
