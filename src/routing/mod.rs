//! Route registration.
//!
//! [`RouteRegistry`] and [`RouteHandle`] are the surface a host router must
//! offer for [`RouteCompiler`] to wire routes into it. [`RouteTable`] is the
//! in-memory implementation used by [`AppContext`](crate::AppContext).

mod compiler;

use indexmap::IndexMap;

use crate::config::Value;

pub use compiler::{Constraint, RouteCompiler, RouteDefinition, DEFAULT_METHOD};

/// A registered route being configured.
pub trait RouteHandle {
    /// Requires the path parameter `name` to satisfy `requirement`.
    fn assert_param(&mut self, name: &str, requirement: &Value) -> &mut Self;

    /// Passes the path parameter `name` through the converter `converter`.
    fn convert_param(&mut self, name: &str, converter: &str) -> &mut Self;

    fn set_method(&mut self, method: &str) -> &mut Self;

    fn bind_name(&mut self, name: &str) -> &mut Self;
}

/// A router accepting pattern-to-handler bindings.
pub trait RouteRegistry {
    type Handle: RouteHandle;

    fn register_route(&mut self, pattern: &str, handler: &str) -> &mut Self::Handle;
}

/// How a path parameter is constrained.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamRule {
    /// The matched text must satisfy this requirement.
    Assert(Value),
    /// The matched text is transformed by the named converter.
    Convert(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pattern: String,
    handler: String,
    method: String,
    name: Option<String>,
    params: IndexMap<String, ParamRule>,
}

impl Route {
    pub fn new(pattern: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            handler: handler.into(),
            method: DEFAULT_METHOD.to_string(),
            name: None,
            params: IndexMap::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Handler identifier, `<class>::<action>Action`.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn param(&self, name: &str) -> Option<&ParamRule> {
        self.params.get(name)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &ParamRule)> {
        self.params.iter().map(|(name, rule)| (name.as_str(), rule))
    }
}

impl RouteHandle for Route {
    fn assert_param(&mut self, name: &str, requirement: &Value) -> &mut Self {
        self.params
            .insert(name.to_string(), ParamRule::Assert(requirement.clone()));
        self
    }

    fn convert_param(&mut self, name: &str, converter: &str) -> &mut Self {
        self.params
            .insert(name.to_string(), ParamRule::Convert(converter.to_string()));
        self
    }

    fn set_method(&mut self, method: &str) -> &mut Self {
        self.method = method.to_string();
        self
    }

    fn bind_name(&mut self, name: &str) -> &mut Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Routes in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a route by bind name. When a name was bound twice, the later
    /// route wins.
    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.iter().rev().find(|route| route.name() == Some(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteRegistry for RouteTable {
    type Handle = Route;

    fn register_route(&mut self, pattern: &str, handler: &str) -> &mut Route {
        self.routes.push(Route::new(pattern, handler));
        let last = self.routes.len() - 1;
        &mut self.routes[last]
    }
}
