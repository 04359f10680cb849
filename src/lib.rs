pub mod config;
pub mod context;
mod error;
pub mod naming;
pub mod routing;
pub mod services;
pub mod settings;
pub mod store;

pub use config::{BootOptions, ConfigError, Value};
pub use context::{AppContext, AppContextBuilder};
pub use error::Error;
pub use naming::ClassResolver;
pub use routing::{ParamRule, Route, RouteCompiler, RouteHandle, RouteRegistry, RouteTable};
pub use services::{ClassRegistry, ServiceRegistrar};
pub use settings::SettingsLoader;
pub use store::{Lookup, Store};
