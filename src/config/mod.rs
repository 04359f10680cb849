//! Configuration documents: reading, the value tree, and placeholder substitution.

mod error;
mod file;
mod options;
mod substitute;
mod value;

pub use error::{ConfigError, ParseSource};
pub use file::load_document;
pub use options::{BootOptions, CONFIG_DIR, DEFAULT_PLACEHOLDER, DEFAULT_ROOT_NAMESPACE};
pub use substitute::{substitute, substitute_mapping};
pub use value::{Mapping, Value};
