//! Reading configuration documents from disk.

use std::path::Path;

use super::value::{Mapping, Value};
use super::ConfigError;

/// Loads and parses a configuration document.
///
/// `.toml` files are parsed as TOML; anything else is parsed as YAML. The
/// document must be a mapping at the top level. An empty YAML document is
/// read as an empty mapping.
pub fn load_document(path: &Path) -> Result<Mapping, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let value = if is_toml(path) {
        parse_toml(path, &contents)?
    } else {
        parse_yaml(path, &contents)?
    };

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ConfigError::NotAMapping(path.to_path_buf())),
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

fn parse_yaml(path: &Path, contents: &str) -> Result<Value, ConfigError> {
    serde_yaml::from_str(contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: Box::new(e),
    })
}

fn parse_toml(path: &Path, contents: &str) -> Result<Value, ConfigError> {
    let table: toml::Table = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    Ok(from_toml(toml::Value::Table(table)))
}

fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Integer(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Sequence(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Mapping(
            table
                .into_iter()
                .map(|(key, value)| (key, from_toml(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_loads_yaml_in_document_order() {
        let file = temp_file(
            ".yml",
            "zeta: 1\nalpha:\n  - on\n  - 2.5\nname: app\n",
        );

        let doc = load_document(file.path()).unwrap();

        let keys: Vec<_> = doc.keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", "name"]);
        assert_eq!(doc["zeta"], Value::Integer(1));
        assert_eq!(doc["name"], Value::from("app"));
        assert_eq!(doc["alpha"].as_sequence().unwrap()[1], Value::Float(2.5));
    }

    #[test]
    fn test_loads_toml_by_extension() {
        let file = temp_file(".toml", "[server]\nhost = \"localhost\"\nport = 8080\n");

        let doc = load_document(file.path()).unwrap();

        assert_eq!(doc["server"].get("host"), Some(&Value::from("localhost")));
        assert_eq!(doc["server"].get("port"), Some(&Value::Integer(8080)));
    }

    #[test]
    fn test_numeric_keys_are_stringified() {
        let file = temp_file(".yml", "codes:\n  404: missing\n");

        let doc = load_document(file.path()).unwrap();

        assert_eq!(doc["codes"].get("404"), Some(&Value::from("missing")));
    }

    #[test]
    fn test_repeated_key_overrides_earlier_value() {
        let file = temp_file(".yml", "mailer: Mail/Old\ncache: Cache/Redis\nmailer: Mail/Service\n");

        let doc = load_document(file.path()).unwrap();

        assert_eq!(doc.len(), 2);
        assert_eq!(doc["mailer"], Value::from("Mail/Service"));
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        let file = temp_file(".yml", "");

        assert!(load_document(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let result = load_document(Path::new("/nonexistent/config/routes.yml"));

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_malformed_yaml() {
        let file = temp_file(".yml", "key: [unclosed\n");

        let result = load_document(file.path());

        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_top_level_sequence_rejected() {
        let file = temp_file(".yml", "- a\n- b\n");

        let result = load_document(file.path());

        assert!(matches!(result, Err(ConfigError::NotAMapping(_))));
    }
}
