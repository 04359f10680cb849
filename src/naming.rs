//! Class-name resolution shared by routes and services.

use crate::config::DEFAULT_ROOT_NAMESPACE;

/// Prefix marking a fully-qualified class name.
pub const ROOT_QUALIFIER: char = '\\';

/// Separator between namespace segments in a resolved name.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// Turns `/`-separated class references into fully-qualified class names
/// under a root namespace.
///
/// `User/Controller` with root namespace `Calma` resolves to
/// `\Calma\User\Controller`. A reference that already starts with the root
/// qualifier is taken as fully qualified, so resolving a resolved name
/// returns it unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassResolver {
    root_namespace: String,
}

impl ClassResolver {
    pub fn new(root_namespace: impl Into<String>) -> Self {
        Self {
            root_namespace: root_namespace.into(),
        }
    }

    pub fn root_namespace(&self) -> &str {
        &self.root_namespace
    }

    pub fn resolve(&self, reference: &str) -> String {
        let separator = NAMESPACE_SEPARATOR.to_string();
        if reference.starts_with(ROOT_QUALIFIER) {
            return reference.replace('/', &separator);
        }
        // `/User/Controller` is still relative to the root namespace.
        let relative = reference.trim_start_matches('/').replace('/', &separator);
        format!(
            "{ROOT_QUALIFIER}{}{NAMESPACE_SEPARATOR}{relative}",
            self.root_namespace
        )
    }
}

impl Default for ClassResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_under_default_namespace() {
        let resolver = ClassResolver::default();

        assert_eq!(resolver.resolve("User/Controller"), r"\Calma\User\Controller");
        assert_eq!(resolver.resolve("Mail/Service"), r"\Calma\Mail\Service");
    }

    #[test]
    fn test_configurable_namespace() {
        let resolver = ClassResolver::new("Acme");

        assert_eq!(resolver.resolve("Blog/Post"), r"\Acme\Blog\Post");
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let resolver = ClassResolver::default();
        let once = resolver.resolve("Admin/User/Controller");

        assert_eq!(resolver.resolve(&once), once);
    }

    #[test]
    fn test_leading_slash_stays_under_root_namespace() {
        let resolver = ClassResolver::default();

        assert_eq!(resolver.resolve("/User/Controller"), r"\Calma\User\Controller");
        assert_eq!(resolver.resolve("/User/Controller"), resolver.resolve("User/Controller"));
    }

    #[test]
    fn test_depth_is_preserved() {
        let resolver = ClassResolver::default();

        assert_ne!(resolver.resolve("a/b"), resolver.resolve("ab"));
        assert_ne!(resolver.resolve("a/b"), resolver.resolve("a"));
    }
}
