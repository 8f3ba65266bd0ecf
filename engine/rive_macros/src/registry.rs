//! Object macro registry.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// A registered object macro.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectMacro {
    name: String,
    language: String,
    body: String,
}

impl ObjectMacro {
    pub fn new(
        name: impl Into<String>,
        language: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        ObjectMacro {
            name: name.into(),
            language: language.into(),
            body: body.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Language tag selecting the handler, e.g. `perl`.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Source code, opaque to the core.
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Name to macro mapping.
///
/// Read-mostly: lookups take the read lock just long enough to clone an
/// `Arc`, so a call in flight keeps the definition it started with even if
/// the macro is redefined meanwhile.
#[derive(Default)]
pub struct MacroRegistry {
    macros: RwLock<FxHashMap<String, Arc<ObjectMacro>>>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a macro, replacing any previous one with the same name.
    ///
    /// Returns the definition that was replaced.
    pub fn register(&self, object: ObjectMacro) -> Option<Arc<ObjectMacro>> {
        let name = object.name.clone();
        let previous = self.macros.write().insert(name, Arc::new(object));
        if let Some(previous) = &previous {
            tracing::debug!(name = previous.name(), "redefined object macro");
        }
        previous
    }

    /// Snapshot of the macro registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<Arc<ObjectMacro>> {
        self.macros.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.macros.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.macros.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn register_and_lookup() {
        let registry = MacroRegistry::new();
        assert!(registry.is_empty());
        assert!(registry
            .register(ObjectMacro::new("md5", "perl", "return 1;"))
            .is_none());

        let found = registry.lookup("md5");
        assert_eq!(
            found.as_deref(),
            Some(&ObjectMacro::new("md5", "perl", "return 1;"))
        );
        assert!(registry.contains("md5"));
        assert_eq!(registry.lookup("sha1"), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn redefinition_overwrites_but_keeps_snapshots() {
        let registry = MacroRegistry::new();
        registry.register(ObjectMacro::new("greet", "perl", "v1"));
        let in_flight = registry.lookup("greet");

        let replaced = registry.register(ObjectMacro::new("greet", "python", "v2"));
        assert_eq!(replaced.as_deref().map(ObjectMacro::body), Some("v1"));

        // The earlier snapshot is unaffected.
        assert_eq!(in_flight.as_deref().map(ObjectMacro::body), Some("v1"));
        let current = registry.lookup("greet");
        assert_eq!(current.as_deref().map(ObjectMacro::language), Some("python"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_are_sorted() {
        let registry = MacroRegistry::new();
        for name in ["nametest", "md5", "perlver"] {
            registry.register(ObjectMacro::new(name, "perl", ""));
        }
        assert_eq!(registry.names(), vec!["md5", "nametest", "perlver"]);
    }
}
