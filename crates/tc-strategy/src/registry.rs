//! Catalogue of available strategies and their factories — decoupled from
//! the arbitrator so the daemon can enumerate/select strategies by name
//! without running them.

use crate::types::Strategy;

pub type StrategyFactory = Box<dyn Fn() -> Box<dyn Strategy> + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyMeta {
    pub name: String,
    pub description: String,
}

impl StrategyMeta {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(!name.trim().is_empty(), "StrategyMeta name must not be empty");
        Self {
            name,
            description: description.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateName { name: String },
    UnknownStrategy { name: String },
    EmptyName,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName { name } => write!(f, "strategy '{name}' is already registered"),
            Self::UnknownStrategy { name } => write!(f, "no strategy named '{name}' is registered"),
            Self::EmptyName => write!(f, "strategy name must not be empty"),
        }
    }
}

impl std::error::Error for RegistryError {}

struct RegistryEntry {
    meta: StrategyMeta,
    factory: StrategyFactory,
}

/// Insertion-ordered catalogue of strategy factories. Each `instantiate`
/// call produces a fresh strategy instance — strategies are treated as
/// pure per-bar functions, never as objects with state to preserve.
pub struct PluginRegistry {
    entries: Vec<RegistryEntry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// A registry pre-populated with every catalog strategy, named exactly
    /// as the arbitrator's priority order expects.
    pub fn with_catalog() -> Self {
        let mut reg = Self::new();
        for strategy in crate::catalog::all_strategies() {
            let name: &'static str = strategy.name();
            reg.register(StrategyMeta::new(name, ""), move || {
                crate::catalog::all_strategies()
                    .into_iter()
                    .find(|s| s.name() == name)
                    .expect("catalog strategy vanished between registration and instantiation")
            })
            .expect("catalog strategy names must be unique");
        }
        reg
    }

    pub fn register<F>(&mut self, meta: StrategyMeta, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn Strategy> + Send + Sync + 'static,
    {
        if meta.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.contains(&meta.name) {
            return Err(RegistryError::DuplicateName { name: meta.name.clone() });
        }
        self.entries.push(RegistryEntry {
            meta,
            factory: Box::new(factory),
        });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.meta.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn list(&self) -> Vec<&StrategyMeta> {
        self.entries.iter().map(|e| &e.meta).collect()
    }

    pub fn instantiate(&self, name: &str) -> Result<Box<dyn Strategy>, RegistryError> {
        self.entries
            .iter()
            .find(|e| e.meta.name == name)
            .map(|e| (e.factory)())
            .ok_or_else(|| RegistryError::UnknownStrategy { name: name.to_string() })
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_catalog_has_no_duplicate_names() {
        let reg = PluginRegistry::with_catalog();
        assert_eq!(reg.len(), crate::catalog::all_strategies().len());
    }

    #[test]
    fn unknown_strategy_errors() {
        let reg = PluginRegistry::new();
        match reg.instantiate("nope") {
            Err(e) => assert_eq!(e, RegistryError::UnknownStrategy { name: "nope".into() }),
            Ok(_) => panic!("expected UnknownStrategy error"),
        }
    }
}
