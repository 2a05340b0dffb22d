//! The per-request store through which mutations share their results.
//!
//! A [`SharedResults`] is allocated once for every executed request and dropped with it.
//! Node mutations write their produced entity under the alias the client gave the field,
//! edge mutations read entities back by alias. The registry does not know what it stores:
//! entities are kept as `Arc<dyn Any>` and the typed accessors downcast on the way out.

use crate::error::SharedResultError;
use parking_lot::Mutex;
use std::{
    any::{type_name, Any},
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc,
};
use tracing::{debug, warn};

/// An opaque entity produced by a node mutation
pub type SharedEntity = Arc<dyn Any + Send + Sync>;

/// Handle to one request's registry. Clones point at the same entries.
#[derive(Clone, Default)]
pub struct SharedResults {
    entries: Arc<Mutex<HashMap<String, SharedEntity>>>,
}

impl Debug for SharedResults {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedResults")
            .field("aliases", &self.aliases())
            .finish()
    }
}

impl SharedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `entity` under `alias`, replacing any earlier entry.
    ///
    /// # Returns:
    ///   true if an entry for `alias` already existed
    pub fn put<T: Any + Send + Sync>(&self, alias: impl Into<String>, entity: T) -> bool {
        self.put_shared(alias, Arc::new(entity))
    }

    pub fn put_shared(&self, alias: impl Into<String>, entity: SharedEntity) -> bool {
        let alias = alias.into();
        let replaced = self.entries.lock().insert(alias.clone(), entity).is_some();
        if replaced {
            warn!(
                alias = alias.as_str(),
                "shared result overwritten by a later mutation with the same alias"
            );
        } else {
            debug!(alias = alias.as_str(), "shared result registered");
        }
        replaced
    }

    pub fn get(&self, alias: &str) -> Option<SharedEntity> {
        self.entries.lock().get(alias).cloned()
    }

    /// Typed lookup of a single alias
    pub fn lookup<T: Any + Send + Sync>(&self, alias: &str) -> Result<Arc<T>, SharedResultError> {
        let entity = self
            .get(alias)
            .ok_or_else(|| SharedResultError::missing(alias))?;
        downcast(alias, entity)
    }

    /// Check that every alias in `aliases` has an entry.
    ///
    /// All aliases are checked before failing, so a
    /// [`SharedResultError::MissingSharedResult`] names every absent alias in argument order.
    pub fn require(&self, aliases: &[&str]) -> Result<(), SharedResultError> {
        let missing: Vec<String> = {
            let entries = self.entries.lock();
            aliases
                .iter()
                .filter(|alias| !entries.contains_key(**alias))
                .map(|alias| alias.to_string())
                .collect()
        };
        if missing.is_empty() {
            Ok(())
        } else {
            debug!(?missing, "edge mutation references unknown aliases");
            Err(SharedResultError::MissingSharedResult { aliases: missing })
        }
    }

    /// Typed lookup of several aliases of the same kind, see [`SharedResults::require`]
    pub fn resolve_all<T: Any + Send + Sync>(
        &self,
        aliases: &[&str],
    ) -> Result<Vec<Arc<T>>, SharedResultError> {
        self.require(aliases)?;
        aliases.iter().map(|alias| self.lookup::<T>(alias)).collect()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.lock().contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Registered aliases in sorted order
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<_> = self.entries.lock().keys().cloned().collect();
        aliases.sort();
        aliases
    }
}

fn downcast<T: Any + Send + Sync>(
    alias: &str,
    entity: SharedEntity,
) -> Result<Arc<T>, SharedResultError> {
    entity
        .downcast::<T>()
        .map_err(|_| SharedResultError::SharedResultTypeMismatch {
            alias: alias.to_string(),
            expected: short_type_name::<T>(),
        })
}

fn short_type_name<T>() -> &'static str {
    let name = type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

#[cfg(test)]
mod test {
    use super::SharedResults;
    use crate::error::SharedResultError;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    struct Entity(u64);

    #[test]
    fn get_on_empty_registry_is_absent() {
        let registry = SharedResults::new();
        assert!(registry.get("n1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn clones_share_entries() {
        let registry = SharedResults::new();
        let handle = registry.clone();
        handle.put("n1", Entity(1));
        assert_eq!(*registry.lookup::<Entity>("n1").unwrap(), Entity(1));
    }

    #[test]
    fn fresh_registries_are_isolated() {
        let first = SharedResults::new();
        first.put("n1", Entity(1));
        let second = SharedResults::new();
        assert!(!second.contains("n1"));
    }

    #[test]
    fn lookup_of_wrong_type_is_a_mismatch() {
        let registry = SharedResults::new();
        registry.put("n1", Entity(1));
        let err = registry.lookup::<String>("n1").unwrap_err();
        assert_eq!(
            err,
            SharedResultError::SharedResultTypeMismatch {
                alias: "n1".to_string(),
                expected: "String",
            }
        );
    }

    #[test]
    fn resolve_all_reports_every_missing_alias() {
        let registry = SharedResults::new();
        registry.put("n2", Entity(2));
        let err = registry
            .resolve_all::<Entity>(&["n1", "n2", "n3"])
            .unwrap_err();
        assert_eq!(
            err,
            SharedResultError::MissingSharedResult {
                aliases: vec!["n1".to_string(), "n3".to_string()]
            }
        );
    }

    #[test]
    fn require_accepts_registered_aliases() {
        let registry = SharedResults::new();
        registry.put("n1", Entity(1));
        registry.put("n2", "other kind".to_string());
        assert_eq!(registry.require(&["n1", "n2"]), Ok(()));
        assert_eq!(
            registry.require(&["n2", "n3"]),
            Err(SharedResultError::missing("n3"))
        );
    }

    #[test]
    fn resolve_all_keeps_argument_order() {
        let registry = SharedResults::new();
        registry.put("a", Entity(1));
        registry.put("b", Entity(2));
        let found = registry.resolve_all::<Entity>(&["b", "a"]).unwrap();
        assert_eq!(found, vec![Arc::new(Entity(2)), Arc::new(Entity(1))]);
    }

    proptest! {
        #[test]
        fn last_write_wins(values in prop::collection::vec(any::<u64>(), 1..20)) {
            let registry = SharedResults::new();
            for (i, value) in values.iter().enumerate() {
                let replaced = registry.put("n1", Entity(*value));
                prop_assert_eq!(replaced, i > 0);
            }
            prop_assert_eq!(registry.len(), 1);
            let last = *values.last().unwrap();
            prop_assert_eq!(&*registry.lookup::<Entity>("n1").unwrap(), &Entity(last));
        }
    }
}
