//! Node and edge capabilities for mutations that share results within one request.
//!
//! A node mutation only supplies [`NodeMutation::produce_result`]; [`execute_node`] takes care
//! of publishing the result under the field's alias when the field is a top-level mutation.
//! An edge mutation implements [`EdgeMutation::execute`] and reads earlier results through the
//! context itself, it never publishes anything.
//!
//! Edges can only see nodes that were resolved before them, so the engine must resolve
//! top-level mutation fields one after the other in document order. async-graphql does this for
//! the mutation root. Under an engine resolving those fields concurrently an edge can race the
//! nodes it depends on.

use crate::{error::SharedResultError, registry::SharedResults};
use tracing::debug;

/// Everything a shared-result mutation gets to know about the field it resolves
pub struct ResolutionContext<'a, P = ()> {
    parent: Option<&'a P>,
    alias: &'a str,
    shared_results: &'a SharedResults,
}

impl<'a> ResolutionContext<'a, ()> {
    /// A field of the mutation root
    pub fn top_level(alias: &'a str, shared_results: &'a SharedResults) -> Self {
        Self {
            parent: None,
            alias,
            shared_results,
        }
    }
}

impl<'a, P> ResolutionContext<'a, P> {
    /// A field resolved on the result of another field
    pub fn nested(parent: &'a P, alias: &'a str, shared_results: &'a SharedResults) -> Self {
        Self {
            parent: Some(parent),
            alias,
            shared_results,
        }
    }

    pub fn parent(&self) -> Option<&'a P> {
        self.parent
    }

    /// The response key of the field, i.e. its alias if the client gave one
    pub fn alias(&self) -> &'a str {
        self.alias
    }

    pub fn shared_results(&self) -> &'a SharedResults {
        self.shared_results
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}

/// A mutation creating or updating a single entity.
///
/// Implement it once per parent type the mutation can be resolved under; `()` is the mutation
/// root, where `parent` is always `None`.
pub trait NodeMutation<P = ()> {
    type Args;
    type Output: Clone + Send + Sync + 'static;
    type Error;

    fn produce_result(
        &self,
        parent: Option<&P>,
        args: Self::Args,
    ) -> Result<Self::Output, Self::Error>;
}

/// A mutation relating entities produced earlier in the same request
pub trait EdgeMutation {
    type Args;
    type Output;
    type Error: From<SharedResultError>;

    fn execute(
        &self,
        ctx: &ResolutionContext<'_>,
        args: Self::Args,
    ) -> Result<Self::Output, Self::Error>;
}

/// Run a node mutation and publish its result if it was invoked as a top-level field.
///
/// Errors from the mutation are returned unchanged and leave the registry untouched.
pub fn execute_node<P, M: NodeMutation<P>>(
    mutation: &M,
    ctx: &ResolutionContext<'_, P>,
    args: M::Args,
) -> Result<M::Output, M::Error> {
    let result = mutation.produce_result(ctx.parent(), args)?;
    if ctx.is_top_level() {
        ctx.shared_results().put(ctx.alias(), result.clone());
    } else {
        debug!(alias = ctx.alias(), "nested node mutation, result not shared");
    }
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::{execute_node, EdgeMutation, NodeMutation, ResolutionContext};
    use crate::{error::SharedResultError, logging::global_debug_logger, registry::SharedResults};
    use std::{cell::RefCell, collections::HashMap};

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        key: u64,
        name: String,
    }

    #[derive(Default)]
    struct Store {
        next_key: RefCell<u64>,
        links: RefCell<HashMap<u64, Vec<u64>>>,
    }

    struct CreateItem<'a>(&'a Store);

    impl NodeMutation for CreateItem<'_> {
        type Args = String;
        type Output = Item;
        type Error = String;

        fn produce_result(&self, _parent: Option<&()>, name: String) -> Result<Item, String> {
            if name.is_empty() {
                return Err("name is required".to_string());
            }
            let mut key = self.0.next_key.borrow_mut();
            *key += 1;
            Ok(Item { key: *key, name })
        }
    }

    impl NodeMutation<Item> for CreateItem<'_> {
        type Args = String;
        type Output = Item;
        type Error = String;

        fn produce_result(&self, parent: Option<&Item>, name: String) -> Result<Item, String> {
            let item = <Self as NodeMutation>::produce_result(self, None, name)?;
            if let Some(parent) = parent {
                self.0
                    .links
                    .borrow_mut()
                    .entry(parent.key)
                    .or_default()
                    .push(item.key);
            }
            Ok(item)
        }
    }

    struct Link<'a>(&'a Store);

    #[derive(Debug, PartialEq)]
    enum LinkError {
        Shared(SharedResultError),
    }

    impl From<SharedResultError> for LinkError {
        fn from(value: SharedResultError) -> Self {
            LinkError::Shared(value)
        }
    }

    impl EdgeMutation for Link<'_> {
        type Args = (String, String);
        type Output = bool;
        type Error = LinkError;

        fn execute(
            &self,
            ctx: &ResolutionContext<'_>,
            (from, to): (String, String),
        ) -> Result<bool, LinkError> {
            let items = ctx.shared_results().resolve_all::<Item>(&[from.as_str(), to.as_str()])?;
            let mut links = self.0.links.borrow_mut();
            links.entry(items[0].key).or_default().push(items[1].key);
            links.entry(items[1].key).or_default().push(items[0].key);
            Ok(true)
        }
    }

    #[test]
    fn top_level_node_results_are_shared_under_alias() {
        let store = Store::default();
        let registry = SharedResults::new();
        let ctx = ResolutionContext::top_level("n1", &registry);
        let item = execute_node(&CreateItem(&store), &ctx, "a".to_string()).unwrap();
        assert_eq!(*registry.lookup::<Item>("n1").unwrap(), item);
    }

    #[test]
    fn nested_node_results_are_not_shared() {
        let store = Store::default();
        let registry = SharedResults::new();
        let parent = Item {
            key: 42,
            name: "parent".to_string(),
        };
        let ctx = ResolutionContext::nested(&parent, "child", &registry);
        let item = execute_node(&CreateItem(&store), &ctx, "a".to_string()).unwrap();
        assert!(registry.is_empty());
        assert_eq!(store.links.borrow()[&42], vec![item.key]);
    }

    #[test]
    fn failed_node_mutation_registers_nothing() {
        let store = Store::default();
        let registry = SharedResults::new();
        let ctx = ResolutionContext::top_level("n1", &registry);
        let err = execute_node(&CreateItem(&store), &ctx, String::new()).unwrap_err();
        assert_eq!(err, "name is required");
        assert!(!registry.contains("n1"));
    }

    #[test]
    fn duplicate_alias_keeps_last_result() {
        global_debug_logger();
        let store = Store::default();
        let registry = SharedResults::new();
        let ctx = ResolutionContext::top_level("n1", &registry);
        execute_node(&CreateItem(&store), &ctx, "first".to_string()).unwrap();
        let last = execute_node(&CreateItem(&store), &ctx, "second".to_string()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(*registry.lookup::<Item>("n1").unwrap(), last);
    }

    #[test]
    fn edge_links_shared_results() {
        let store = Store::default();
        let registry = SharedResults::new();
        for alias in ["n1", "n2"] {
            let ctx = ResolutionContext::top_level(alias, &registry);
            execute_node(&CreateItem(&store), &ctx, alias.to_string()).unwrap();
        }
        let ctx = ResolutionContext::top_level("e1", &registry);
        let ok = Link(&store)
            .execute(&ctx, ("n1".to_string(), "n2".to_string()))
            .unwrap();
        assert!(ok);
        assert_eq!(store.links.borrow()[&1], vec![2]);
        assert_eq!(store.links.borrow()[&2], vec![1]);
        assert!(!registry.contains("e1"));
    }

    #[test]
    fn edge_with_unknown_alias_fails_without_side_effects() {
        let store = Store::default();
        let registry = SharedResults::new();
        let ctx = ResolutionContext::top_level("n2", &registry);
        execute_node(&CreateItem(&store), &ctx, "b".to_string()).unwrap();

        let ctx = ResolutionContext::top_level("e1", &registry);
        let err = Link(&store)
            .execute(&ctx, ("doesNotExist".to_string(), "n2".to_string()))
            .unwrap_err();
        assert_eq!(
            err,
            LinkError::Shared(SharedResultError::missing("doesNotExist"))
        );
        assert!(store.links.borrow().is_empty());
    }
}
