//! Request-scoped sharing of mutation results.
//!
//! GraphQL gives a mutation field no way to refer to the result of a sibling field. This crate
//! models a mutation request as a sequence of node operations (create or update an entity) and
//! edge operations (relate entities produced earlier), and lets edges reference nodes by the
//! alias the client gave them:
//!
//! ```graphql
//! mutation {
//!   n1: upsertChild(data: {name: "John"}) { pk }
//!   n2: upsertChild(data: {name: "Julie"}) { pk }
//!   addSibling(node1: "n1", node2: "n2") { ok }
//! }
//! ```
//!
//! The engine binding lives in `shared-results-graphql`; nothing here depends on a GraphQL
//! implementation.

pub mod contract;
pub mod error;
pub mod logging;
pub mod registry;
pub mod result_ref;

pub use contract::{execute_node, EdgeMutation, NodeMutation, ResolutionContext};
pub use error::SharedResultError;
pub use registry::{SharedEntity, SharedResults};
pub use result_ref::ResultRef;
