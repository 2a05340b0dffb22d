use crate::{
    data::{Child, ChildRecord, Data, Parent, ParentRecord, Pk},
    error::MutationError,
    model::mutations::{field_error, nested_context, UpsertParent},
};
use async_graphql::Context;
use dynamic_graphql::{InputObject, ResolvedObject, ResolvedObjectFields, Result};
use itertools::Itertools;
use shared_results_api::execute_node;

#[derive(InputObject)]
pub struct ParentInput {
    pk: Option<Pk>,
    name: String,
}

impl From<ParentInput> for ParentRecord {
    fn from(input: ParentInput) -> Self {
        Self {
            pk: input.pk,
            name: input.name,
        }
    }
}

/// Unlike `Child`, references other entities by pk
#[derive(InputObject)]
pub struct ChildInput {
    pk: Option<Pk>,
    name: String,
    parent: Option<Pk>,
    siblings: Option<Vec<Pk>>,
}

impl From<ChildInput> for ChildRecord {
    fn from(input: ChildInput) -> Self {
        Self {
            pk: input.pk,
            name: input.name,
            parent: input.parent,
            siblings: input.siblings,
        }
    }
}

#[derive(ResolvedObject, Clone)]
#[graphql(name = "Parent")]
pub struct GqlParent {
    parent: Parent,
}

impl From<Parent> for GqlParent {
    fn from(parent: Parent) -> Self {
        Self { parent }
    }
}

#[ResolvedObjectFields]
impl GqlParent {
    async fn pk(&self) -> Pk {
        self.parent.pk
    }

    async fn name(&self) -> String {
        self.parent.name.clone()
    }
}

#[derive(ResolvedObject, Clone)]
#[graphql(name = "Child")]
pub struct GqlChild {
    child: Child,
}

impl From<Child> for GqlChild {
    fn from(child: Child) -> Self {
        Self { child }
    }
}

#[ResolvedObjectFields]
impl GqlChild {
    async fn pk(&self) -> Pk {
        self.child.pk
    }

    async fn name(&self) -> String {
        self.child.name.clone()
    }

    async fn parent<'a>(&self, ctx: &Context<'a>) -> Option<GqlParent> {
        let data = ctx.data_unchecked::<Data>();
        data.parent(self.child.parent?).map(|parent| parent.into())
    }

    async fn siblings<'a>(&self, ctx: &Context<'a>) -> Vec<GqlChild> {
        let data = ctx.data_unchecked::<Data>();
        self.child
            .siblings
            .iter()
            .filter_map(|pk| data.child(*pk))
            .map(|child| child.into())
            .collect_vec()
    }

    /// Create or update a parent and make it the parent of this child.
    ///
    /// The new parent is not shared with the rest of the request, as it does not come from a
    /// top-level mutation. Only available when this child is selected in a mutation.
    async fn create_parent<'a>(
        &self,
        ctx: &Context<'a>,
        data: ParentInput,
    ) -> Result<Option<GqlParent>> {
        let resolve = || -> Result<Parent, MutationError> {
            let store = ctx.data_unchecked::<Data>();
            let nested = nested_context(ctx, &self.child)?;
            execute_node(&UpsertParent::new(store), &nested, data.into())
        };
        resolve()
            .map(|parent| Some(parent.into()))
            .map_err(|e| field_error(ctx, e))
    }
}
