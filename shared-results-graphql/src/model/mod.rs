use crate::{
    data::{Data, Pk},
    interceptor::SharedResultsExtension,
    model::{
        family::{ChildInput, GqlChild, GqlParent, ParentInput},
        mutations::{
            field_error, resolve_edge, resolve_node, AddSibling, AddSiblingArgs, MutationStatus,
            SetParent, SetParentArgs, UpsertChild, UpsertParent,
        },
        result_ref::GqlResultRef,
    },
};
use async_graphql::{
    dynamic::{Schema, SchemaError},
    Context,
};
use dynamic_graphql::{
    App, Mutation, MutationFields, MutationRoot, ResolvedObject, ResolvedObjectFields, Result,
};
use itertools::Itertools;

pub(crate) mod family;
pub(crate) mod mutations;
pub(crate) mod result_ref;

#[derive(ResolvedObject)]
#[graphql(root)]
pub(crate) struct QueryRoot;

#[ResolvedObjectFields]
impl QueryRoot {
    async fn parent<'a>(ctx: &Context<'a>, pk: Pk) -> Option<GqlParent> {
        let data = ctx.data_unchecked::<Data>();
        data.parent(pk).map(|parent| parent.into())
    }

    async fn parents<'a>(ctx: &Context<'a>) -> Vec<GqlParent> {
        let data = ctx.data_unchecked::<Data>();
        data.parents().into_iter().map(|parent| parent.into()).collect_vec()
    }

    async fn child<'a>(ctx: &Context<'a>, pk: Pk) -> Option<GqlChild> {
        let data = ctx.data_unchecked::<Data>();
        data.child(pk).map(|child| child.into())
    }

    async fn children<'a>(ctx: &Context<'a>) -> Vec<GqlChild> {
        let data = ctx.data_unchecked::<Data>();
        data.children().into_iter().map(|child| child.into()).collect_vec()
    }
}

#[derive(MutationRoot)]
pub(crate) struct MutRoot;

#[derive(Mutation)]
pub(crate) struct Mut(MutRoot);

// Top-level mutations run one after the other in document order. Their outputs are nullable so
// that a failing mutation does not null out the results of its siblings. The result of every node
// mutation (upsertParent, upsertChild) is shared under the field's alias, edge mutations
// (setParent, addSibling) refer to those results by alias.
#[MutationFields]
impl Mut {
    /// Create a parent, or update it if `pk` names an existing one
    async fn upsert_parent<'a>(
        ctx: &Context<'a>,
        data: ParentInput,
    ) -> Result<Option<GqlParent>> {
        let store = ctx.data_unchecked::<Data>();
        resolve_node(ctx, &UpsertParent::new(store), data.into())
            .map(|parent| Some(parent.into()))
            .map_err(|e| field_error(ctx, e))
    }

    /// Create a child, or update it if `pk` names an existing one
    async fn upsert_child<'a>(
        ctx: &Context<'a>,
        data: ChildInput,
    ) -> Result<Option<GqlChild>> {
        let store = ctx.data_unchecked::<Data>();
        resolve_node(ctx, &UpsertChild::new(store), data.into())
            .map(|child| Some(child.into()))
            .map_err(|e| field_error(ctx, e))
    }

    /// Make the parent produced as `parent` the parent of the child produced as `child`
    async fn set_parent<'a>(
        ctx: &Context<'a>,
        parent: GqlResultRef,
        child: GqlResultRef,
    ) -> Result<Option<MutationStatus>> {
        let store = ctx.data_unchecked::<Data>();
        let args = SetParentArgs {
            parent: parent.into(),
            child: child.into(),
        };
        resolve_edge(ctx, &SetParent::new(store), args)
            .map(Some)
            .map_err(|e| field_error(ctx, e))
    }

    /// Make the children produced as `node1` and `node2` siblings of each other
    async fn add_sibling<'a>(
        ctx: &Context<'a>,
        node1: GqlResultRef,
        node2: GqlResultRef,
    ) -> Result<Option<MutationStatus>> {
        let store = ctx.data_unchecked::<Data>();
        let args = AddSiblingArgs {
            node1: node1.into(),
            node2: node2.into(),
        };
        resolve_edge(ctx, &AddSibling::new(store), args)
            .map(Some)
            .map_err(|e| field_error(ctx, e))
    }
}

#[derive(App)]
pub struct App(QueryRoot, MutRoot, Mut);

/// The schema served for `data`, with shared results enabled
pub fn create_schema(data: Data) -> std::result::Result<Schema, SchemaError> {
    App::create_schema()
        .data(data)
        .extension(SharedResultsExtension)
        .finish()
}
