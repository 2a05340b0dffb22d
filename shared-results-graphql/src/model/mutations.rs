use crate::{
    data::{Child, ChildRecord, Data, Parent, ParentRecord},
    error::MutationError,
};
use async_graphql::{parser::types::OperationType, Context, Error, ErrorExtensions};
use dynamic_graphql::SimpleObject;
use shared_results_api::{
    execute_node, EdgeMutation, NodeMutation, ResolutionContext, ResultRef, SharedResults,
};
use tracing::debug;

/// Outcome of an edge mutation
#[derive(SimpleObject, Clone, Debug, PartialEq)]
pub(crate) struct MutationStatus {
    ok: bool,
}

impl MutationStatus {
    pub(crate) fn ok() -> Self {
        Self { ok: true }
    }
}

fn shared_results<'a>(ctx: &Context<'a>) -> Result<&'a SharedResults, MutationError> {
    ctx.data_opt::<SharedResults>()
        .ok_or(MutationError::SharedResultsUnavailable)
}

/// The key under which the field appears in the response, its alias if it has one
fn response_key<'a>(ctx: &Context<'a>) -> &'a str {
    ctx.item.node.response_key().node.as_str()
}

/// `err` as a GraphQL error naming the field that raised it.
///
/// The engine does not attach a `path` to field errors of this schema, so the response key and
/// the path of the field go into the extensions.
pub(crate) fn field_error(ctx: &Context<'_>, err: MutationError) -> Error {
    err.extend().extend_with(|_, extensions| {
        extensions.set("field", response_key(ctx));
        if let Some(path) = ctx.path_node {
            extensions.set("path", path.to_string_vec());
        }
    })
}

pub(crate) fn top_level_context<'a>(
    ctx: &Context<'a>,
) -> Result<ResolutionContext<'a>, MutationError> {
    Ok(ResolutionContext::top_level(
        response_key(ctx),
        shared_results(ctx)?,
    ))
}

pub(crate) fn nested_context<'a, P>(
    ctx: &Context<'a>,
    parent: &'a P,
) -> Result<ResolutionContext<'a, P>, MutationError> {
    if !matches!(ctx.query_env.operation.node.ty, OperationType::Mutation) {
        return Err(MutationError::NotInMutation(response_key(ctx).to_string()));
    }
    Ok(ResolutionContext::nested(
        parent,
        response_key(ctx),
        shared_results(ctx)?,
    ))
}

/// Run a node mutation as a field of the mutation root
pub(crate) fn resolve_node<M>(
    ctx: &Context<'_>,
    mutation: &M,
    args: M::Args,
) -> Result<M::Output, MutationError>
where
    M: NodeMutation<Error = MutationError>,
{
    let ctx = top_level_context(ctx)?;
    execute_node(mutation, &ctx, args)
}

/// Run an edge mutation as a field of the mutation root
pub(crate) fn resolve_edge<M>(
    ctx: &Context<'_>,
    mutation: &M,
    args: M::Args,
) -> Result<M::Output, MutationError>
where
    M: EdgeMutation<Error = MutationError>,
{
    let ctx = top_level_context(ctx)?;
    mutation.execute(&ctx, args)
}

pub(crate) struct UpsertParent<'a> {
    data: &'a Data,
}

impl<'a> UpsertParent<'a> {
    pub(crate) fn new(data: &'a Data) -> Self {
        Self { data }
    }
}

impl NodeMutation for UpsertParent<'_> {
    type Args = ParentRecord;
    type Output = Parent;
    type Error = MutationError;

    fn produce_result(&self, _: Option<&()>, args: ParentRecord) -> Result<Parent, MutationError> {
        Ok(self.data.upsert_parent(args))
    }
}

/// Under a child, the upserted parent becomes that child's parent
impl NodeMutation<Child> for UpsertParent<'_> {
    type Args = ParentRecord;
    type Output = Parent;
    type Error = MutationError;

    fn produce_result(
        &self,
        child: Option<&Child>,
        args: ParentRecord,
    ) -> Result<Parent, MutationError> {
        let parent = self.data.upsert_parent(args);
        if let Some(child) = child {
            self.data.set_parent(child.pk, parent.pk)?;
        }
        Ok(parent)
    }
}

pub(crate) struct UpsertChild<'a> {
    data: &'a Data,
}

impl<'a> UpsertChild<'a> {
    pub(crate) fn new(data: &'a Data) -> Self {
        Self { data }
    }
}

impl NodeMutation for UpsertChild<'_> {
    type Args = ChildRecord;
    type Output = Child;
    type Error = MutationError;

    fn produce_result(&self, _: Option<&()>, args: ChildRecord) -> Result<Child, MutationError> {
        Ok(self.data.upsert_child(args)?)
    }
}

pub(crate) struct SetParentArgs {
    pub(crate) parent: ResultRef,
    pub(crate) child: ResultRef,
}

pub(crate) struct SetParent<'a> {
    data: &'a Data,
}

impl<'a> SetParent<'a> {
    pub(crate) fn new(data: &'a Data) -> Self {
        Self { data }
    }
}

impl EdgeMutation for SetParent<'_> {
    type Args = SetParentArgs;
    type Output = MutationStatus;
    type Error = MutationError;

    fn execute(
        &self,
        ctx: &ResolutionContext<'_>,
        args: SetParentArgs,
    ) -> Result<MutationStatus, MutationError> {
        let shared_results = ctx.shared_results();
        shared_results.require(&[args.parent.as_str(), args.child.as_str()])?;
        let parent = shared_results.lookup::<Parent>(&args.parent)?;
        let child = shared_results.lookup::<Child>(&args.child)?;
        debug!(parent = parent.pk, child = child.pk, "setting parent");
        self.data.set_parent(child.pk, parent.pk)?;
        Ok(MutationStatus::ok())
    }
}

pub(crate) struct AddSiblingArgs {
    pub(crate) node1: ResultRef,
    pub(crate) node2: ResultRef,
}

pub(crate) struct AddSibling<'a> {
    data: &'a Data,
}

impl<'a> AddSibling<'a> {
    pub(crate) fn new(data: &'a Data) -> Self {
        Self { data }
    }
}

impl EdgeMutation for AddSibling<'_> {
    type Args = AddSiblingArgs;
    type Output = MutationStatus;
    type Error = MutationError;

    fn execute(
        &self,
        ctx: &ResolutionContext<'_>,
        args: AddSiblingArgs,
    ) -> Result<MutationStatus, MutationError> {
        let children = ctx
            .shared_results()
            .resolve_all::<Child>(&[args.node1.as_str(), args.node2.as_str()])?;
        let (node1, node2) = (&children[0], &children[1]);
        debug!(node1 = node1.pk, node2 = node2.pk, "adding siblings");
        self.data.add_sibling(node1.pk, node2.pk)?;
        Ok(MutationStatus::ok())
    }
}
