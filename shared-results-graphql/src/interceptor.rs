//! Hands every request its own [`SharedResults`].
//!
//! async-graphql asks each [`ExtensionFactory`] for a new [`Extension`] whenever it executes a
//! request, so the registry owned by [`SharedResultsInterceptor`] lives exactly as long as one
//! request. It is attached to the request data in `prepare_request`, which makes it reachable
//! from any resolver as `ctx.data::<SharedResults>()`.

use async_graphql::{
    extensions::{
        Extension, ExtensionContext, ExtensionFactory, NextPrepareRequest, NextResolve,
        ResolveInfo,
    },
    Request, ServerResult, Value,
};
use shared_results_api::SharedResults;
use std::sync::Arc;
use tracing::trace;

/// Schema extension installing the per-request shared results
#[derive(Clone, Copy, Debug, Default)]
pub struct SharedResultsExtension;

impl ExtensionFactory for SharedResultsExtension {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(SharedResultsInterceptor::default())
    }
}

#[derive(Default)]
pub struct SharedResultsInterceptor {
    shared_results: SharedResults,
}

#[async_trait::async_trait]
impl Extension for SharedResultsInterceptor {
    async fn prepare_request(
        &self,
        ctx: &ExtensionContext<'_>,
        request: Request,
        next: NextPrepareRequest<'_>,
    ) -> ServerResult<Request> {
        next.run(ctx, request.data(self.shared_results.clone()))
            .await
    }

    async fn resolve(
        &self,
        ctx: &ExtensionContext<'_>,
        info: ResolveInfo<'_>,
        next: NextResolve<'_>,
    ) -> ServerResult<Option<Value>> {
        if !info.is_for_introspection {
            trace!(path = %info.path_node, parent_type = info.parent_type, "resolving field");
        }
        next.run(ctx, info).await
    }
}
