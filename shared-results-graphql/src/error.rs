use crate::data::StoreError;
use async_graphql::{Error, ErrorExtensions, Value};
use shared_results_api::SharedResultError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MutationError {
    #[error(transparent)]
    SharedResult(#[from] SharedResultError),
    #[error("Domain operation failed: {0}")]
    DomainOperationFailed(#[from] StoreError),
    #[error("Shared results are not available, install SharedResultsExtension on the schema")]
    SharedResultsUnavailable,
    #[error("'{0}' writes to the store and can only be selected in a mutation")]
    NotInMutation(String),
}

impl MutationError {
    pub fn code(&self) -> &'static str {
        match self {
            MutationError::SharedResult(err) => err.code(),
            MutationError::DomainOperationFailed(_) => "DOMAIN_OPERATION_FAILED",
            MutationError::SharedResultsUnavailable => "SHARED_RESULTS_UNAVAILABLE",
            MutationError::NotInMutation(_) => "NOT_IN_MUTATION",
        }
    }
}

impl ErrorExtensions for MutationError {
    fn extend(&self) -> Error {
        Error::new(self.to_string()).extend_with(|_, extensions| {
            extensions.set("code", self.code());
            if let MutationError::SharedResult(SharedResultError::MissingSharedResult { aliases }) =
                self
            {
                extensions.set(
                    "aliases",
                    Value::List(
                        aliases
                            .iter()
                            .map(|alias| Value::from(alias.as_str()))
                            .collect(),
                    ),
                );
            }
        })
    }
}
