use async_graphql::{Error, Value as GqlValue};
use dynamic_graphql::{Scalar, ScalarValue};
use shared_results_api::ResultRef;

/// The alias of a mutation field resolved earlier in the same request, e.g. `"n1"` for
/// `n1: upsertChild(...)`. Must be a valid GraphQL alias.
#[derive(Scalar, Clone, Debug)]
#[graphql(name = "ResultRef")]
pub struct GqlResultRef(pub ResultRef);

impl ScalarValue for GqlResultRef {
    fn from_value(value: GqlValue) -> Result<Self, Error> {
        match value {
            GqlValue::String(alias) => ResultRef::parse(alias)
                .map(GqlResultRef)
                .map_err(|e| Error::new(e.to_string())),
            _ => Err(Error::new(
                "Expected the alias of an earlier mutation as a String.",
            )),
        }
    }

    fn to_value(&self) -> GqlValue {
        GqlValue::String(self.0.to_string())
    }
}

impl From<GqlResultRef> for ResultRef {
    fn from(value: GqlResultRef) -> Self {
        value.0
    }
}
