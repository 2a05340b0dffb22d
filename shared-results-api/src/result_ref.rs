use crate::error::SharedResultError;
use std::{
    fmt::{Display, Formatter},
    ops::Deref,
    str::FromStr,
};

/// The alias of an earlier top-level mutation, as passed to an edge mutation.
///
/// GraphQL cannot type "the result of another field in this request", so edges take these
/// identifiers instead of typed references. Only the syntax is checked here, whether an
/// entity exists under the alias is decided by the registry at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultRef(String);

impl ResultRef {
    pub fn parse(alias: impl Into<String>) -> Result<Self, SharedResultError> {
        let alias = alias.into();
        if is_graphql_name(&alias) {
            Ok(Self(alias))
        } else {
            Err(SharedResultError::InvalidResultRef(alias))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Same grammar as a GraphQL alias: /[_A-Za-z][_0-9A-Za-z]*/
fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

impl FromStr for ResultRef {
    type Err = SharedResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Deref for ResultRef {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ResultRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
