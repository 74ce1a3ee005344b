//! Parsing of `/queryType/storeName/subpath` query paths.

use std::fmt;

use crate::error::QueryError;

/// A parsed query path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryPath<'a> {
    /// First segment, e.g. `store` or `custom`
    pub query_type: &'a str,
    /// Second segment, the substore the query targets
    pub store_name: &'a str,
    /// Everything after the store name, may contain further `/`
    pub subpath: &'a str,
}

impl<'a> QueryPath<'a> {
    /// Splits `path` into its three segments.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidPath`] if the leading `/` is missing, fewer than three
    /// segments are present, or any segment is empty.
    pub fn parse(path: &'a str) -> Result<Self, QueryError> {
        let invalid = || QueryError::InvalidPath(path.to_string());

        let rest = path.strip_prefix('/').ok_or_else(invalid)?;
        let mut segments = rest.splitn(3, '/');
        let (Some(query_type), Some(store_name), Some(subpath)) =
            (segments.next(), segments.next(), segments.next())
        else {
            return Err(invalid());
        };

        if query_type.is_empty() || store_name.is_empty() || subpath.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            query_type,
            store_name,
            subpath,
        })
    }

    /// Builds the `/store/<store_name>/<subpath>` path of a raw store query.
    #[must_use]
    pub fn store(store_name: &str, subpath: &str) -> String {
        format!("/store/{store_name}/{subpath}")
    }
}

impl fmt::Display for QueryPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}", self.query_type, self.store_name, self.subpath)
    }
}
