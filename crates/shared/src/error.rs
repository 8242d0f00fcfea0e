use thiserror::Error;

/// Failures while reading facet counts out of a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacetError {
    #[error("facet field `{field}` has no facet kind; set one of field, date or range")]
    NoFacetKind { field: String },
    #[error("facet counts for `{field}` are not in the `{expected}` layout")]
    ShapeMismatch {
        field: String,
        expected: &'static str,
    },
    #[error("facet `{facet}` of `{field}` has a count that is not a non-negative integer")]
    InvalidCount { field: String, facet: String },
}
