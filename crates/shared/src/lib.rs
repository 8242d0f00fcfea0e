//! Query-state model for a faceted search front end.
//!
//! Everything in this crate is synchronous and free of I/O: a [`store::ParameterStore`]
//! of [`parameter::Parameter`]s that round-trips through the query-string wire format,
//! the per-field [`facet::FacetSelection`] controller that edits filter queries, and
//! the [`pagination`] window used by pagers.

pub mod domain;
pub mod error;
pub mod facet;
pub mod pagination;
pub mod parameter;
pub mod protocol;
pub mod store;
pub mod text;

pub use domain::{FacetCount, FacetKind, FacetOption, NullListFormat};
pub use error::FacetError;
pub use facet::{FacetCounts, FacetSelection};
pub use pagination::{windowed_pages, PageItem, PagerState};
pub use parameter::{escape_value, LocalParams, ParamValue, Parameter};
pub use protocol::{SearchResponse, ServerError};
pub use store::{is_multiple, Found, ParamSlot, ParameterStore, ValueMatcher};
pub use text::TextSelection;
