use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::FacetKind;

/// One search engine response, as returned by the `select`-style servlets
/// with `wt=json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "responseHeader", default)]
    pub response_header: ResponseHeader,
    #[serde(default)]
    pub response: ResultSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_counts: Option<FacetCountsPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServerError>,
}

impl SearchResponse {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// The raw counts for `field` within the section for `kind`, if the
    /// response has any.
    pub fn facet_entry(&self, kind: FacetKind, field: &str) -> Option<&Value> {
        let counts = self.facet_counts.as_ref()?;
        let section = match kind {
            FacetKind::Field => &counts.facet_fields,
            FacetKind::Date => &counts.facet_dates,
            FacetKind::Range => &counts.facet_ranges,
        };
        section.get(field)
    }

    /// A numeric parameter echoed back in `responseHeader.params`.
    pub fn header_param(&self, name: &str) -> Option<u64> {
        self.response_header.param_u64(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(rename = "QTime", default, skip_serializing_if = "Option::is_none")]
    pub qtime: Option<i64>,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ResponseHeader {
    /// Echoed parameters arrive as strings, but some proxies rewrite them to
    /// numbers. Both are accepted.
    pub fn param_u64(&self, name: &str) -> Option<u64> {
        match self.params.get(name)? {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(rename = "numFound", default)]
    pub num_found: u64,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub docs: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetCountsPayload {
    #[serde(default)]
    pub facet_queries: Map<String, Value>,
    #[serde(default)]
    pub facet_fields: Map<String, Value>,
    #[serde(default)]
    pub facet_dates: Map<String, Value>,
    #[serde(default)]
    pub facet_ranges: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}
