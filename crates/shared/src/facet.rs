use regex::Regex;
use serde_json::{Map, Value};

use crate::{
    domain::{FacetCount, FacetKind, FacetOption, NullListFormat},
    error::FacetError,
    parameter::{compile_regex, escape_value, ParamValue},
    protocol::SearchResponse,
    store::ParameterStore,
};

const FILTER_QUERY: &str = "fq";

/// Facet counts for one field, in whichever layout the engine used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FacetCounts<'a> {
    Map(&'a Map<String, Value>),
    ArrArr(&'a [Value]),
    Flat(&'a [Value]),
}

impl<'a> FacetCounts<'a> {
    pub fn decode(
        format: NullListFormat,
        field: &str,
        raw: &'a Value,
    ) -> Result<Self, FacetError> {
        let mismatch = || FacetError::ShapeMismatch {
            field: field.to_string(),
            expected: format.as_str(),
        };
        match (format, raw) {
            (NullListFormat::Map, Value::Object(map)) => Ok(Self::Map(map)),
            (NullListFormat::ArrArr, Value::Array(items)) => Ok(Self::ArrArr(items)),
            (NullListFormat::Flat, Value::Array(items)) if items.len() % 2 == 0 => {
                Ok(Self::Flat(items))
            }
            _ => Err(mismatch()),
        }
    }

    pub fn into_counts(self, field: &str) -> Result<Vec<FacetCount>, FacetError> {
        match self {
            Self::Map(map) => map
                .iter()
                .map(|(facet, count)| facet_count(field, facet.clone(), count))
                .collect(),
            Self::ArrArr(items) => items
                .iter()
                .map(|item| match item.as_array().map(Vec::as_slice) {
                    Some([facet, count]) => facet_count(field, facet_name(field, facet)?, count),
                    _ => Err(FacetError::ShapeMismatch {
                        field: field.to_string(),
                        expected: NullListFormat::ArrArr.as_str(),
                    }),
                })
                .collect(),
            Self::Flat(items) => items
                .chunks_exact(2)
                .map(|pair| facet_count(field, facet_name(field, &pair[0])?, &pair[1]))
                .collect(),
        }
    }
}

// `facet.missing` reports the documents without a value under a null name.
fn facet_name(field: &str, raw: &Value) -> Result<String, FacetError> {
    match raw {
        Value::String(name) => Ok(name.clone()),
        Value::Null => Ok(String::new()),
        Value::Number(number) => Ok(number.to_string()),
        _ => Err(FacetError::ShapeMismatch {
            field: field.to_string(),
            expected: "string facet names",
        }),
    }
}

fn facet_count(field: &str, facet: String, raw: &Value) -> Result<FacetCount, FacetError> {
    let count = match raw {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    match count {
        Some(count) => Ok(FacetCount { facet, count }),
        None => Err(FacetError::InvalidCount {
            field: field.to_string(),
            facet,
        }),
    }
}

/// Filter-query bookkeeping for a single facet field.
///
/// The selection itself lives in the store as `fq` entries of the form
/// `field:value` (or `-field:value` for exclusions); this type only knows how
/// to find and edit them.
#[derive(Debug, Clone)]
pub struct FacetSelection {
    field: String,
    kind: Option<FacetKind>,
    options: Vec<(FacetOption, ParamValue)>,
    multivalue: bool,
    field_pattern: Regex,
}

impl FacetSelection {
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        let field_pattern = compile_regex(&format!("^-?{}:", regex::escape(&field)));
        Self {
            field,
            kind: None,
            options: Vec::new(),
            multivalue: false,
            field_pattern,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: FacetKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_option(mut self, option: FacetOption, value: impl Into<ParamValue>) -> Self {
        let value = value.into();
        match self.options.iter_mut().find(|(existing, _)| *existing == option) {
            Some(slot) => slot.1 = value,
            None => self.options.push((option, value)),
        }
        self
    }

    #[must_use]
    pub fn with_multivalue(mut self, multivalue: bool) -> Self {
        self.multivalue = multivalue;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn kind(&self) -> Option<FacetKind> {
        self.kind
    }

    pub fn is_multivalue(&self) -> bool {
        self.multivalue
    }

    /// Writes the request parameters that make the engine return counts for
    /// this field.
    pub fn init_store(&self, store: &mut ParameterStore) {
        store.add_by_value("facet", true, None);
        if let Some(kind) = self.kind {
            store.add_by_value(kind.request_param(), self.field.as_str(), None);
        }
        for (option, value) in &self.options {
            if let Some(param) = option.param_name(self.kind) {
                store.add_by_value(&format!("f.{}.{param}", self.field), value.clone(), None);
            }
        }
    }

    /// Whether no filter query currently targets this field.
    pub fn is_empty(&self, store: &ParameterStore) -> bool {
        store
            .find(FILTER_QUERY, self.field_pattern.clone())
            .is_none()
    }

    /// Replaces every filter on this field with `value`. Returns `false` when
    /// `value` already is the only filter on the field.
    pub fn set(&self, store: &mut ParameterStore, value: &str) -> bool {
        let fq = self.fq(value, false);
        if let [only] = self.field_filters(store).as_slice() {
            if only.as_scalar() == Some(fq.as_str()) {
                return false;
            }
        }
        store.remove_by_value(FILTER_QUERY, self.field_pattern.clone());
        store.add_by_value(FILTER_QUERY, fq, None);
        true
    }

    fn field_filters(&self, store: &ParameterStore) -> Vec<ParamValue> {
        store
            .values(FILTER_QUERY)
            .into_iter()
            .filter(|value| self.field_pattern.is_match(&value.joined()))
            .collect()
    }

    pub fn add(&self, store: &mut ParameterStore, value: &str) -> bool {
        store.add_by_value(FILTER_QUERY, self.fq(value, false), None) > 0
    }

    pub fn remove(&self, store: &mut ParameterStore, value: &str) -> bool {
        store
            .remove_by_value(FILTER_QUERY, self.fq(value, false))
            .is_some()
    }

    /// Drops every filter on this field, exclusions included.
    pub fn clear(&self, store: &mut ParameterStore) -> bool {
        store
            .remove_by_value(FILTER_QUERY, self.field_pattern.clone())
            .is_some()
    }

    /// What a click on a facet value does: add for multi-select facets,
    /// replace otherwise.
    pub fn select(&self, store: &mut ParameterStore, value: &str) -> bool {
        if self.multivalue {
            self.add(store, value)
        } else {
            self.set(store, value)
        }
    }

    pub fn is_selected(&self, store: &ParameterStore, value: &str) -> bool {
        store.find(FILTER_QUERY, self.fq(value, false)).is_some()
    }

    /// The filter query selecting (or with `exclude`, excluding) `value`.
    pub fn fq(&self, value: &str, exclude: bool) -> String {
        let sign = if exclude { "-" } else { "" };
        format!("{sign}{}:{}", self.field, escape_value(value))
    }

    /// The counts the response carries for this field, in payload order.
    pub fn facet_counts(
        &self,
        store: &ParameterStore,
        response: &SearchResponse,
    ) -> Result<Vec<FacetCount>, FacetError> {
        let kind = self.kind.ok_or_else(|| FacetError::NoFacetKind {
            field: self.field.clone(),
        })?;
        let Some(mut raw) = response.facet_entry(kind, &self.field) else {
            return Ok(Vec::new());
        };
        // Range facets nest their counts next to start/end/gap.
        if kind == FacetKind::Range {
            if let Some(counts) = raw.get("counts") {
                raw = counts;
            }
        }

        let format = NullListFormat::from_param(store.first_value(NullListFormat::PARAM));
        FacetCounts::decode(format, &self.field, raw)?.into_counts(&self.field)
    }
}

#[cfg(test)]
#[path = "tests/facet_tests.rs"]
mod tests;
