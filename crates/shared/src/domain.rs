use serde::{Deserialize, Serialize};

use crate::parameter::ParamValue;

/// Which facet family a field is requested through. It decides both the
/// request parameter and the section of `facet_counts` holding the counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    Field,
    Date,
    Range,
}

impl FacetKind {
    pub fn request_param(self) -> &'static str {
        match self {
            Self::Field => "facet.field",
            Self::Date => "facet.date",
            Self::Range => "facet.range",
        }
    }

    pub fn response_section(self) -> &'static str {
        match self {
            Self::Field => "facet_fields",
            Self::Date => "facet_dates",
            Self::Range => "facet_ranges",
        }
    }
}

/// How the engine encodes name/value lists in JSON (`json.nl`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullListFormat {
    /// `{"red": 3, "blue": 1}`
    Map,
    /// `[["red", 3], ["blue", 1]]`
    ArrArr,
    /// `["red", 3, "blue", 1]`
    #[default]
    Flat,
}

impl NullListFormat {
    pub const PARAM: &'static str = "json.nl";

    /// Reads the configured `json.nl` value. Anything other than `map` or
    /// `arrarr` means the engine default, the flat list.
    pub fn from_param(value: Option<&ParamValue>) -> Self {
        match value.and_then(ParamValue::as_scalar) {
            Some("map") => Self::Map,
            Some("arrarr") => Self::ArrArr,
            _ => Self::Flat,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::ArrArr => "arrarr",
            Self::Flat => "flat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub facet: String,
    pub count: u64,
}

/// Per-field facet options, written as `f.<field>.<param>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetOption {
    Prefix,
    Sort,
    Limit,
    Offset,
    MinCount,
    Missing,
    Method,
    EnumCacheMinDf,
    Start,
    End,
    Gap,
    HardEnd,
    Other,
    Include,
}

impl FacetOption {
    /// The parameter name for this option, or `None` when the option does not
    /// exist for `kind` (the bounds options only apply to date and range facets).
    pub fn param_name(self, kind: Option<FacetKind>) -> Option<String> {
        let common = match self {
            Self::Prefix => Some("facet.prefix"),
            Self::Sort => Some("facet.sort"),
            Self::Limit => Some("facet.limit"),
            Self::Offset => Some("facet.offset"),
            Self::MinCount => Some("facet.mincount"),
            Self::Missing => Some("facet.missing"),
            Self::Method => Some("facet.method"),
            Self::EnumCacheMinDf => Some("facet.enum.cache.minDf"),
            _ => None,
        };
        if let Some(name) = common {
            return Some(name.to_string());
        }

        let suffix = match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Gap => "gap",
            Self::HardEnd => "hardend",
            Self::Other => "other",
            Self::Include => "include",
            _ => return None,
        };
        match kind {
            Some(kind @ (FacetKind::Date | FacetKind::Range)) => {
                Some(format!("{}.{suffix}", kind.request_param()))
            }
            _ => None,
        }
    }
}
