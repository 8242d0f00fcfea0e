use std::{borrow::Cow, fmt};

use once_cell::sync::Lazy;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Characters left as-is on the wire: the unreserved set of `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Value sent as `q.alt` when `q` carries local params but no query text.
pub const MATCH_ALL: &str = "*:*";

static PAIR_REGEX: Lazy<Regex> = Lazy::new(|| compile_regex(r"(?s)^([^=]+)=(?:\{!([^}]*)\})?(.*)$"));
static LOCAL_REGEX: Lazy<Regex> = Lazy::new(|| compile_regex(r"([^\s=]+)=(\S*)"));
static NEEDS_QUOTES_REGEX: Lazy<Regex> = Lazy::new(|| compile_regex(r"[ :]"));
static RANGE_REGEX: Lazy<Regex> = Lazy::new(|| compile_regex(r"[\[{]\S+ TO \S+[\]}]"));
static WRAPPED_REGEX: Lazy<Regex> = Lazy::new(|| compile_regex(r#"(?s)^["(].*[")]$"#));

pub(crate) fn compile_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid regex literal {pattern}: {err}"))
}

pub(crate) fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

pub(crate) fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// The value of a search parameter: a single scalar or an ordered list that
/// travels comma-joined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
}

impl ParamValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(value) => value.is_empty(),
            Self::List(values) => values.is_empty(),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::List(_) => None,
        }
    }

    /// Comma-joined text form, as it appears (before encoding) on the wire.
    pub fn joined(&self) -> Cow<'_, str> {
        match self {
            Self::Scalar(value) => Cow::Borrowed(value),
            Self::List(values) => Cow::Owned(values.join(",")),
        }
    }

    fn from_wire(decoded: String) -> Self {
        if decoded.contains(',') {
            Self::List(decoded.split(',').map(str::to_string).collect())
        } else {
            Self::Scalar(decoded)
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Scalar(value.clone())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Scalar(value.to_string())
    }
}

macro_rules! numeric_param_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(value.to_string())
                }
            }
        )*
    };
}

numeric_param_value!(i32, i64, u32, u64, usize);

/// Local parameters (`{!key=value ...}`) attached to a parameter value, in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalParams(Vec<(String, String)>);

impl LocalParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.0.iter().position(|(key, _)| key == name)?;
        Some(self.0.remove(index).1)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// `{!k=v%20k2=v2}` or `""` when no local has a value.
    fn prefix(&self) -> String {
        let pairs: Vec<String> = self
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{key}={}", encode_component(value)))
            .collect();
        if pairs.is_empty() {
            String::new()
        } else {
            format!("{{!{}}}", pairs.join("%20"))
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LocalParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut locals = Self::new();
        for (key, value) in iter {
            locals.set(key, value);
        }
        locals
    }
}

/// A single named search parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    value: Option<ParamValue>,
    locals: LocalParams,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            locals: LocalParams::new(),
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            locals: LocalParams::new(),
        }
    }

    #[must_use]
    pub fn with_locals(mut self, locals: LocalParams) -> Self {
        self.locals = locals;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: &str) {
        if self.name != name {
            self.name = name.to_string();
        }
    }

    pub fn val(&self) -> Option<&ParamValue> {
        self.value.as_ref()
    }

    pub fn set_val(&mut self, value: impl Into<ParamValue>) {
        self.value = Some(value.into());
    }

    pub fn clear_val(&mut self) {
        self.value = None;
    }

    pub fn local(&self, name: &str) -> Option<&str> {
        self.locals.get(name)
    }

    pub fn set_local(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.locals.set(name, value);
    }

    pub fn remove_local(&mut self, name: &str) -> Option<String> {
        self.locals.remove(name)
    }

    pub fn locals(&self) -> &LocalParams {
        &self.locals
    }

    /// Renders the parameter as one `name=value` query-string pair, or `""`
    /// when there is nothing to send.
    pub fn serialize(&self) -> String {
        let prefix = self.locals.prefix();
        match &self.value {
            Some(value) if !value.is_empty() => {
                format!("{}={prefix}{}", self.name, encode_component(&value.joined()))
            }
            // An empty q with local params is rejected by dismax; q.alt takes wildcards.
            _ if self.name == "q" && !prefix.is_empty() => {
                format!("q.alt={prefix}{}", encode_component(MATCH_ALL))
            }
            _ => String::new(),
        }
    }

    /// Parses one pair produced by [`Parameter::serialize`].
    pub fn parse(raw: &str) -> Option<Self> {
        let captures = PAIR_REGEX.captures(raw)?;
        let name = captures.get(1)?.as_str();

        let mut locals = LocalParams::new();
        if let Some(block) = captures.get(2) {
            let decoded = decode_component(block.as_str());
            for local in LOCAL_REGEX.captures_iter(&decoded) {
                locals.set(&local[1], decode_component(&local[2]));
            }
        }

        if name == "q.alt" {
            return Some(Self::new("q").with_locals(locals));
        }

        let raw_value = captures.get(3).map_or("", |m| m.as_str());
        Some(Self {
            name: name.to_string(),
            value: Some(ParamValue::from_wire(decode_component(raw_value))),
            locals,
        })
    }

    /// Shorthand for [`escape_value`].
    pub fn escape_value(value: &str) -> Cow<'_, str> {
        escape_value(value)
    }
}

/// Quotes a filter value that contains a space or a colon, unless it already
/// looks like a range (`[a TO b]`, `{a TO b}`) or is already wrapped in
/// quotes or parentheses.
pub fn escape_value(value: &str) -> Cow<'_, str> {
    if NEEDS_QUOTES_REGEX.is_match(value)
        && !RANGE_REGEX.is_match(value)
        && !WRAPPED_REGEX.is_match(value)
    {
        Cow::Owned(format!("\"{value}\""))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
#[path = "tests/parameter_tests.rs"]
mod tests;
