use regex::Regex;
use tracing::debug;

use crate::parameter::{LocalParams, ParamValue, Parameter};

/// Names that may legitimately appear more than once in one request.
const MULTIPLE_NAMES: &[&str] = &[
    "bf",
    "bq",
    "facet.date",
    "facet.date.other",
    "facet.date.include",
    "facet.field",
    "facet.pivot",
    "facet.range",
    "facet.range.other",
    "facet.range.include",
    "facet.query",
    "fq",
    "group.field",
    "group.func",
    "group.query",
    "pf",
    "qf",
];

/// Whether `name` is a repeatable parameter (filters, facet fields, boosts, grouping).
pub fn is_multiple(name: &str) -> bool {
    MULTIPLE_NAMES.contains(&name)
}

/// What a store keeps under one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSlot {
    Single(Parameter),
    Multiple(Vec<Parameter>),
}

impl ParamSlot {
    fn for_name(name: &str) -> Self {
        if is_multiple(name) {
            Self::Multiple(vec![Parameter::new(name)])
        } else {
            Self::Single(Parameter::new(name))
        }
    }

    pub fn params(&self) -> &[Parameter] {
        match self {
            Self::Single(param) => std::slice::from_ref(param),
            Self::Multiple(params) => params,
        }
    }

    pub fn first(&self) -> Option<&Parameter> {
        self.params().first()
    }

    pub fn first_mut(&mut self) -> &mut Parameter {
        match self {
            Self::Single(param) => param,
            Self::Multiple(params) => {
                if params.is_empty() {
                    params.push(Parameter::default());
                }
                &mut params[0]
            }
        }
    }

    fn serialized(&self) -> impl Iterator<Item = String> + '_ {
        self.params()
            .iter()
            .map(Parameter::serialize)
            .filter(|pair| !pair.is_empty())
    }
}

/// How a stored value is compared in [`ParameterStore::find`] and
/// [`ParameterStore::remove_by_value`].
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    Exact(ParamValue),
    Pattern(Regex),
}

impl ValueMatcher {
    pub fn matches(&self, value: Option<&ParamValue>) -> bool {
        match (self, value) {
            (_, None) => false,
            (Self::Exact(expected), Some(actual)) => expected == actual,
            (Self::Pattern(regex), Some(ParamValue::Scalar(actual))) => regex.is_match(actual),
            (Self::Pattern(_), Some(ParamValue::List(_))) => false,
        }
    }
}

impl From<ParamValue> for ValueMatcher {
    fn from(value: ParamValue) -> Self {
        Self::Exact(value)
    }
}

impl From<&str> for ValueMatcher {
    fn from(value: &str) -> Self {
        Self::Exact(value.into())
    }
}

impl From<String> for ValueMatcher {
    fn from(value: String) -> Self {
        Self::Exact(value.into())
    }
}

impl From<Regex> for ValueMatcher {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

/// Result of a successful [`ParameterStore::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    /// The single-valued parameter matched.
    Single,
    /// Matching entries of a multi-valued parameter, ascending.
    Indices(Vec<usize>),
}

/// The search parameters of one session, in the order they were first stored.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    params: Vec<(String, ParamSlot)>,
    exposed: Vec<String>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exposed<I, S>(exposed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: Vec::new(),
            exposed: exposed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_multiple(name: &str) -> bool {
        is_multiple(name)
    }

    pub fn exposed(&self) -> &[String] {
        &self.exposed
    }

    pub fn set_exposed<I, S>(&mut self, exposed: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exposed = exposed.into_iter().map(Into::into).collect();
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|(key, _)| key == name)
    }

    /// Returns the slot for `name`, creating an empty parameter if there is none.
    pub fn get(&mut self, name: &str) -> &mut ParamSlot {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.params.push((name.to_string(), ParamSlot::for_name(name)));
                self.params.len() - 1
            }
        };
        &mut self.params[index].1
    }

    /// The (first) parameter under `name`, created on demand.
    pub fn param(&mut self, name: &str) -> &mut Parameter {
        self.get(name).first_mut()
    }

    /// Read-only lookup that does not materialize anything.
    pub fn peek(&self, name: &str) -> Option<&ParamSlot> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, slot)| slot)
    }

    pub fn first_value(&self, name: &str) -> Option<&ParamValue> {
        self.peek(name)?.first()?.val()
    }

    /// Every set value under `name`, in order.
    pub fn values(&self, name: &str) -> Vec<ParamValue> {
        self.peek(name)
            .map(|slot| slot.params().iter().filter_map(|p| p.val().cloned()).collect())
            .unwrap_or_default()
    }

    /// Stores `param` under `name`.
    ///
    /// Multi-valued names append unless an entry with an equal value exists,
    /// in which case nothing changes and `None` is returned. Single-valued
    /// names are replaced unconditionally.
    pub fn add(&mut self, name: &str, param: Option<Parameter>) -> Option<&Parameter> {
        let mut param = param.unwrap_or_else(|| Parameter::new(name));
        param.rename(name);

        if !is_multiple(name) {
            let slot = ParamSlot::Single(param);
            let index = match self.position(name) {
                Some(index) => {
                    self.params[index].1 = slot;
                    index
                }
                None => {
                    self.params.push((name.to_string(), slot));
                    self.params.len() - 1
                }
            };
            return self.params[index].1.first();
        }

        let Some(index) = self.position(name) else {
            self.params
                .push((name.to_string(), ParamSlot::Multiple(vec![param])));
            return self.params.last().and_then(|(_, slot)| slot.first());
        };

        let slot = &mut self.params[index].1;
        if let ParamSlot::Multiple(params) = &mut *slot {
            if params.iter().any(|existing| existing.val() == param.val()) {
                return None;
            }
            params.push(param);
        } else {
            *slot = ParamSlot::Multiple(vec![param]);
        }
        slot.params().last()
    }

    /// Removes the entry at `index` of a multi-valued parameter (dropping the
    /// name once it has no entries left), or the whole parameter when `index`
    /// is `None`.
    pub fn remove(&mut self, name: &str, index: Option<usize>) -> bool {
        let Some(position) = self.position(name) else {
            return false;
        };
        let Some(index) = index else {
            self.params.remove(position);
            return true;
        };
        let ParamSlot::Multiple(params) = &mut self.params[position].1 else {
            return false;
        };
        if index >= params.len() {
            return false;
        }
        params.remove(index);
        if params.is_empty() {
            self.params.remove(position);
        }
        true
    }

    pub fn find(&self, name: &str, matcher: impl Into<ValueMatcher>) -> Option<Found> {
        let matcher = matcher.into();
        match self.peek(name)? {
            ParamSlot::Multiple(params) => {
                let indices: Vec<usize> = params
                    .iter()
                    .enumerate()
                    .filter(|(_, param)| matcher.matches(param.val()))
                    .map(|(index, _)| index)
                    .collect();
                (!indices.is_empty()).then_some(Found::Indices(indices))
            }
            ParamSlot::Single(param) => matcher.matches(param.val()).then_some(Found::Single),
        }
    }

    /// Builds parameters from a raw value and stores them. A list value for a
    /// multi-valued name becomes one parameter per element. Returns how many
    /// parameters were stored.
    pub fn add_by_value(
        &mut self,
        name: &str,
        value: impl Into<ParamValue>,
        locals: Option<LocalParams>,
    ) -> usize {
        let locals = locals.unwrap_or_default();
        match value.into() {
            ParamValue::List(values) if is_multiple(name) => values
                .into_iter()
                .filter(|value| {
                    let param =
                        Parameter::with_value(name, value.as_str()).with_locals(locals.clone());
                    self.add(name, Some(param)).is_some()
                })
                .count(),
            value => {
                let param = Parameter::with_value(name, value).with_locals(locals);
                usize::from(self.add(name, Some(param)).is_some())
            }
        }
    }

    /// Removes every parameter under `name` whose value matches.
    pub fn remove_by_value(
        &mut self,
        name: &str,
        matcher: impl Into<ValueMatcher>,
    ) -> Option<Found> {
        let found = self.find(name, matcher)?;
        match &found {
            Found::Single => {
                self.remove(name, None);
            }
            Found::Indices(indices) => {
                for &index in indices.iter().rev() {
                    self.remove(name, Some(index));
                }
            }
        }
        Some(found)
    }

    /// The whole store as a query string.
    pub fn string(&self) -> String {
        self.params
            .iter()
            .flat_map(|(_, slot)| slot.serialized())
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Adds every pair of a query string. Empty segments and segments that do
    /// not parse are skipped.
    pub fn parse_string(&mut self, raw: &str) {
        for segment in raw.split('&').filter(|segment| !segment.is_empty()) {
            match Parameter::parse(segment) {
                Some(param) => {
                    let name = param.name().to_string();
                    self.add(&name, Some(param));
                }
                None => debug!("store: skipping malformed query segment {segment:?}"),
            }
        }
    }

    /// The exposed parameters as a query string, in `exposed` order.
    pub fn exposed_string(&self) -> String {
        self.exposed
            .iter()
            .filter_map(|name| self.peek(name))
            .flat_map(ParamSlot::serialized)
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn exposed_reset(&mut self) {
        let exposed = std::mem::take(&mut self.exposed);
        for name in &exposed {
            self.remove(name, None);
        }
        self.exposed = exposed;
    }

    /// Applies persisted state. With `reset`, exposed names first lose their
    /// current values so that a name missing from `stored` ends up cleared.
    pub fn load(&mut self, stored: &str, reset: bool) {
        if reset {
            self.exposed_reset();
        }
        self.parse_string(stored);
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
