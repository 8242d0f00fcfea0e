use crate::{parameter::ParamValue, store::ParameterStore};

const MAIN_QUERY: &str = "q";

/// Edits the main query (`q`) and reports whether it actually changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSelection;

impl TextSelection {
    pub fn set(&self, store: &mut ParameterStore, query: impl Into<ParamValue>) -> bool {
        let query = query.into();
        Self::change(store, |store| store.param(MAIN_QUERY).set_val(query))
    }

    pub fn clear(&self, store: &mut ParameterStore) -> bool {
        Self::change(store, |store| {
            store.remove(MAIN_QUERY, None);
        })
    }

    pub fn current<'a>(&self, store: &'a ParameterStore) -> Option<&'a ParamValue> {
        store.first_value(MAIN_QUERY)
    }

    fn change(store: &mut ParameterStore, edit: impl FnOnce(&mut ParameterStore)) -> bool {
        let before = store.first_value(MAIN_QUERY).cloned();
        edit(store);
        before.as_ref() != store.first_value(MAIN_QUERY)
    }
}

#[cfg(test)]
#[path = "tests/text_tests.rs"]
mod tests;
