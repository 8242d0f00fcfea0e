use std::any::Any;

use serde::Serialize;
use serde_json::Value;
use shared::{
    pagination::PageItem, parameter::MATCH_ALL, FacetSelection, PagerState,
    ParamValue, ParameterStore, SearchResponse, TextSelection,
};

use crate::error::ManagerError;

/// What a widget hook can see: the query state and the last response.
pub struct WidgetContext<'a> {
    pub store: &'a mut ParameterStore,
    pub response: &'a SearchResponse,
}

/// Display-ready output of one widget after a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetView {
    Facets {
        field: String,
        items: Vec<FacetItem>,
    },
    Text {
        query: Option<String>,
    },
    Pager {
        state: PagerState,
        pages: Vec<PageItem>,
        display: Option<String>,
    },
    Results {
        layout: ResultLayout,
        total: u64,
        start: u64,
        docs: Vec<Value>,
    },
    CurrentSearch {
        query: Option<String>,
        filters: Vec<CurrentFilter>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetItem {
    pub facet: String,
    pub count: u64,
    pub selected: bool,
    pub fq: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentFilter {
    pub fq: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultLayout {
    #[default]
    List,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacetOrder {
    /// As the engine returned them, which is by count unless `facet.sort` says otherwise.
    #[default]
    Count,
    Alphabetical,
}

/// A participant in the request cycle. Every hook is optional.
pub trait Widget: Send + Sync {
    fn id(&self) -> &str;

    /// The `start` to request with when this widget triggers a search.
    fn request_start(&self) -> Option<u64> {
        None
    }

    fn init(&mut self, _ctx: &mut WidgetContext<'_>) -> Result<(), ManagerError> {
        Ok(())
    }

    fn before_request(&mut self, _ctx: &mut WidgetContext<'_>) -> Result<(), ManagerError> {
        Ok(())
    }

    fn after_request(
        &mut self,
        _ctx: &mut WidgetContext<'_>,
    ) -> Result<Option<WidgetView>, ManagerError> {
        Ok(None)
    }

    fn as_any(&self) -> &dyn Any;
}

/// Facet counts for one field, with selection state.
pub struct FacetWidget {
    id: String,
    selection: FacetSelection,
    order: FacetOrder,
}

impl FacetWidget {
    pub fn new(id: impl Into<String>, selection: FacetSelection) -> Self {
        Self {
            id: id.into(),
            selection,
            order: FacetOrder::default(),
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: FacetOrder) -> Self {
        self.order = order;
        self
    }

    pub fn selection(&self) -> &FacetSelection {
        &self.selection
    }

    /// Click on a facet value.
    pub fn select(&self, store: &mut ParameterStore, value: &str) -> bool {
        self.selection.select(store, value)
    }

    /// Click on a selected facet value.
    pub fn unselect(&self, store: &mut ParameterStore, value: &str) -> bool {
        self.selection.remove(store, value)
    }
}

impl Widget for FacetWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn request_start(&self) -> Option<u64> {
        Some(0)
    }

    fn init(&mut self, ctx: &mut WidgetContext<'_>) -> Result<(), ManagerError> {
        self.selection.init_store(ctx.store);
        Ok(())
    }

    fn after_request(
        &mut self,
        ctx: &mut WidgetContext<'_>,
    ) -> Result<Option<WidgetView>, ManagerError> {
        let mut items: Vec<FacetItem> = self
            .selection
            .facet_counts(ctx.store, ctx.response)?
            .into_iter()
            .map(|count| FacetItem {
                selected: self.selection.is_selected(ctx.store, &count.facet),
                fq: self.selection.fq(&count.facet, false),
                facet: count.facet,
                count: count.count,
            })
            .collect();
        if self.order == FacetOrder::Alphabetical {
            items.sort_by(|a, b| a.facet.cmp(&b.facet));
        }
        Ok(Some(WidgetView::Facets {
            field: self.selection.field().to_string(),
            items,
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Free-text search box bound to the main query.
pub struct TextWidget {
    id: String,
    text: TextSelection,
}

impl TextWidget {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: TextSelection,
        }
    }

    pub fn set(&self, store: &mut ParameterStore, query: &str) -> bool {
        self.text.set(store, query)
    }

    pub fn clear(&self, store: &mut ParameterStore) -> bool {
        self.text.clear(store)
    }
}

impl Widget for TextWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn request_start(&self) -> Option<u64> {
        Some(0)
    }

    fn after_request(
        &mut self,
        ctx: &mut WidgetContext<'_>,
    ) -> Result<Option<WidgetView>, ManagerError> {
        let query = self.text.current(ctx.store).map(ParamValue::to_string);
        Ok(Some(WidgetView::Text { query }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct PagerWidget {
    id: String,
    inner_window: u32,
    outer_window: u32,
    state: Option<PagerState>,
}

impl PagerWidget {
    pub fn new(id: impl Into<String>, inner_window: u32, outer_window: u32) -> Self {
        Self {
            id: id.into(),
            inner_window,
            outer_window,
            state: None,
        }
    }

    /// The state computed from the last response.
    pub fn state(&self) -> Option<&PagerState> {
        self.state.as_ref()
    }

    /// Points `start` at `page`. Returns `false` when no response has been
    /// seen yet or the page does not exist.
    pub fn go_to_page(&self, store: &mut ParameterStore, page: u64) -> bool {
        let Some(state) = self.state else {
            return false;
        };
        if page == 0 || page > state.total_pages {
            return false;
        }
        store.param("start").set_val(state.offset_for(page));
        true
    }
}

impl Widget for PagerWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn after_request(
        &mut self,
        ctx: &mut WidgetContext<'_>,
    ) -> Result<Option<WidgetView>, ManagerError> {
        let state = PagerState::from_response(ctx.store, ctx.response);
        self.state = Some(state);
        Ok(Some(WidgetView::Pager {
            state,
            pages: state.pages(self.inner_window, self.outer_window),
            display: state.display_range(),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct ResultWidget {
    id: String,
    layout: ResultLayout,
}

impl ResultWidget {
    pub fn new(id: impl Into<String>, layout: ResultLayout) -> Self {
        Self {
            id: id.into(),
            layout,
        }
    }
}

impl Widget for ResultWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn request_start(&self) -> Option<u64> {
        Some(0)
    }

    fn after_request(
        &mut self,
        ctx: &mut WidgetContext<'_>,
    ) -> Result<Option<WidgetView>, ManagerError> {
        let result = &ctx.response.response;
        Ok(Some(WidgetView::Results {
            layout: self.layout,
            total: result.num_found,
            start: result.start,
            docs: result.docs.clone(),
        }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Lists the active query and filters so they can be removed one by one.
pub struct CurrentSearchWidget {
    id: String,
}

impl CurrentSearchWidget {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Resets the main query to match everything.
    pub fn clear_query(&self, store: &mut ParameterStore) -> bool {
        TextSelection.set(store, MATCH_ALL)
    }

    pub fn remove_filter(&self, store: &mut ParameterStore, fq: &str) -> bool {
        store.remove_by_value("fq", fq).is_some()
    }

    /// Drops every filter and resets the main query.
    pub fn reset_all(&self, store: &mut ParameterStore) -> bool {
        let query_changed = self.clear_query(store);
        let filters_removed = store.remove("fq", None);
        query_changed || filters_removed
    }
}

impl Widget for CurrentSearchWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn request_start(&self) -> Option<u64> {
        Some(0)
    }

    fn after_request(
        &mut self,
        ctx: &mut WidgetContext<'_>,
    ) -> Result<Option<WidgetView>, ManagerError> {
        let query = ctx
            .store
            .first_value("q")
            .map(ParamValue::to_string)
            .filter(|q| !q.is_empty() && q != MATCH_ALL);
        let filters = ctx
            .store
            .values("fq")
            .iter()
            .map(|value| {
                let fq = value.to_string();
                CurrentFilter {
                    label: filter_label(&fq),
                    fq,
                }
            })
            .collect();
        Ok(Some(WidgetView::CurrentSearch { query, filters }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `field:value` reads as "field value"; a grouped value `field:(a OR b)`
/// reads as its contents.
fn filter_label(fq: &str) -> String {
    let Some((field, value)) = fq.split_once(':') else {
        return fq.to_string();
    };
    if let (Some(open), Some(close)) = (value.find('('), value.rfind(')')) {
        if open < close {
            return value[open + 1..close].to_string();
        }
    }
    let value = value.trim_matches('"');
    format!("{} {value}", field.trim_start_matches('-'))
}

#[cfg(test)]
#[path = "tests/widgets_tests.rs"]
mod tests;
