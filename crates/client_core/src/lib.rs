use std::sync::Arc;

use shared::{NullListFormat, ParameterStore, SearchResponse};
use storage::{NoPersistence, StatePersistence};
use tracing::{debug, info, warn};

pub mod config;
pub mod error;
pub mod render;
pub mod transport;
pub mod widgets;

pub use config::{load_settings, Settings};
pub use error::ManagerError;
pub use render::{NullRenderer, OutputFormat, Renderer, TextRenderer};
pub use transport::{MissingTransport, RecordedRequest, ReplayTransport, Transport};
pub use widgets::{
    CurrentFilter, CurrentSearchWidget, FacetItem, FacetOrder, FacetWidget, PagerWidget,
    ResultLayout, ResultWidget, TextWidget, Widget, WidgetContext, WidgetView,
};

/// A request that has been prepared but whose response has not been
/// delivered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub sequence: u64,
    pub servlet: String,
    pub query: String,
}

impl RequestTicket {
    /// Where a browser-style client would send this request: the proxy (which
    /// receives the query as its body) or `<solr_url><servlet>?<query>&wt=json`.
    pub fn url(&self, settings: &Settings) -> String {
        match &settings.proxy_url {
            Some(proxy_url) => proxy_url.clone(),
            None => format!(
                "{}{}?{}&wt=json",
                settings.solr_url, self.servlet, self.query
            ),
        }
    }
}

/// Drives the search cycle: widgets edit the query state, the manager
/// persists and sends it, then hands the response to every widget in
/// registration order.
pub struct Manager {
    settings: Settings,
    store: ParameterStore,
    widgets: Vec<Box<dyn Widget>>,
    transport: Arc<dyn Transport>,
    persistence: Arc<dyn StatePersistence>,
    renderer: Box<dyn Renderer>,
    response: Arc<SearchResponse>,
    views: Vec<(String, WidgetView)>,
    initialized: bool,
    issued: u64,
}

impl Manager {
    pub fn new(settings: Settings) -> Self {
        let store = ParameterStore::with_exposed(settings.exposed.iter().cloned());
        Self {
            settings,
            store,
            widgets: Vec::new(),
            transport: Arc::new(MissingTransport),
            persistence: Arc::new(NoPersistence),
            renderer: Box::new(NullRenderer),
            response: Arc::new(SearchResponse::default()),
            views: Vec::new(),
            initialized: false,
            issued: 0,
        }
    }

    #[must_use]
    pub fn with_store(mut self, store: ParameterStore) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub fn with_persistence(mut self, persistence: Arc<dyn StatePersistence>) -> Self {
        self.persistence = persistence;
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Registers a widget. A widget with the same id is replaced in place.
    pub fn add_widget(&mut self, widget: Box<dyn Widget>) {
        match self.widgets.iter_mut().find(|w| w.id() == widget.id()) {
            Some(slot) => *slot = widget,
            None => self.widgets.push(widget),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn servlet(&self) -> &str {
        &self.settings.servlet
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ParameterStore {
        &mut self.store
    }

    pub fn response(&self) -> Arc<SearchResponse> {
        Arc::clone(&self.response)
    }

    /// Views produced by the last response, in widget order.
    pub fn views(&self) -> &[(String, WidgetView)] {
        &self.views
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn widget<W: Widget + 'static>(&self, id: &str) -> Option<&W> {
        self.widgets
            .iter()
            .find(|w| w.id() == id)?
            .as_any()
            .downcast_ref::<W>()
    }

    /// Runs `edit` with the widget `id` and the store, for user actions such
    /// as selecting a facet value. `None` if there is no such widget of type `W`.
    pub fn with_widget<W: Widget + 'static, R>(
        &mut self,
        id: &str,
        edit: impl FnOnce(&W, &mut ParameterStore) -> R,
    ) -> Option<R> {
        let widget = self
            .widgets
            .iter()
            .find(|w| w.id() == id)?
            .as_any()
            .downcast_ref::<W>()?;
        Some(edit(widget, &mut self.store))
    }

    /// Loads persisted state and lets every widget set up its parameters.
    /// Runs once it has succeeded; after a failure the next call starts over.
    pub async fn init(&mut self) -> Result<(), ManagerError> {
        if self.initialized {
            return Ok(());
        }

        self.apply_settings_defaults();
        let stored = self
            .persistence
            .load()
            .await
            .map_err(ManagerError::Persistence)?;
        self.store.load(&stored, false);

        let response = Arc::clone(&self.response);
        for widget in &mut self.widgets {
            debug!("manager: init widget {}", widget.id());
            let mut ctx = WidgetContext {
                store: &mut self.store,
                response: &response,
            };
            widget.init(&mut ctx)?;
        }

        self.persistence
            .init()
            .await
            .map_err(ManagerError::Persistence)?;
        self.initialized = true;
        info!(
            "manager: initialized with {} widget(s), servlet {}",
            self.widgets.len(),
            self.settings.servlet
        );
        Ok(())
    }

    fn apply_settings_defaults(&mut self) {
        let json_nl = self.settings.json_nl.as_str();
        if !json_nl.is_empty() && self.store.first_value(NullListFormat::PARAM).is_none() {
            self.store.add_by_value(NullListFormat::PARAM, json_nl, None);
        }
        if self.store.first_value("rows").is_none() {
            self.store.add_by_value("rows", self.settings.rows, None);
        }
    }

    /// Saves the exposed state, runs every widget's `before_request` and
    /// sends the query.
    pub async fn do_request(
        &mut self,
        start: Option<u64>,
        servlet: Option<&str>,
    ) -> Result<(), ManagerError> {
        let servlet = self.prepare(start, servlet).await?;
        self.execute_request(&servlet).await
    }

    /// Issues a request on behalf of widget `widget_id`, using the offset that
    /// widget asks for.
    pub async fn request_from(&mut self, widget_id: &str) -> Result<(), ManagerError> {
        let start = self
            .widgets
            .iter()
            .find(|w| w.id() == widget_id)
            .and_then(|w| w.request_start());
        self.do_request(start, None).await
    }

    /// Sends the current query to `servlet` and delivers the response.
    pub async fn execute_request(&mut self, servlet: &str) -> Result<(), ManagerError> {
        let ticket = self.issue_ticket(servlet);
        let response = self
            .transport
            .execute(&ticket.servlet, &ticket.query)
            .await
            .map_err(ManagerError::from_transport)?;
        self.complete_request(ticket, response)?;
        Ok(())
    }

    /// Everything [`Manager::do_request`] does short of calling the
    /// transport. The caller sends the ticket's query and hands the payload to
    /// [`Manager::complete_request`].
    pub async fn prepare_request(
        &mut self,
        start: Option<u64>,
        servlet: Option<&str>,
    ) -> Result<RequestTicket, ManagerError> {
        let servlet = self.prepare(start, servlet).await?;
        Ok(self.issue_ticket(&servlet))
    }

    /// Delivers `data` if `ticket` is the most recently issued one. Responses
    /// to superseded requests are dropped and `Ok(false)` is returned.
    pub fn complete_request(
        &mut self,
        ticket: RequestTicket,
        data: SearchResponse,
    ) -> Result<bool, ManagerError> {
        if ticket.sequence != self.issued {
            warn!(
                "manager: discarding response to request #{} ({} is current)",
                ticket.sequence, self.issued
            );
            return Ok(false);
        }
        self.handle_response(data)?;
        Ok(true)
    }

    /// Makes `data` the current response and lets every widget build its view.
    /// If a widget fails, the previous response and views stay in place.
    pub fn handle_response(&mut self, data: SearchResponse) -> Result<(), ManagerError> {
        if let Some(error) = &data.error {
            warn!("manager: server error {}: {}", error.code, error.msg);
            return Err(ManagerError::Server {
                code: error.code,
                msg: error.msg.clone(),
            });
        }

        let response = Arc::new(data);
        let mut views = Vec::with_capacity(self.widgets.len());
        for widget in &mut self.widgets {
            let mut ctx = WidgetContext {
                store: &mut self.store,
                response: &response,
            };
            if let Some(view) = widget.after_request(&mut ctx)? {
                views.push((widget.id().to_string(), view));
            }
        }

        for (widget_id, view) in &views {
            self.renderer.render(widget_id, view);
        }
        self.response = Arc::clone(&response);
        self.views = views;
        info!(
            "manager: handled response with {} result(s)",
            response.response.num_found
        );
        Ok(())
    }

    /// Re-reads persisted state, clearing exposed parameters it no longer
    /// mentions, and searches again. This is the path for a restored
    /// bookmark or a history navigation.
    pub async fn reload(&mut self) -> Result<(), ManagerError> {
        self.init().await?;
        let stored = self
            .persistence
            .load()
            .await
            .map_err(ManagerError::Persistence)?;
        self.store.load(&stored, true);
        self.do_request(None, None).await
    }

    async fn prepare(
        &mut self,
        start: Option<u64>,
        servlet: Option<&str>,
    ) -> Result<String, ManagerError> {
        self.init().await?;
        if let Some(start) = start {
            self.store.param("start").set_val(start);
        }
        let servlet = servlet.unwrap_or(self.settings.servlet.as_str()).to_string();

        self.persistence
            .save(&self.store.exposed_string())
            .await
            .map_err(ManagerError::Persistence)?;

        let response = Arc::clone(&self.response);
        for widget in &mut self.widgets {
            let mut ctx = WidgetContext {
                store: &mut self.store,
                response: &response,
            };
            widget.before_request(&mut ctx)?;
        }
        Ok(servlet)
    }

    fn issue_ticket(&mut self, servlet: &str) -> RequestTicket {
        self.issued += 1;
        let ticket = RequestTicket {
            sequence: self.issued,
            servlet: servlet.to_string(),
            query: self.store.string(),
        };
        info!(
            "manager: request #{} to {}: {}",
            ticket.sequence, ticket.servlet, ticket.query
        );
        ticket
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
