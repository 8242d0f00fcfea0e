use std::fmt::Write as _;

use shared::PageItem;

use crate::widgets::WidgetView;

/// Turns widget views into output. Called once per view, in widget order.
pub trait Renderer: Send {
    fn render(&mut self, widget_id: &str, view: &WidgetView);
}

pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _widget_id: &str, _view: &WidgetView) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Collects views as plain text or as JSON lines.
#[derive(Debug, Default)]
pub struct TextRenderer {
    format: OutputFormat,
    output: String,
}

impl TextRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            output: String::new(),
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    fn render_text(&mut self, widget_id: &str, view: &WidgetView) {
        let out = &mut self.output;
        // Writing into a String cannot fail.
        let _ = writeln!(out, "[{widget_id}]");
        match view {
            WidgetView::Facets { field, items } => {
                let _ = writeln!(out, "  facet {field}");
                for item in items {
                    let marker = if item.selected { "*" } else { " " };
                    let _ = writeln!(out, "  {marker} {} ({})", item.facet, item.count);
                }
            }
            WidgetView::Text { query } => {
                let _ = writeln!(out, "  query: {}", query.as_deref().unwrap_or(""));
            }
            WidgetView::Pager {
                state,
                pages,
                display,
            } => {
                if let Some(display) = display {
                    let _ = writeln!(out, "  {display}");
                }
                let links: Vec<String> = pages
                    .iter()
                    .map(|item| match item {
                        PageItem::Page(page) if u64::from(*page) == state.current_page => {
                            format!("[{page}]")
                        }
                        PageItem::Page(page) => page.to_string(),
                        PageItem::Gap => "...".to_string(),
                    })
                    .collect();
                if !links.is_empty() {
                    let _ = writeln!(out, "  pages: {}", links.join(" "));
                }
            }
            WidgetView::Results {
                total, start, docs, ..
            } => {
                let _ = writeln!(out, "  {total} found, showing from {start}");
                for doc in docs {
                    let _ = writeln!(out, "  - {doc}");
                }
            }
            WidgetView::CurrentSearch { query, filters } => {
                if let Some(query) = query {
                    let _ = writeln!(out, "  (x) {query}");
                }
                for filter in filters {
                    let _ = writeln!(out, "  (x) {}", filter.label);
                }
            }
        }
    }
}

impl Renderer for TextRenderer {
    fn render(&mut self, widget_id: &str, view: &WidgetView) {
        match self.format {
            OutputFormat::Text => self.render_text(widget_id, view),
            OutputFormat::Json => {
                let line = serde_json::json!({ "widget": widget_id, "view": view });
                let _ = writeln!(self.output, "{line}");
            }
        }
    }
}
