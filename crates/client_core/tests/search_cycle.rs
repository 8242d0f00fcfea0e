use std::sync::{Arc, Mutex};

use client_core::{
    CurrentSearchWidget, FacetWidget, Manager, OutputFormat, PagerWidget, Renderer, ReplayTransport,
    ResultLayout, ResultWidget, Settings, TextRenderer, TextWidget, WidgetView,
};
use shared::{FacetKind, FacetOption, FacetSelection, ParamValue};
use storage::{SqlitePersistence, StatePersistence};

const RECORDED: &str = r#"{
    "responseHeader": { "status": 0, "QTime": 3, "params": { "rows": "10", "start": "0" } },
    "response": { "numFound": 42, "start": 0, "docs": [{ "id": "boot-1" }, { "id": "boot-2" }] },
    "facet_counts": {
        "facet_queries": {},
        "facet_fields": { "color": { "red": 3, "blue": 12 } },
        "facet_dates": {},
        "facet_ranges": {}
    }
}"#;

/// Lets the test read what the manager rendered.
#[derive(Clone)]
struct SharedRenderer(Arc<Mutex<TextRenderer>>);

impl Renderer for SharedRenderer {
    fn render(&mut self, widget_id: &str, view: &WidgetView) {
        self.0.lock().expect("renderer lock").render(widget_id, view);
    }
}

fn register_widgets(manager: &mut Manager) {
    manager.add_widget(Box::new(TextWidget::new("search")));
    manager.add_widget(Box::new(FacetWidget::new(
        "color",
        FacetSelection::new("color")
            .with_kind(FacetKind::Field)
            .with_option(FacetOption::MinCount, 1),
    )));
    manager.add_widget(Box::new(PagerWidget::new("pager", 4, 1)));
    manager.add_widget(Box::new(ResultWidget::new("results", ResultLayout::List)));
    manager.add_widget(Box::new(CurrentSearchWidget::new("current")));
}

#[tokio::test]
async fn search_select_and_restore() {
    let persistence = Arc::new(
        SqlitePersistence::new("sqlite::memory:", "kiosk")
            .await
            .expect("db"),
    );
    let transport = ReplayTransport::from_json(RECORDED).expect("recorded");
    let rendered = Arc::new(Mutex::new(TextRenderer::new(OutputFormat::Text)));

    let mut manager = Manager::new(Settings::default())
        .with_transport(Arc::new(transport.clone()))
        .with_persistence(persistence.clone())
        .with_renderer(Box::new(SharedRenderer(Arc::clone(&rendered))));
    register_widgets(&mut manager);

    manager
        .with_widget::<TextWidget, _>("search", |widget, store| widget.set(store, "boots"))
        .expect("text widget");
    manager.request_from("search").await.expect("first search");

    assert_eq!(
        persistence.load().await.expect("stored"),
        "q=boots&start=0"
    );
    let output = rendered.lock().expect("renderer lock").take_output();
    assert!(output.contains("    red (3)"), "{output}");
    assert!(output.contains("1 to 10 of 42"), "{output}");
    assert!(output.contains("pages: [1] 2 3 4 5"), "{output}");

    let selected = manager
        .with_widget::<FacetWidget, _>("color", |widget, store| widget.select(store, "red"))
        .expect("facet widget");
    assert!(selected);
    manager.request_from("color").await.expect("second search");

    let requests = transport.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|request| request.servlet == "select"));
    assert_eq!(
        requests[1].query,
        "q=boots&json.nl=map&rows=10&facet=true&facet.field=color\
         &f.color.facet.mincount=1&start=0&fq=color%3Ared"
    );
    assert_eq!(
        persistence.load().await.expect("stored"),
        "fq=color%3Ared&q=boots&start=0"
    );

    let output = rendered.lock().expect("renderer lock").take_output();
    assert!(output.contains("  * red (3)"), "{output}");
    assert!(output.contains("(x) color red"), "{output}");

    // A second session on the same database starts where the first one stopped.
    let mut restored = Manager::new(Settings::default()).with_persistence(persistence.clone());
    register_widgets(&mut restored);
    restored.init().await.expect("init");
    assert_eq!(
        restored.store().values("fq"),
        vec![ParamValue::from("color:red")]
    );
    assert_eq!(
        restored.store().first_value("q"),
        Some(&ParamValue::from("boots"))
    );
}

#[tokio::test]
async fn json_output_lists_one_line_per_widget() {
    let rendered = Arc::new(Mutex::new(TextRenderer::new(OutputFormat::Json)));
    let mut manager = Manager::new(Settings::default())
        .with_transport(Arc::new(ReplayTransport::from_json(RECORDED).expect("recorded")))
        .with_renderer(Box::new(SharedRenderer(Arc::clone(&rendered))));
    register_widgets(&mut manager);

    manager.do_request(None, None).await.expect("search");

    let output = rendered.lock().expect("renderer lock").take_output();
    let widgets: Vec<String> = output
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("json line");
            value["widget"].as_str().expect("widget id").to_string()
        })
        .collect();
    assert_eq!(widgets, vec!["search", "color", "pager", "results", "current"]);
}
