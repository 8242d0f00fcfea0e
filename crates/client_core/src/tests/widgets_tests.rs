use pretty_assertions::assert_eq;
use serde_json::json;
use shared::{FacetKind, FacetOption};

use super::*;

fn response(value: serde_json::Value) -> SearchResponse {
    serde_json::from_value(value).expect("response")
}

fn run_after(widget: &mut dyn Widget, store: &mut ParameterStore, response: &SearchResponse) -> WidgetView {
    let mut ctx = WidgetContext { store, response };
    widget
        .after_request(&mut ctx)
        .expect("after_request")
        .expect("view")
}

#[test]
fn facet_widget_marks_selected_values() {
    let mut widget = FacetWidget::new(
        "color",
        FacetSelection::new("color")
            .with_kind(FacetKind::Field)
            .with_option(FacetOption::MinCount, 1),
    );
    let mut store = ParameterStore::new();
    let empty = SearchResponse::default();
    widget
        .init(&mut WidgetContext {
            store: &mut store,
            response: &empty,
        })
        .expect("init");
    store.add_by_value("json.nl", "map", None);
    assert!(widget.select(&mut store, "red"));

    let payload = response(json!({
        "facet_counts": { "facet_fields": { "color": { "red": 3, "blue": 5 } } }
    }));
    let view = run_after(&mut widget, &mut store, &payload);

    assert_eq!(
        view,
        WidgetView::Facets {
            field: "color".into(),
            items: vec![
                FacetItem {
                    facet: "red".into(),
                    count: 3,
                    selected: true,
                    fq: "color:red".into(),
                },
                FacetItem {
                    facet: "blue".into(),
                    count: 5,
                    selected: false,
                    fq: "color:blue".into(),
                },
            ],
        }
    );
    assert_eq!(
        store.string(),
        "facet=true&facet.field=color&f.color.facet.mincount=1&json.nl=map&fq=color%3Ared"
    );
}

#[test]
fn facet_widget_can_sort_alphabetically() {
    let mut widget = FacetWidget::new(
        "color",
        FacetSelection::new("color").with_kind(FacetKind::Field),
    )
    .with_order(FacetOrder::Alphabetical);
    let mut store = ParameterStore::new();
    let payload = response(json!({
        "facet_counts": { "facet_fields": { "color": ["red", 9, "blue", 5, "green", 1] } }
    }));

    let WidgetView::Facets { items, .. } = run_after(&mut widget, &mut store, &payload) else {
        panic!("expected facets");
    };
    let names: Vec<&str> = items.iter().map(|item| item.facet.as_str()).collect();
    assert_eq!(names, vec!["blue", "green", "red"]);
}

#[test]
fn multivalue_facet_widget_adds_on_select() {
    let widget = FacetWidget::new(
        "size",
        FacetSelection::new("size")
            .with_kind(FacetKind::Field)
            .with_multivalue(true),
    );
    let mut store = ParameterStore::new();
    assert!(widget.select(&mut store, "L"));
    assert!(widget.select(&mut store, "XL"));
    assert!(widget.unselect(&mut store, "L"));
    assert_eq!(store.values("fq"), vec![ParamValue::from("size:XL")]);
}

#[test]
fn text_widget_reports_query() {
    let mut widget = TextWidget::new("search");
    let mut store = ParameterStore::new();
    assert!(widget.set(&mut store, "shoes"));
    assert!(!widget.set(&mut store, "shoes"));

    let view = run_after(&mut widget, &mut store, &SearchResponse::default());
    assert_eq!(
        view,
        WidgetView::Text {
            query: Some("shoes".into())
        }
    );
    assert!(widget.clear(&mut store));
}

#[test]
fn pager_widget_builds_window_and_moves_pages() {
    let mut widget = PagerWidget::new("pager", 1, 1);
    let mut store = ParameterStore::new();
    assert!(!widget.go_to_page(&mut store, 2));

    store.add_by_value("rows", 10, None);
    store.add_by_value("start", 40, None);
    let payload = response(json!({ "response": { "numFound": 200, "start": 40, "docs": [] } }));
    let view = run_after(&mut widget, &mut store, &payload);

    let WidgetView::Pager {
        state,
        pages,
        display,
    } = view
    else {
        panic!("expected pager");
    };
    assert_eq!(state.current_page, 5);
    assert_eq!(state.total_pages, 20);
    assert_eq!(display.as_deref(), Some("41 to 50 of 200"));
    assert_eq!(
        pages,
        vec![
            PageItem::Page(1),
            PageItem::Page(2),
            PageItem::Page(3),
            PageItem::Page(4),
            PageItem::Page(5),
            PageItem::Page(6),
            PageItem::Gap,
            PageItem::Page(19),
            PageItem::Page(20),
        ]
    );

    assert!(widget.go_to_page(&mut store, 7));
    assert_eq!(store.first_value("start"), Some(&ParamValue::from("60")));
    assert!(!widget.go_to_page(&mut store, 21));
    assert!(!widget.go_to_page(&mut store, 0));
}

#[test]
fn result_widget_passes_docs_through() {
    let mut widget = ResultWidget::new("results", ResultLayout::Grid);
    let mut store = ParameterStore::new();
    let payload = response(json!({
        "response": { "numFound": 2, "start": 0, "docs": [{ "id": "a" }, { "id": "b" }] }
    }));

    let view = run_after(&mut widget, &mut store, &payload);
    assert_eq!(
        view,
        WidgetView::Results {
            layout: ResultLayout::Grid,
            total: 2,
            start: 0,
            docs: vec![json!({ "id": "a" }), json!({ "id": "b" })],
        }
    );
}

#[test]
fn current_search_lists_query_and_filters() {
    let mut widget = CurrentSearchWidget::new("current");
    let mut store = ParameterStore::new();
    store.add_by_value("q", "shoes", None);
    store.add_by_value("fq", "color:red", None);
    store.add_by_value("fq", "-brand:\"Acme Co\"", None);
    store.add_by_value("fq", "category:(boots OR sandals)", None);

    let view = run_after(&mut widget, &mut store, &SearchResponse::default());
    assert_eq!(
        view,
        WidgetView::CurrentSearch {
            query: Some("shoes".into()),
            filters: vec![
                CurrentFilter {
                    fq: "color:red".into(),
                    label: "color red".into(),
                },
                CurrentFilter {
                    fq: "-brand:\"Acme Co\"".into(),
                    label: "brand Acme Co".into(),
                },
                CurrentFilter {
                    fq: "category:(boots OR sandals)".into(),
                    label: "boots OR sandals".into(),
                },
            ],
        }
    );

    assert!(widget.remove_filter(&mut store, "color:red"));
    assert!(!widget.remove_filter(&mut store, "color:red"));
}

#[test]
fn current_search_hides_match_all_and_resets() {
    let mut widget = CurrentSearchWidget::new("current");
    let mut store = ParameterStore::new();
    store.add_by_value("q", "shoes", None);
    store.add_by_value("fq", "color:red", None);

    assert!(widget.reset_all(&mut store));
    assert!(!widget.reset_all(&mut store));
    assert_eq!(store.string(), "q=*%3A*");

    let view = run_after(&mut widget, &mut store, &SearchResponse::default());
    assert_eq!(
        view,
        WidgetView::CurrentSearch {
            query: None,
            filters: Vec::new(),
        }
    );
}
