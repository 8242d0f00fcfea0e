use super::*;

#[test]
fn set_reports_change_only_when_query_differs() {
    let mut store = ParameterStore::new();
    let text = TextSelection;
    assert!(text.set(&mut store, "shoes"));
    assert!(!text.set(&mut store, "shoes"));
    assert!(text.set(&mut store, "boots"));
    assert_eq!(text.current(&store), Some(&ParamValue::from("boots")));
}

#[test]
fn clear_removes_main_query() {
    let mut store = ParameterStore::new();
    let text = TextSelection;
    assert!(!text.clear(&mut store));
    text.set(&mut store, "shoes");
    assert!(text.clear(&mut store));
    assert_eq!(text.current(&store), None);
    assert_eq!(store.string(), "");
}
