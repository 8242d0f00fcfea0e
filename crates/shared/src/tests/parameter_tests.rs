use pretty_assertions::assert_eq;

use super::*;

#[test]
fn serializes_plain_value() {
    let param = Parameter::with_value("q", "shoes");
    assert_eq!(param.serialize(), "q=shoes");
}

#[test]
fn serializes_with_component_encoding() {
    let param = Parameter::with_value("fq", "price:[10 TO 20]");
    assert_eq!(param.serialize(), "fq=price%3A%5B10%20TO%2020%5D");

    let param = Parameter::with_value("q", "it's (a) test!*~");
    assert_eq!(param.serialize(), "q=it's%20(a)%20test!*~");
}

#[test]
fn serializes_list_comma_joined() {
    let param = Parameter::with_value("fl", vec!["id", "name"]);
    assert_eq!(param.serialize(), "fl=id%2Cname");
}

#[test]
fn empty_value_serializes_to_nothing() {
    assert_eq!(Parameter::new("rows").serialize(), "");
    assert_eq!(Parameter::with_value("rows", "").serialize(), "");
    assert_eq!(
        Parameter::with_value("fl", Vec::<String>::new()).serialize(),
        ""
    );
}

#[test]
fn numbers_and_bools_render_as_text() {
    assert_eq!(Parameter::with_value("rows", 20).serialize(), "rows=20");
    assert_eq!(Parameter::with_value("facet", true).serialize(), "facet=true");
}

#[test]
fn serializes_local_params_prefix() {
    let mut param = Parameter::with_value("fq", "type:book");
    param.set_local("tag", "type");
    param.set_local("cache", "false");
    assert_eq!(
        param.serialize(),
        "fq={!tag=type%20cache=false}type%3Abook"
    );
}

#[test]
fn skips_locals_without_value() {
    let mut param = Parameter::with_value("fq", "a");
    param.set_local("tag", "");
    param.set_local("ex", "x");
    assert_eq!(param.serialize(), "fq={!ex=x}a");
}

#[test]
fn empty_main_query_with_locals_becomes_q_alt() {
    let mut param = Parameter::new("q");
    param.set_local("type", "dismax");
    assert_eq!(param.serialize(), "q.alt={!type=dismax}*%3A*");
}

#[test]
fn parses_plain_pair() {
    let param = Parameter::parse("fq=price%3A%5B10%20TO%2020%5D").expect("parse");
    assert_eq!(param.name(), "fq");
    assert_eq!(param.val(), Some(&ParamValue::from("price:[10 TO 20]")));
    assert!(param.locals().is_empty());
}

#[test]
fn parses_locals_block() {
    let param = Parameter::parse("fq={!tag=type%20cache=false}type%3Abook").expect("parse");
    assert_eq!(param.local("tag"), Some("type"));
    assert_eq!(param.local("cache"), Some("false"));
    assert_eq!(param.val(), Some(&ParamValue::from("type:book")));
}

#[test]
fn parses_comma_value_as_list() {
    let param = Parameter::parse("fl=id%2Cname").expect("parse");
    assert_eq!(param.val(), Some(&ParamValue::from(vec!["id", "name"])));
}

#[test]
fn parses_q_alt_back_into_q() {
    let param = Parameter::parse("q.alt={!type=dismax}*%3A*").expect("parse");
    assert_eq!(param.name(), "q");
    assert_eq!(param.val(), None);
    assert_eq!(param.local("type"), Some("dismax"));
}

#[test]
fn rejects_segment_without_equals() {
    assert!(Parameter::parse("facet").is_none());
    assert!(Parameter::parse("=value").is_none());
}

#[test]
fn local_accessors_edit_in_place() {
    let mut param = Parameter::with_value("q", "x");
    param.set_local("df", "title");
    param.set_local("df", "body");
    assert_eq!(param.local("df"), Some("body"));
    assert_eq!(param.remove_local("df"), Some("body".to_string()));
    assert_eq!(param.local("df"), None);

    param.clear_val();
    assert_eq!(param.val(), None);
    param.set_val("y");
    assert_eq!(param.val(), Some(&ParamValue::from("y")));
}

#[test]
fn escapes_values_with_spaces_or_colons() {
    assert_eq!(escape_value("red beads"), "\"red beads\"");
    assert_eq!(escape_value("a:b"), "\"a:b\"");
    assert_eq!(escape_value("red"), "red");
}

#[test]
fn leaves_ranges_and_wrapped_values_alone() {
    assert_eq!(escape_value("[1 TO 5]"), "[1 TO 5]");
    assert_eq!(escape_value("{* TO 2020}"), "{* TO 2020}");
    assert_eq!(escape_value("\"already quoted\""), "\"already quoted\"");
    assert_eq!(escape_value("(a OR b)"), "(a OR b)");
    assert_eq!(Parameter::escape_value("two words"), "\"two words\"");
}
