//! End-to-end compilation of selection models into query text

use tabql::{FilterExpr, QueryCompiler, QueryOptions, QuerySpec, SortDirection, VersionScope};

fn compiler() -> QueryCompiler {
    QueryCompiler::new("__r")
}

#[test]
fn plain_selection() {
    let q = compiler()
        .compile(&QuerySpec::new("product__v", ["id", "name__v"]))
        .unwrap();
    assert_eq!(q.as_str(), "SELECT id, name__v FROM product__v");
}

#[test]
fn subquery_groups_and_filter_together() {
    let spec = QuerySpec::new(
        "document__v",
        ["id", "files__r/name__v", "files__r/size__v", "status__v"],
    )
    .with_filter(FilterExpr::and(vec![
        FilterExpr::simple("status__v", "eq_string", "active"),
        FilterExpr::simple("size__v", "gt_number", "1024"),
    ]))
    .with_sort("id", SortDirection::Asc);
    let q = compiler().compile(&spec).unwrap();
    assert_eq!(
        q.as_str(),
        "SELECT id, (SELECT name__v,size__v FROM files__r) FROM document__v \
         WHERE status__v = 'active' AND size__v > 1024 ORDER BY id ASC"
    );
}

#[test]
fn argument_escaping_survives_through_full_compile() {
    let spec = QuerySpec::new("d", ["id"]).with_filter(FilterExpr::or(vec![
        FilterExpr::simple("name", "LIKE", "Tr%"),
        FilterExpr::simple("tag", "eq_string", "a&b"),
        FilterExpr::simple("note", "eq_string", "50%25 done"),
    ]));
    let q = compiler().compile(&spec).unwrap();
    assert_eq!(
        q.as_str(),
        "SELECT id FROM d WHERE name LIKE 'Tr%25' OR tag = 'a%26b' OR note = '50%25 done'"
    );
}

#[test]
fn version_scope_find_and_pagination_hints() {
    let spec = QuerySpec::new("document__v", ["id"]).with_options(QueryOptions {
        max_rows: 1000,
        page_size: 200,
        find: Some("stability".into()),
        version_scope: VersionScope::LatestOfMatching,
    });
    let q = compiler().compile(&spec).unwrap();
    assert_eq!(
        q.as_str(),
        "SELECT latestversion id FROM allversions document__v \
         FIND ('stability') MAXROWS 1000 PAGESIZE 200"
    );
}

#[test]
fn empty_selection_is_rejected_before_any_request() {
    let err = compiler()
        .compile(&QuerySpec::new("d", Vec::<String>::new()))
        .unwrap_err();
    assert!(err.is_pre_network());
}

#[test]
fn custom_subquery_suffix_is_honored() {
    let q = QueryCompiler::new("__sub")
        .compile(&QuerySpec::new("d", ["rel__sub/id", "files__r/name"]))
        .unwrap();
    // With a different marker, "__r" paths are plain nested fields.
    assert_eq!(
        q.as_str(),
        "SELECT (SELECT id FROM rel__sub), files__r.name FROM d"
    );
}
