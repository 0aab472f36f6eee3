//! Tests for `#[derive(Searchable)]`.

#![cfg(feature = "derive")]

use chrono::{DateTime, TimeZone, Utc};
use quarry::{
    Decimal, FieldResolver, QueryCompiler, SearchRequest, Searchable, Value, ValueDomain,
};
use uuid::Uuid;

#[derive(Debug, Clone, Searchable)]
struct Invoice {
    #[search(Identifier)]
    id: Uuid,
    #[search(String, rename = "customerName")]
    customer: String,
    #[search(Decimal)]
    amount: Decimal,
    #[search(Int64)]
    lines: u32,
    #[search(Boolean)]
    paid: bool,
    #[search(Timestamp, optional)]
    due: Option<DateTime<Utc>>,
    #[search(ty = "double")]
    discount: f32,
    #[allow(dead_code)]
    notes: String,
    #[search(skip)]
    #[allow(dead_code)]
    internal: String,
}

fn invoice(customer: &str, amount: &str, paid: bool, due_day: Option<u32>) -> Invoice {
    Invoice {
        id: Uuid::new_v4(),
        customer: customer.to_string(),
        amount: amount.parse().unwrap(),
        lines: 3,
        paid,
        due: due_day.map(|d| Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0).unwrap()),
        discount: 0.5,
        notes: String::new(),
        internal: String::new(),
    }
}

#[test]
fn generates_field_constants() {
    assert_eq!(Invoice::ID, "id");
    assert_eq!(Invoice::CUSTOMER_NAME, "customerName");
    assert_eq!(Invoice::DUE, "due");
}

#[test]
fn generates_descriptors_in_declaration_order() {
    let fields = Invoice::search_fields();
    let described: Vec<(&str, ValueDomain)> =
        fields.iter().map(|f| (f.name(), f.domain())).collect();

    assert_eq!(
        described,
        [
            ("id", ValueDomain::Identifier),
            ("customerName", ValueDomain::String),
            ("amount", ValueDomain::Decimal),
            ("lines", ValueDomain::Int64),
            ("paid", ValueDomain::Boolean),
            ("due", ValueDomain::Timestamp),
            ("discount", ValueDomain::Double),
        ]
    );
}

#[test]
fn accessors_read_and_widen_values() {
    let item = invoice("Acme", "12.50", false, None);

    let lines = FieldResolver::resolve::<Invoice>("LINES").unwrap();
    assert_eq!(lines.extract(&item), Value::Int64(3));

    let discount = FieldResolver::resolve::<Invoice>("discount").unwrap();
    assert_eq!(discount.extract(&item), Value::Double(0.5));

    let due = FieldResolver::resolve::<Invoice>("due").unwrap();
    assert!(due.extract(&item).is_none());

    let customer = FieldResolver::resolve::<Invoice>("customername").unwrap();
    assert_eq!(customer.extract(&item), Value::String("Acme"));
}

#[test]
fn skipped_and_unannotated_fields_are_not_searchable() {
    assert!(FieldResolver::resolve::<Invoice>("notes").is_none());
    assert!(FieldResolver::resolve::<Invoice>("internal").is_none());
}

#[test]
fn derived_type_compiles_and_runs() {
    let invoices = vec![
        invoice("Acme Corp", "100.00", false, Some(10)),
        invoice("Globex", "250.75", false, Some(20)),
        invoice("acme labs", "99.99", true, Some(5)),
        invoice("Initech", "10", false, None),
    ];

    let request = SearchRequest::new()
        .flag(Invoice::PAID, false)
        .range(Invoice::AMOUNT, Some(50.0), None)
        .sort_asc(Invoice::DUE);
    let query = QueryCompiler::<Invoice>::new().compile(&request).unwrap();

    let customers: Vec<&str> = query
        .filter(&invoices)
        .iter()
        .map(|i| i.customer.as_str())
        .collect();
    assert_eq!(customers, ["Acme Corp", "Globex"]);

    let request = SearchRequest::new().contains(Invoice::CUSTOMER_NAME, "ACME");
    let query = QueryCompiler::<Invoice>::new().compile(&request).unwrap();
    assert_eq!(query.count(&invoices), 2);
}

#[test]
fn missing_timestamps_sort_last() {
    let invoices = vec![
        invoice("a", "1", false, None),
        invoice("b", "1", false, Some(9)),
        invoice("c", "1", false, Some(3)),
    ];

    for request in [
        SearchRequest::new().sort_asc("due"),
        SearchRequest::new().sort_desc("due"),
    ] {
        let query = QueryCompiler::<Invoice>::new().compile(&request).unwrap();
        let sorted = query.filter(&invoices);
        assert_eq!(sorted.last().unwrap().customer, "a");
    }
}
