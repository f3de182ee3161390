use attrql_query::{AttributeEdge, Direction, Query, Term, Variable};
use attrql_reader::{
    Backend, MemoryBackend, Nested, QueryReader, ReaderConfig, ReaderError, Row, Table,
};

fn iri(local: &str) -> Term {
    Term::iri(format!("http://x/{local}"))
}

fn fixture() -> MemoryBackend {
    let mut b = MemoryBackend::new();
    b.insert(iri("ann"), iri("name"), "Ann");
    b.insert(iri("ann"), iri("knows"), iri("bo"));
    b.insert(iri("ann"), Term::rdf_type(), iri("Person"));
    b.insert_in(iri("bo"), Term::rdf_type(), iri("Person"), iri("g1"));
    b.insert_in(iri("bo"), Term::rdf_type(), iri("Agent"), iri("g1"));
    b.insert_in(iri("bo"), iri("name"), "Bo", iri("g1"));
    b
}

#[test]
fn get_reports_value_types_per_context() {
    let reader = QueryReader::new(fixture(), ReaderConfig::default());
    let values = reader
        .get(&iri("ann"), &iri("knows"), Direction::Direct, &[])
        .unwrap();
    let contexts = &values[&iri("bo")];
    let mut types = contexts[&Some(iri("g1"))].clone();
    types.sort();
    assert_eq!(types, vec![iri("Agent"), iri("Person")]);
}

#[test]
fn get_follows_inverse_attributes() {
    let reader = QueryReader::new(fixture(), ReaderConfig::default());
    let values = reader
        .get(&iri("bo"), &iri("knows"), Direction::Inverse, &[])
        .unwrap();
    assert_eq!(values.keys().cloned().collect::<Vec<_>>(), vec![iri("ann")]);
}

#[test]
fn load_groups_by_attribute() {
    let reader = QueryReader::new(fixture(), ReaderConfig::default());
    let attributes = reader.load(&iri("ann"), Direction::Direct, &[]).unwrap();
    assert!(attributes[&iri("name")].contains_key(&Term::literal("Ann")));
    assert!(attributes[&Term::rdf_type()].contains_key(&iri("Person")));
}

#[test]
fn load_within_a_context_sees_only_that_graph() {
    let reader = QueryReader::new(fixture(), ReaderConfig::default());
    let attributes = reader
        .load(&iri("bo"), Direction::Direct, &[iri("g1")])
        .unwrap();
    assert!(attributes[&iri("name")].contains_key(&Term::literal("Bo")));
    let scoped = reader
        .load(&iri("ann"), Direction::Direct, &[iri("g1")])
        .unwrap();
    assert!(scoped.is_empty());
}

#[test]
fn presence_and_concepts() {
    let reader = QueryReader::new(fixture(), ReaderConfig::default());
    assert!(reader.is_present(&iri("ann"), &[]).unwrap());
    assert!(!reader.is_present(&iri("zed"), &[]).unwrap());
    assert!(!reader.is_present(&iri("ann"), &[iri("g1")]).unwrap());

    let mut concepts = reader.concept(&iri("bo")).unwrap();
    concepts.sort();
    assert_eq!(concepts, vec![iri("Agent"), iri("Person")]);
}

#[test]
fn instances_by_attribute_requires_every_attribute() {
    let reader = QueryReader::new(fixture(), ReaderConfig::default());
    let attributes = vec![
        AttributeEdge::direct("http://x/name"),
        AttributeEdge::direct("http://x/knows"),
    ];
    let found = reader.instances_by_attribute(&attributes, None).unwrap();
    assert_eq!(found.keys().cloned().collect::<Vec<_>>(), vec![iri("ann")]);
    assert_eq!(found[&iri("ann")][&None::<Term>], vec![iri("Person")]);

    let by_name = reader
        .instances_by_attribute(&attributes[..1], Some(&iri("g1")))
        .unwrap();
    assert_eq!(by_name.keys().cloned().collect::<Vec<_>>(), vec![iri("bo")]);
}

#[test]
fn raw_execute_passes_through_the_backend() {
    let reader = QueryReader::new(fixture(), ReaderConfig::default());
    let query = Query::select(["s"])
        .where_triple(Variable::new("s"), iri("name"), Variable::new("n"))
        .order_by(Variable::new("n"), false);
    let output = reader.execute(&query).unwrap();
    let table = reader.backend().to_table(output).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table[0]["s"], iri("ann"));
}

#[test]
fn backend_errors_surface_unchanged() {
    let reader = QueryReader::new(fixture(), ReaderConfig::default());
    let query = Query::select(["s"])
        .where_triple(Variable::new("s"), iri("name"), Variable::new("n"))
        .filter("bound(?n)");
    let err = reader.execute(&query).unwrap_err();
    match err {
        ReaderError::Backend(inner) => {
            assert!(inner.to_string().contains("unsupported filter expression"))
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

fn incomplete_table() -> Table {
    let mut row = Row::new();
    row.insert("x".to_string(), Term::literal("1"));
    vec![row]
}

#[test]
fn strict_conversion_reports_failures() {
    let reader = QueryReader::new(MemoryBackend::new(), ReaderConfig::default());
    let err = reader.convert(&incomplete_table(), &["c"]).unwrap_err();
    assert!(matches!(err, ReaderError::Convert(_)));
}

#[test]
fn lenient_conversion_degrades_to_empty() {
    let reader = QueryReader::new(MemoryBackend::new(), ReaderConfig::default().lenient(true));
    assert_eq!(
        reader.convert(&incomplete_table(), &["c"]).unwrap(),
        Nested::Values(Vec::new())
    );
    assert_eq!(
        reader.convert(&incomplete_table(), &[]).unwrap(),
        Nested::Values(Vec::new())
    );
}
