use super::*;
use attrql_query::{NamespaceResolver, QueryError};
use attrql_reader::{MemoryBackend, QueryReader, ReaderConfig, ReaderResult};
use std::cell::Cell;
use std::rc::Rc;

const FOAF: &str = "http://xmlns.com/foaf/0.1/";

fn person(n: usize) -> Term {
    Term::iri(format!("http://x/p{n}"))
}

fn foaf(local: &str) -> Term {
    Term::iri(format!("{FOAF}{local}"))
}

/// Counts round trips to the wrapped reader.
struct Counting {
    reader: QueryReader<MemoryBackend>,
    calls: Rc<Cell<usize>>,
}

impl Store for Counting {
    fn get_by(&self, params: &QueryParams) -> ReaderResult<Vec<ResultRow>> {
        self.calls.set(self.calls.get() + 1);
        self.reader.get_by(params)
    }
}

fn fixture(count: usize) -> (ResultCollection<ResultRow>, Rc<Cell<usize>>) {
    let mut backend = MemoryBackend::new();
    for n in 0..count {
        backend.insert(person(n), Term::rdf_type(), foaf("Person"));
        backend.insert(person(n), foaf("age"), (20 + n) as u32);
        backend.insert(person(n), foaf("name"), format!("P{n}"));
    }
    let calls = Rc::new(Cell::new(0));
    let store = Counting {
        reader: QueryReader::new(backend, ReaderConfig::default()),
        calls: Rc::clone(&calls),
    };
    let collection = ResultCollection::new(Arc::new(store), Arc::new(NamespaceResolver::standard()))
        .order_by_subject(false);
    (collection, calls)
}

fn subjects(rows: Vec<ResultRow>) -> Vec<Term> {
    rows.into_iter().map(|(s, _)| s).collect()
}

#[test]
fn chaining_leaves_the_original_untouched() {
    let (all, _) = fixture(3);
    let limited = all.limit(1).unwrap();
    let filtered = all.get_by([("foaf_name", "P1")]).unwrap();

    assert_eq!(all.params().paging, Paging::Unbounded);
    assert!(all.params().get_by.is_empty());
    assert_eq!(all.len().unwrap(), 3);
    assert_eq!(limited.len().unwrap(), 1);
    assert_eq!(subjects(filtered.to_vec().unwrap()), vec![person(1)]);
}

#[test]
fn execution_happens_once_per_collection() {
    let (all, calls) = fixture(3);
    assert!(!all.is_executed());
    assert_eq!(calls.get(), 0);

    all.len().unwrap();
    all.to_vec().unwrap();
    all.first().unwrap();
    assert!(all.is_executed());
    assert_eq!(calls.get(), 1);

    let copy = all.clone();
    assert!(!copy.is_executed());
    copy.len().unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn limit_and_offset_combine() {
    let (all, _) = fixture(5);
    let page = all.offset(1).unwrap().limit(2).unwrap();
    assert_eq!(
        page.params().paging,
        Paging::LimitOffset {
            limit: Some(2),
            offset: Some(1)
        }
    );
    assert_eq!(subjects(page.to_vec().unwrap()), vec![person(1), person(2)]);
}

#[test]
fn slicing_and_limits_do_not_mix() {
    let (all, _) = fixture(5);
    let Slice::Pending(window) = all.slice(1..3).unwrap() else {
        panic!("unexecuted collection should slice lazily");
    };
    assert!(matches!(window.limit(1), Err(CollectionError::IncompatiblePaging)));
    assert!(matches!(window.offset(1), Err(CollectionError::IncompatiblePaging)));

    let limited = all.limit(2).unwrap();
    assert!(matches!(limited.slice(0..1), Err(CollectionError::IncompatiblePaging)));
    assert!(matches!(limited.get(0), Err(CollectionError::IncompatiblePaging)));
}

#[test]
fn lazy_slices_compose() {
    let (all, calls) = fixture(6);
    let slice = all.slice(1..5).unwrap().slice(1..2).unwrap();
    assert_eq!(calls.get(), 0);
    assert_eq!(subjects(slice.into_vec().unwrap()), vec![person(2)]);
    assert_eq!(calls.get(), 1);
}

#[test]
fn executed_collections_slice_in_memory() {
    let (all, calls) = fixture(4);
    all.len().unwrap();
    let Slice::Ready(items) = all.slice(2..).unwrap() else {
        panic!("executed collection should slice its cache");
    };
    assert_eq!(subjects(items), vec![person(2), person(3)]);
    assert_eq!(calls.get(), 1);
}

#[test]
fn stepped_slices_materialize() {
    let (all, _) = fixture(6);
    let every_other = all.slice_step(1.., 2).unwrap();
    assert_eq!(subjects(every_other), vec![person(1), person(3), person(5)]);
    assert!(matches!(all.slice_step(.., 0), Err(CollectionError::ZeroStep)));
}

#[test]
fn indexing_fetches_a_single_row() {
    let (all, calls) = fixture(3);
    let (subject, _) = all.get(1).unwrap().unwrap();
    assert_eq!(subject, person(1));
    assert!(all.get(7).unwrap().is_none());
    assert!(!all.is_executed());
    assert_eq!(calls.get(), 2);

    all.len().unwrap();
    assert_eq!(all.get(2).unwrap().map(|(s, _)| s), Some(person(2)));
    assert_eq!(calls.get(), 3);
}

#[test]
fn first_and_one() {
    let (all, _) = fixture(2);
    assert_eq!(all.first().unwrap().map(|(s, _)| s), Some(person(0)));
    assert!(matches!(all.one(), Err(CollectionError::Ambiguous)));

    let single = all.get_by([("foaf_age", 21u32)]).unwrap();
    assert_eq!(single.one().unwrap().0, person(1));

    let none = all.get_by([("foaf_age", 99u32)]).unwrap();
    assert!(none.first().unwrap().is_none());
    assert!(matches!(none.one(), Err(CollectionError::Empty)));
    assert!(none.is_empty().unwrap());
}

#[test]
fn get_by_calls_accumulate_as_conjunctions() {
    let (all, _) = fixture(4);
    let ages = all.get_by([("foaf_age", vec![21u32, 22, 23])]).unwrap();
    let narrowed = ages.get_by([("foaf_name", "P2")]).unwrap();
    assert_eq!(narrowed.params().get_by.children().len(), 2);
    assert_eq!(subjects(narrowed.to_vec().unwrap()), vec![person(2)]);
}

#[test]
fn disjunctions_stay_grouped_when_anded() {
    let (all, _) = fixture(4);
    let resolver = NamespaceResolver::standard();
    let either = ConstraintTree::from_pairs(&resolver, [("foaf_name", "P0")]).unwrap()
        | ConstraintTree::from_pairs(&resolver, [("foaf_name", "P3")]).unwrap();
    let young = all.get_by([("foaf_age", vec![20u32, 21])]).unwrap();
    let both = young.get_by_tree(either);
    assert_eq!(both.params().get_by.connection(), Some(Connection::And));
    assert_eq!(subjects(both.to_vec().unwrap()), vec![person(0)]);
}

#[test]
fn unknown_attributes_are_rejected_before_execution() {
    let (all, calls) = fixture(1);
    let err = all.get_by([("nope", "x")]).unwrap_err();
    assert!(matches!(err, CollectionError::Query(QueryError::UnknownAttribute { .. })));
    assert!(all.order_by("foaf_nope__bad", false).is_err());
    assert_eq!(calls.get(), 0);
}

#[test]
fn filters_take_direct_attributes_only() {
    let (all, _) = fixture(4);
    let older = all.filter([("foaf_age", "%s >= 22")]).unwrap();
    assert_eq!(subjects(older.to_vec().unwrap()), vec![person(2), person(3)]);
    assert!(all.filter([("is_foaf_knows_of", "%s = 1")]).is_err());
}

#[test]
fn ordering_by_a_path_and_descending() {
    let (all, _) = fixture(3);
    let by_age = all.order_by("foaf_age", true).unwrap();
    assert_eq!(
        subjects(by_age.to_vec().unwrap()),
        vec![person(2), person(1), person(0)]
    );
    assert!(all.desc().params().desc);
}

#[test]
fn context_replaces_previous_contexts() {
    let (all, _) = fixture(1);
    let scoped = all.context(Term::iri("http://x/a")).context(Term::iri("http://x/b"));
    assert_eq!(scoped.params().contexts, vec![Term::iri("http://x/b")]);
}

#[test]
fn eager_loading_reaches_the_instance_maker() {
    let (all, _) = fixture(2);
    let names = all
        .eager(true)
        .with_instance_maker(|params: &QueryParams, (subject, data): &ResultRow| {
            assert!(params.full);
            assert!(data.inverse.is_none());
            let name = data.direct[&foaf("name")].keys().next().cloned();
            (subject.clone(), name)
        });
    assert_eq!(
        names.to_vec().unwrap(),
        vec![
            (person(0), Some(Term::literal("P0"))),
            (person(1), Some(Term::literal("P1"))),
        ]
    );
}

#[test]
fn indexed_items_see_the_collection_parameters() {
    let (all, _) = fixture(3);
    let pagings = all.with_instance_maker(|params: &QueryParams, (subject, _): &ResultRow| {
        (subject.clone(), params.paging)
    });

    let lazy = pagings.get(1).unwrap();
    assert!(!pagings.is_executed());
    assert_eq!(lazy, Some((person(1), Paging::Unbounded)));

    pagings.len().unwrap();
    assert_eq!(pagings.get(1).unwrap(), lazy);
    assert_eq!(pagings.iter().unwrap().nth(1), lazy);
}
