//! The minimal, N-queries and subquery fetches agree on which subjects come
//! back, and in which order, for the same constraints, ordering and paging.

use attrql_query::{AttributeEdge, AttributePath, ConstraintLeaf, ConstraintTree, ConstraintValue, Term};
use attrql_reader::{
    MemoryBackend, OrderBy, Paging, QueryParams, QueryReader, ReaderConfig, ResultRow, Store,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Person {
    age: u32,
    /// 0: untyped, 1: typed in the default graph, 2: typed in a named graph,
    /// 3: two types in the default graph.
    typing: u8,
}

fn person() -> impl Strategy<Value = Person> {
    (0u32..6, 0u8..4).prop_map(|(age, typing)| Person { age, typing })
}

fn order() -> impl Strategy<Value = Option<OrderBy>> {
    prop_oneof![
        Just(None),
        Just(Some(OrderBy::Subject)),
        Just(Some(OrderBy::Path(AttributePath::single(age())))),
    ]
}

fn paging() -> impl Strategy<Value = Paging> {
    prop_oneof![
        Just(Paging::Unbounded),
        (0usize..4, 0usize..6).prop_map(|(low, len)| Paging::Window {
            low,
            high: Some(low + len),
        }),
        (proptest::option::of(0usize..5), proptest::option::of(0usize..3))
            .prop_map(|(limit, offset)| Paging::LimitOffset { limit, offset }),
    ]
}

fn age() -> AttributeEdge {
    AttributeEdge::direct("http://x/age")
}

fn subject(i: usize) -> Term {
    Term::iri(format!("http://x/p{i}"))
}

fn backend(people: &[Person]) -> MemoryBackend {
    let mut b = MemoryBackend::new();
    for (i, p) in people.iter().enumerate() {
        b.insert(subject(i), Term::iri("http://x/age"), p.age);
        match p.typing {
            1 => {
                b.insert(subject(i), Term::rdf_type(), Term::iri("http://x/Person"));
            }
            2 => {
                b.insert_in(
                    subject(i),
                    Term::rdf_type(),
                    Term::iri("http://x/Person"),
                    Term::iri("http://x/g"),
                );
            }
            3 => {
                b.insert(subject(i), Term::rdf_type(), Term::iri("http://x/Person"));
                b.insert(subject(i), Term::rdf_type(), Term::iri("http://x/Agent"));
            }
            _ => {}
        }
    }
    b
}

fn constraints() -> impl Strategy<Value = ConstraintTree> {
    prop_oneof![
        Just(ConstraintTree::new()),
        prop::collection::vec(0u32..6, 1..4).prop_map(|ages| {
            ConstraintTree::from(ConstraintLeaf::new(age(), ConstraintValue::any_of(ages)))
        }),
    ]
}

proptest! {
    #[test]
    fn every_strategy_returns_the_same_subjects(
        people in prop::collection::vec(person(), 1..8),
        get_by in constraints(),
        order in order(),
        desc in any::<bool>(),
        paging in paging(),
    ) {
        let plain = QueryReader::new(backend(&people), ReaderConfig::default());
        let nested = QueryReader::new(backend(&people), ReaderConfig::default().with_subqueries(true));
        let minimal = QueryParams {
            get_by,
            order,
            desc,
            paging,
            ..QueryParams::default()
        };
        let eager = QueryParams { full: true, ..minimal.clone() };

        let subjects = |rows: Vec<ResultRow>| rows.into_iter().map(|(s, _)| s).collect::<Vec<Term>>();
        let a = subjects(plain.get_by(&minimal).unwrap());
        let b = subjects(plain.get_by(&eager).unwrap());
        let c = subjects(nested.get_by(&eager).unwrap());
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
    }
}
