//! End-to-end scenarios from spec.md §8, run against the six-node sample
//! graph quoted there verbatim:
//!
//! ```text
//! A follows B, C follows B, C follows D, D follows B,
//! B follows F, F follows G, D follows G, E follows F,
//! B status cool @status_graph,
//! D status cool @status_graph,
//! G status cool @status_graph
//! ```

use graphforge_core::path::morphism::Via;
use graphforge_core::path::Path;
use graphforge_core::store::memory::MemoryStore;
use graphforge_core::store::{Delta, IgnoreOpts, QuadStore};
use graphforge_core::{ExecutionOptions, QueryDriver};
use graphforge_model::{Quad, Value};
use std::sync::Arc;

fn node(name: &str) -> Value {
    Value::iri(name)
}

fn sample_store() -> Arc<dyn QuadStore> {
    let store = MemoryStore::default();
    let status_graph = node("status_graph");
    let edges = [
        ("A", "B"),
        ("C", "B"),
        ("C", "D"),
        ("D", "B"),
        ("B", "F"),
        ("F", "G"),
        ("D", "G"),
        ("E", "F"),
    ];
    let mut deltas: Vec<Delta> = edges
        .iter()
        .map(|(s, o)| Delta::add(Quad::triple(node(s), node("follows"), node(o))))
        .collect();
    for s in ["B", "D", "G"] {
        deltas.push(Delta::add(Quad::new(
            node(s),
            node("status"),
            node("cool"),
            Some(status_graph.clone()),
        )));
    }
    store.apply_deltas(deltas, IgnoreOpts::default()).unwrap();
    Arc::new(store)
}

fn values_of(driver: QueryDriver) -> std::collections::BTreeSet<String> {
    driver
        .all_values()
        .unwrap()
        .into_iter()
        .map(|v| v.to_string())
        .collect()
}

fn set(names: &[&str]) -> std::collections::BTreeSet<String> {
    names.iter().map(|n| format!("<{n}>")).collect()
}

#[test]
fn out_follows_from_c_reaches_b_and_d() {
    let store = sample_store();
    let path = Path::start(Arc::clone(&store), vec![node("C")]).out(Via::single(node("follows")));
    let driver = QueryDriver::new(&path, ExecutionOptions::default());
    assert_eq!(values_of(driver), set(&["B", "D"]));
}

#[test]
fn nested_follow_of_out_out_from_c_reaches_b_f_g() {
    let store = sample_store();
    let inner = Path::start_all(Arc::clone(&store))
        .out(Via::single(node("follows")))
        .out(Via::single(node("follows")));
    let path = Path::start(Arc::clone(&store), vec![node("C")]).follow(inner);
    let driver = QueryDriver::new(&path, ExecutionOptions::default());
    assert_eq!(values_of(driver), set(&["B", "F", "G"]));
}

#[test]
fn has_status_cool_reaches_b_d_g() {
    let store = sample_store();
    let path = Path::start_all(Arc::clone(&store)).has(Via::single(node("status")), vec![node("cool")]);
    let driver = QueryDriver::new(&path, ExecutionOptions::default());
    assert_eq!(values_of(driver), set(&["B", "D", "G"]));
}

#[test]
fn back_tagged_who_isolates_d_as_the_only_follower_with_cool_status() {
    let store = sample_store();
    let path = Path::start(Arc::clone(&store), vec![node("B")])
        .r#in(Via::single(node("follows")))
        .tag(vec!["who".to_owned()])
        .out(Via::single(node("status")))
        .is(vec![node("cool")])
        .back("who");
    let driver = QueryDriver::new(&path, ExecutionOptions::default());
    assert_eq!(values_of(driver), set(&["D"]));
}

#[test]
fn count_of_cool_status_nodes_is_three() {
    let store = sample_store();
    let path = Path::start_all(Arc::clone(&store))
        .has(Via::single(node("status")), vec![node("cool")])
        .count();
    let driver = QueryDriver::new(&path, ExecutionOptions::default());
    let values = driver.all_values().unwrap();
    assert_eq!(values, vec![Value::int(3)]);
}

#[test]
fn labels_of_status_quads_reaches_status_graph() {
    let store = sample_store();
    let path = Path::start(Arc::clone(&store), vec![node("B")]).labels();
    let driver = QueryDriver::new(&path, ExecutionOptions::default());
    assert_eq!(values_of(driver), set(&["status_graph"]));
}

#[test]
fn filters_chains_a_regex_after_a_has_restriction() {
    use graphforge_core::path::morphism::FilterSpec;
    let store = sample_store();
    let path = Path::start_all(Arc::clone(&store))
        .has(Via::single(node("status")), vec![node("cool")])
        .filters(vec![FilterSpec::RegexWithRefs("B".to_owned())]);
    let driver = QueryDriver::new(&path, ExecutionOptions::default());
    assert_eq!(values_of(driver), set(&["B"]));
}

#[test]
fn except_of_everything_yields_empty() {
    let store = sample_store();
    let path = Path::start_all(Arc::clone(&store)).except(Path::start_all(Arc::clone(&store)));
    let driver = QueryDriver::new(&path, ExecutionOptions::default());
    assert!(values_of(driver).is_empty());
}

#[test]
fn follow_recursive_terminates_on_a_cyclic_graph() {
    // X -> Y -> Z -> X, a three-cycle with no sink, per spec.md §8's
    // boundary behavior: max_depth = 0 (unbounded) must still halt.
    let store = MemoryStore::default();
    let cyclic_edges = [("X", "Y"), ("Y", "Z"), ("Z", "X")];
    let deltas: Vec<Delta> = cyclic_edges
        .iter()
        .map(|(s, o)| Delta::add(Quad::triple(node(s), node("next"), node(o))))
        .collect();
    store.apply_deltas(deltas, IgnoreOpts::default()).unwrap();
    let store: Arc<dyn QuadStore> = Arc::new(store);
    let path =
        Path::start(Arc::clone(&store), vec![node("X")]).follow_recursive(Via::single(node("next")), 0);
    let driver = QueryDriver::new(&path, ExecutionOptions::default());
    assert_eq!(values_of(driver), set(&["Y", "Z", "X"]));
}

#[test]
fn save_optional_preserves_the_row_for_a_node_with_no_status() {
    let store = sample_store();
    let path = Path::start(Arc::clone(&store), vec![node("E")])
        .out(Via::single(node("follows")))
        .save_optional(Via::single(node("status")), "s");
    let driver = QueryDriver::new(&path, ExecutionOptions::default());
    let rows = driver.paths(false).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.result, graphforge_core::Handle::Node(store.value_of(&node("F"))));
    assert!(!row.tags.contains_key("s"));
}
