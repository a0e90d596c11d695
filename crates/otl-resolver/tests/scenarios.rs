//! End-to-end resolution scenarios

use std::collections::BTreeSet;

use otl_resolver::{Builder, DetectedRelation, Hypothesis, NullSink};

fn hyp(relation: &str, pattern: &str, domain: &str, range: &str, score: f64) -> Hypothesis {
    Hypothesis::new(relation, pattern, domain, range)
        .with_score(score)
        .with_entropy(0.5)
        .with_count(10)
}

fn summary(relations: &[DetectedRelation<&'static str>]) -> BTreeSet<(&'static str, &'static str, String)> {
    relations
        .iter()
        .map(|r| (r.left, r.right, r.edge.relation.clone()))
        .collect()
}

// =============================================================================
// Transitive chain with a competing direct hypothesis
// =============================================================================

#[test]
fn test_direct_edge_preferred_over_conflicting_duplicate() {
    let engine = Builder::new()
        .add("E1", "E2", hyp("r_ad", "p1", "A", "D", 0.7))
        .add("E2", "E3", hyp("r_db", "p2", "D", "B", 0.7))
        .add("E1", "E3", hyp("r_ac", "p3", "A", "C", 0.5))
        .add("E3", "E4", hyp("r_bc", "p4", "B", "C", 0.8))
        .add("E1", "E3", hyp("r_ab", "p5", "A", "B", 0.6))
        .build();

    let relations = engine.solve(&mut NullSink);
    assert_eq!(relations.len(), 4);

    let ordinals: BTreeSet<u64> = relations.iter().map(|r| r.edge.ordinal).collect();
    assert_eq!(ordinals, BTreeSet::from([0, 1, 3, 4]));

    let direct = relations
        .iter()
        .find(|r| r.left == "E1" && r.right == "E3")
        .unwrap();
    assert_eq!(direct.edge.ordinal, 4);
    assert_eq!(direct.edge.relation, "r_ab");

    assert!(relations
        .iter()
        .any(|r| r.left == "E3" && r.right == "E4" && r.edge.relation == "r_bc"));
}

#[test]
fn test_isolated_pair_always_included() {
    let engine = Builder::new()
        .add("E1", "E2", hyp("r1", "p1", "A", "B", 0.9))
        .add("E2", "E3", hyp("r2", "p2", "C", "D", 0.8))
        .add("E5", "E6", hyp("r3", "p3", "B", "C", 0.1))
        .build();

    let relations = engine.solve(&mut NullSink);
    assert_eq!(
        summary(&relations),
        BTreeSet::from([("E1", "E2", "r1".to_string()), ("E5", "E6", "r3".to_string())])
    );
}

// =============================================================================
// High-confidence relation among many distractors
// =============================================================================

#[test]
fn test_high_confidence_edge_survives_distractors() {
    let range_types = ["Organization", "City", "Person", "Date"];

    let mut builder = Builder::new()
        .add("Alice", "Bob", hyp("spouse", "married to", "Person", "Person", 0.80))
        .add("Alice", "Alice", hyp("spouse", "herself", "Person", "Person", 0.99))
        .add("Alice", "Hawaii", hyp("locatedIn", "based in", "Organization", "City", 0.10));

    for i in 0..24 {
        let range = range_types[i % range_types.len()];
        builder = builder.add(
            "Alice",
            "Bob",
            hyp(
                &format!("distractor{i}"),
                &format!("pattern {i}"),
                "Person",
                range,
                0.05 + i as f64 * 0.008,
            ),
        );
    }

    builder = builder
        .add("Acme", "Springfield", hyp("headquarters", "headquartered in", "Organization", "City", 0.6))
        .add("Acme", "Springfield", hyp("birthPlace", "from", "Person", "City", 0.2))
        .add("Carol", "Initech", hyp("employer", "works at", "Person", "Organization", 0.7))
        .add("Initech", "Carol", hyp("founder", "founded by", "Organization", "Person", 0.3));

    assert_eq!(builder.rejected(), 1);
    let engine = builder.build();

    let mut lines: Vec<String> = Vec::new();
    let relations = engine.solve(&mut lines);

    assert_eq!(relations.len(), 3);
    assert_eq!(
        summary(&relations),
        BTreeSet::from([
            ("Alice", "Bob", "spouse".to_string()),
            ("Acme", "Springfield", "headquarters".to_string()),
            ("Carol", "Initech", "employer".to_string()),
        ])
    );
    assert!(relations.iter().all(|r| r.left != r.right));
    assert!(lines.iter().any(|l| l == "split into 3 component(s)"));
}

// =============================================================================
// Determinism and diagnostics
// =============================================================================

fn chain_engine() -> otl_resolver::Engine<&'static str> {
    Builder::new()
        .add("a", "b", hyp("r1", "p1", "Person", "Organization", 0.6))
        .add("a", "b", hyp("r2", "p2", "Person", "City", 0.4))
        .add("b", "c", hyp("r3", "p3", "Organization", "City", 0.5))
        .add("c", "d", hyp("r4", "p4", "Country", "City", 0.3))
        .add("d", "a", hyp("r5", "p5", "City", "Person", 0.5))
        .build()
}

#[test]
fn test_repeated_solves_agree() {
    let first = chain_engine().solve(&mut NullSink);
    let second = chain_engine().solve(&mut NullSink);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_diagnostics_do_not_change_result() {
    let mut lines: Vec<String> = Vec::new();
    let with_lines = chain_engine().solve(&mut lines);
    let silent = chain_engine().solve(&mut NullSink);
    assert_eq!(with_lines, silent);
    assert!(lines.iter().any(|l| l.starts_with("pruned")));
    assert!(lines.iter().any(|l| l.starts_with("depth 0")));
}

#[test]
fn test_subproblems_can_be_solved_on_threads() {
    let engine = Builder::new()
        .add(1u32, 2u32, hyp("r1", "p1", "A", "B", 0.5))
        .add(3u32, 4u32, hyp("r2", "p2", "C", "D", 0.5))
        .add(5u32, 6u32, hyp("r3", "p3", "E", "F", 0.5))
        .build();

    let sequential = engine.solve(&mut NullSink);

    let handles: Vec<_> = engine
        .subproblems(&mut NullSink)
        .into_iter()
        .map(|sub| std::thread::spawn(move || sub.solve(&mut NullSink)))
        .collect();
    let parallel: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    assert_eq!(sequential, parallel);
}

#[test]
fn test_relations_serialize() {
    let engine = Builder::new()
        .add("Marie", "Warsaw", hyp("birthPlace", "born in", "Person", "City", 0.6))
        .build();
    let relations = engine.solve(&mut NullSink);
    let json = serde_json::to_value(&relations).unwrap();
    assert_eq!(json[0]["left"], "Marie");
    assert_eq!(json[0]["edge"]["relation"], "birthPlace");
    assert_eq!(json[0]["edge"]["domain_type"], "Person");
}
