//! Type-consistency solver
//!
//! Encodes a hypothesis graph as a finite-domain constraint problem: one
//! variable per vertex whose domain is the set of types its incident edges
//! imply for it, and one constraint per connected vertex pair requiring that
//! at least one of the pair's edges agrees with both assigned types.
//!
//! The search is a depth-first backtracking search with forward checking,
//! bounded by a wall-clock deadline and a cap on enumerated assignments.
//! Each satisfying assignment is turned back into one edge per vertex pair
//! and the best-scoring selection wins.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};

use otl_core::ResolverConfig;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};

use crate::graph::RelationGraph;
use crate::score::solution_score;
use crate::DetectedRelation;

/// Result of one constraint search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveOutcome {
    /// Chosen edges, one per vertex pair, in pair order
    pub selection: Vec<EdgeIndex>,
    /// Score of the selection (0 when empty)
    pub score: f64,
    /// The deadline or the assignment cap cut the search short
    pub limit_reached: bool,
    /// Number of satisfying assignments enumerated
    pub assignments: usize,
}

impl SolveOutcome {
    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    /// Materialise the selection against the graph it was computed on
    pub fn relations<V: Clone>(&self, graph: &RelationGraph<V>) -> Vec<DetectedRelation<V>> {
        self.selection
            .iter()
            .filter_map(|&e| DetectedRelation::from_graph(graph, e))
            .collect()
    }
}

/// Bounded finite-domain search over vertex types
#[derive(Debug, Clone)]
pub struct TypeSolver {
    timeout: Duration,
    max_solutions: usize,
}

impl Default for TypeSolver {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

impl TypeSolver {
    pub fn new(timeout: Duration, max_solutions: usize) -> Self {
        Self {
            timeout,
            max_solutions: max_solutions.max(1),
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.solver_timeout(), config.max_solutions)
    }

    /// Find the best-scoring type-consistent selection of edges
    pub fn solve<V>(&self, graph: &RelationGraph<V>) -> SolveOutcome {
        let problem = Problem::encode(graph);
        if problem.variables.is_empty() {
            return SolveOutcome::default();
        }

        let mut search = Search {
            problem: &problem,
            order: problem.variable_order(),
            deadline: Instant::now() + self.timeout,
            max_solutions: self.max_solutions,
            solutions: Vec::new(),
            limit_reached: false,
        };
        let domains: Vec<Vec<usize>> = problem
            .variables
            .iter()
            .map(|v| v.preference.clone())
            .collect();
        let mut assignment = vec![None; problem.variables.len()];
        search.descend(0, &mut assignment, &domains);

        let Search {
            solutions,
            limit_reached,
            ..
        } = search;

        if limit_reached {
            tracing::debug!(
                assignments = solutions.len(),
                "constraint search stopped at its limit"
            );
        }

        let components = graph.component_count();
        let mut best = SolveOutcome {
            limit_reached,
            assignments: solutions.len(),
            ..Default::default()
        };

        for solution in &solutions {
            let selection = problem.reconstruct(solution);
            let score = solution_score(selection.iter().filter_map(|&e| graph.edge(e)), components);
            if !selection.is_empty() && (best.selection.is_empty() || score > best.score) {
                best.selection = selection;
                best.score = score;
            }
        }

        best
    }
}

// ============================================================================
// Problem encoding
// ============================================================================

struct Variable {
    vertex: NodeIndex,
    /// Sorted, deduplicated type names
    domain: Vec<String>,
    /// Domain indices, strongest supporting edge first
    preference: Vec<usize>,
}

impl Variable {
    fn index_of(&self, ty: &str) -> Option<usize> {
        self.domain.binary_search_by(|d| d.as_str().cmp(ty)).ok()
    }
}

struct Constraint {
    a: usize,
    b: usize,
    /// Allowed (value of a, value of b) tuples
    allowed: HashSet<(usize, usize)>,
}

impl Constraint {
    fn other(&self, var: usize) -> usize {
        if var == self.a {
            self.b
        } else {
            self.a
        }
    }

    fn allows(&self, var: usize, value: usize, other_value: usize) -> bool {
        if var == self.a {
            self.allowed.contains(&(value, other_value))
        } else {
            self.allowed.contains(&(other_value, value))
        }
    }
}

/// One edge of a pair, with the (variable, value) it requires at each end
struct Choice {
    edge: EdgeIndex,
    source: (usize, usize),
    target: (usize, usize),
}

struct Problem {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    by_variable: Vec<Vec<usize>>,
    /// Per vertex pair, edges in priority order
    pairs: Vec<Vec<Choice>>,
}

impl Problem {
    fn encode<V>(graph: &RelationGraph<V>) -> Self {
        let mut variables = Vec::new();
        let mut var_of: HashMap<NodeIndex, usize> = HashMap::new();

        for vertex in graph.vertex_ids() {
            let mut support: BTreeMap<String, f64> = BTreeMap::new();
            for (e, side) in graph.incident(vertex) {
                if let Some(edge) = graph.edge(e) {
                    let best = support
                        .entry(edge.type_at(side).to_string())
                        .or_insert(f64::NEG_INFINITY);
                    *best = best.max(edge.score);
                }
            }
            if support.is_empty() {
                continue;
            }

            let domain: Vec<String> = support.keys().cloned().collect();
            let mut preference: Vec<usize> = (0..domain.len()).collect();
            preference.sort_by(|&x, &y| {
                support[&domain[y]]
                    .total_cmp(&support[&domain[x]])
                    .then(x.cmp(&y))
            });

            var_of.insert(vertex, variables.len());
            variables.push(Variable {
                vertex,
                domain,
                preference,
            });
        }

        let mut constraints = Vec::new();
        let mut by_variable = vec![Vec::new(); variables.len()];
        let mut pairs = Vec::new();

        for ((a, b), edges) in graph.pairs() {
            let (Some(&va), Some(&vb)) = (var_of.get(&a), var_of.get(&b)) else {
                continue;
            };

            let mut allowed = HashSet::new();
            let mut choices = Vec::new();
            for e in edges {
                let (Some(edge), Some((s, t))) = (graph.edge(e), graph.endpoints(e)) else {
                    continue;
                };
                let (Some(&sv), Some(&tv)) = (var_of.get(&s), var_of.get(&t)) else {
                    continue;
                };
                let (Some(sval), Some(tval)) = (
                    variables[sv].index_of(&edge.domain_type),
                    variables[tv].index_of(&edge.range_type),
                ) else {
                    continue;
                };

                allowed.insert(if sv == va { (sval, tval) } else { (tval, sval) });
                choices.push(Choice {
                    edge: e,
                    source: (sv, sval),
                    target: (tv, tval),
                });
            }

            by_variable[va].push(constraints.len());
            by_variable[vb].push(constraints.len());
            constraints.push(Constraint {
                a: va,
                b: vb,
                allowed,
            });
            pairs.push(choices);
        }

        Self {
            variables,
            constraints,
            by_variable,
            pairs,
        }
    }

    /// Most constrained variables first, then vertex order
    fn variable_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.variables.len()).collect();
        order.sort_by(|&x, &y| {
            self.by_variable[y]
                .len()
                .cmp(&self.by_variable[x].len())
                .then(self.variables[x].vertex.cmp(&self.variables[y].vertex))
        });
        order
    }

    /// First edge of each pair, in priority order, agreeing with the assignment
    fn reconstruct(&self, assignment: &[usize]) -> Vec<EdgeIndex> {
        self.pairs
            .iter()
            .filter_map(|choices| {
                choices
                    .iter()
                    .find(|c| {
                        assignment[c.source.0] == c.source.1
                            && assignment[c.target.0] == c.target.1
                    })
                    .map(|c| c.edge)
            })
            .collect()
    }
}

// ============================================================================
// Backtracking search
// ============================================================================

struct Search<'p> {
    problem: &'p Problem,
    order: Vec<usize>,
    deadline: Instant,
    max_solutions: usize,
    solutions: Vec<Vec<usize>>,
    limit_reached: bool,
}

impl Search<'_> {
    fn descend(&mut self, depth: usize, assignment: &mut [Option<usize>], domains: &[Vec<usize>]) {
        if self.limit_reached {
            return;
        }
        if Instant::now() >= self.deadline {
            self.limit_reached = true;
            return;
        }

        if depth == self.order.len() {
            self.solutions
                .push(assignment.iter().map(|v| v.unwrap_or_default()).collect());
            if self.solutions.len() >= self.max_solutions {
                self.limit_reached = true;
            }
            return;
        }

        let var = self.order[depth];
        for &value in &domains[var] {
            let Some(narrowed) = self.forward_check(var, value, assignment, domains) else {
                continue;
            };
            assignment[var] = Some(value);
            self.descend(depth + 1, assignment, &narrowed);
            assignment[var] = None;
            if self.limit_reached {
                return;
            }
        }
    }

    /// Narrow the domains of unassigned neighbours; `None` on a wipe-out
    fn forward_check(
        &self,
        var: usize,
        value: usize,
        assignment: &[Option<usize>],
        domains: &[Vec<usize>],
    ) -> Option<Vec<Vec<usize>>> {
        let mut narrowed = domains.to_vec();
        narrowed[var] = vec![value];

        for &c in &self.problem.by_variable[var] {
            let constraint = &self.problem.constraints[c];
            let other = constraint.other(var);
            if assignment[other].is_some() {
                continue;
            }
            narrowed[other].retain(|&w| constraint.allows(var, value, w));
            if narrowed[other].is_empty() {
                return None;
            }
        }

        Some(narrowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{Edge, Hypothesis};

    fn edge(ordinal: u64, domain: &str, range: &str, score: f64) -> Edge {
        Hypothesis::new(format!("r{ordinal}"), format!("p{ordinal}"), domain, range)
            .with_score(score)
            .into_edge(ordinal)
    }

    fn ordinals<V>(graph: &RelationGraph<V>, outcome: &SolveOutcome) -> Vec<u64> {
        outcome
            .selection
            .iter()
            .filter_map(|&e| graph.edge(e))
            .map(|e| e.ordinal)
            .collect()
    }

    #[test]
    fn test_empty_graph() {
        let g: RelationGraph<&str> = RelationGraph::new();
        let outcome = TypeSolver::default().solve(&g);
        assert!(outcome.is_empty());
        assert!(!outcome.limit_reached);
    }

    #[test]
    fn test_consistent_chain() {
        let mut g = RelationGraph::new();
        g.add_edge("e1", "e2", edge(0, "A", "D", 0.7)).unwrap();
        g.add_edge("e2", "e3", edge(1, "D", "B", 0.7)).unwrap();
        g.add_edge("e1", "e3", edge(2, "A", "C", 0.5)).unwrap();
        g.add_edge("e1", "e3", edge(3, "A", "B", 0.6)).unwrap();

        let outcome = TypeSolver::default().solve(&g);
        assert_eq!(outcome.assignments, 1);
        assert_eq!(ordinals(&g, &outcome), vec![0, 3, 1]);
        assert!((outcome.score - (2.0 / 3.0 + 3.0)).abs() < 1e-9);

        let relations = outcome.relations(&g);
        assert_eq!(relations[1].left, "e1");
        assert_eq!(relations[1].right, "e3");
        assert_eq!(relations[1].edge.range_type, "B");
    }

    #[test]
    fn test_infeasible() {
        let mut g = RelationGraph::new();
        g.add_edge("a", "b", edge(0, "A", "B", 0.9)).unwrap();
        g.add_edge("b", "c", edge(1, "C", "D", 0.8)).unwrap();

        let outcome = TypeSolver::default().solve(&g);
        assert!(outcome.is_empty());
        assert_eq!(outcome.assignments, 0);
        assert!(!outcome.limit_reached);
    }

    #[test]
    fn test_orientation_respected() {
        let mut g = RelationGraph::new();
        // b -> a says b is a Person; a -> c says a is a Person
        g.add_edge("b", "a", edge(0, "Person", "City", 0.5)).unwrap();
        g.add_edge("a", "c", edge(1, "Person", "City", 0.5)).unwrap();
        assert!(TypeSolver::default().solve(&g).is_empty());

        g.add_edge("b", "a", edge(2, "Person", "Person", 0.3)).unwrap();
        let outcome = TypeSolver::default().solve(&g);
        assert_eq!(ordinals(&g, &outcome), vec![2, 1]);
    }

    #[test]
    fn test_best_assignment_chosen() {
        let mut g = RelationGraph::new();
        g.add_edge("a", "b", edge(0, "Person", "Person", 0.3)).unwrap();
        g.add_edge("a", "b", edge(1, "Person", "Organization", 0.8)).unwrap();

        let outcome = TypeSolver::default().solve(&g);
        assert_eq!(outcome.assignments, 2);
        assert_eq!(ordinals(&g, &outcome), vec![1]);
    }

    #[test]
    fn test_solution_cap_flags_limit() {
        let mut g = RelationGraph::new();
        g.add_edge("a", "b", edge(0, "Person", "Person", 0.3)).unwrap();
        g.add_edge("a", "b", edge(1, "Person", "Organization", 0.8)).unwrap();

        let outcome = TypeSolver::new(Duration::from_secs(5), 1).solve(&g);
        assert!(outcome.limit_reached);
        assert_eq!(outcome.assignments, 1);
        // the strongest value is tried first
        assert_eq!(ordinals(&g, &outcome), vec![1]);
    }

    #[test]
    fn test_zero_timeout_flags_limit() {
        let mut g = RelationGraph::new();
        g.add_edge("a", "b", edge(0, "A", "B", 0.3)).unwrap();

        let outcome = TypeSolver::new(Duration::ZERO, 10).solve(&g);
        assert!(outcome.limit_reached);
        assert!(outcome.is_empty());
    }
}
