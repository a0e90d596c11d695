//! Search controller
//!
//! Iterative deepening over "which hypotheses to drop". Depth `i` tries
//! every removal set of `i` distinct edge signatures; past the removal
//! depth, a single attempt applies the adaptive statistical cutoff instead.
//! A success at a removal depth lets one more depth compete on score;
//! a success past the removal depths ends the search at once.

use std::hash::Hash;

use otl_core::ResolverConfig;
use petgraph::stable_graph::EdgeIndex;

use crate::cutoff::apply_adaptive_cutoff;
use crate::diagnostics::DiagnosticSink;
use crate::graph::{EdgeSignature, RelationGraph};
use crate::prune::{collapse_parallel, prune_dead_ends};
use crate::solver::TypeSolver;

/// Best selection found for one component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    /// Chosen edges, indices valid in the searched component graph
    pub selection: Vec<EdgeIndex>,
    pub score: f64,
    /// Depth at which the selection was found
    pub depth: Option<usize>,
    /// Solver invocations
    pub attempts: usize,
}

/// Removal sets over a universe of distinct edge signatures.
///
/// Small universes get every subset; large ones only the empty set,
/// singletons and pairs.
#[derive(Debug, Clone, Copy)]
pub struct RemovalCandidates {
    universe: usize,
    exhaustive: bool,
}

impl RemovalCandidates {
    pub fn new(universe: usize, powerset_limit: usize) -> Self {
        Self {
            universe,
            exhaustive: universe < powerset_limit,
        }
    }

    pub fn is_exhaustive(&self) -> bool {
        self.exhaustive
    }

    /// All removal sets of exactly `size` signatures
    pub fn of_size(&self, size: usize) -> Vec<Vec<usize>> {
        if !self.exhaustive && size > 2 {
            return Vec::new();
        }
        combinations(self.universe, size)
    }
}

fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k > n {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut current: Vec<usize> = (0..k).collect();
    loop {
        out.push(current.clone());

        let mut i = k;
        while i > 0 && current[i - 1] == n - k + i - 1 {
            i -= 1;
        }
        if i == 0 {
            return out;
        }
        current[i - 1] += 1;
        for j in i..k {
            current[j] = current[j - 1] + 1;
        }
    }
}

/// Drives the type-consistency solver over candidate removals
#[derive(Debug, Clone)]
pub struct SearchController {
    config: ResolverConfig,
    solver: TypeSolver,
}

impl SearchController {
    pub fn new(config: ResolverConfig) -> Self {
        let solver = TypeSolver::from_config(&config);
        Self { config, solver }
    }

    /// Search one connected component
    pub fn search<V: Clone + Eq + Hash>(
        &self,
        component: &RelationGraph<V>,
        sink: &mut dyn DiagnosticSink,
    ) -> SearchResult {
        let mut base = component.clone();
        let collapsed = collapse_parallel(&mut base);
        if collapsed > 0 {
            sink.line(&format!(
                "collapsed {collapsed} parallel hypotheses between two mentions"
            ));
        }

        let universe = base.distinct_signatures();
        let candidates = RemovalCandidates::new(universe.len(), self.config.powerset_limit);
        let max_depth = base.vertex_count().min(self.config.max_depth);
        sink.line(&format!(
            "searching {} distinct hypotheses ({}), up to depth {}",
            universe.len(),
            if candidates.is_exhaustive() {
                "all subsets"
            } else {
                "singletons and pairs"
            },
            max_depth.saturating_sub(1)
        ));

        let mut best = SearchResult::default();
        let mut previous_improved = false;

        'deepen: for depth in 0..max_depth {
            let removing = depth <= self.config.removal_depth;
            let trials = if removing {
                candidates.of_size(depth)
            } else {
                vec![Vec::new()]
            };
            // past the removal depths the cutoff applies only while nothing has been found
            let cutting = !removing && best.selection.is_empty();
            sink.line(&format!("depth {depth}: {} attempt(s)", trials.len()));

            let mut improved = false;
            let mut limit_hits = 0;

            for removal in trials {
                let mut trial = base.clone();
                if removing {
                    let signatures: Vec<&EdgeSignature> =
                        removal.iter().map(|&i| &universe[i]).collect();
                    trial.remove_signatures(&signatures);
                } else if cutting {
                    let dropped = apply_adaptive_cutoff(&mut trial, depth, &self.config);
                    let pruned = prune_dead_ends(&mut trial);
                    sink.line(&format!(
                        "depth {depth}: adaptive cutoff dropped {dropped}, pruning dropped {pruned}"
                    ));
                }
                trial.remove_orphans();

                let outcome = self.solver.solve(&trial);
                best.attempts += 1;
                if outcome.limit_reached {
                    limit_hits += 1;
                }

                if !outcome.is_empty() && (best.selection.is_empty() || outcome.score > best.score)
                {
                    sink.line(&format!(
                        "depth {depth}: score {:.3} with {} relation(s)",
                        outcome.score,
                        outcome.selection.len()
                    ));
                    best.selection = outcome.selection;
                    best.score = outcome.score;
                    best.depth = Some(depth);
                    improved = true;
                }

                if limit_hits > self.config.max_limit_hits {
                    sink.line(&format!(
                        "depth {depth}: solver limit reached {limit_hits} times, stopping"
                    ));
                    break 'deepen;
                }
            }

            // a success below the cutoff depths still lets the next depth compete
            if previous_improved || (improved && depth > self.config.removal_depth) {
                break;
            }
            previous_improved = improved;
        }

        tracing::debug!(
            attempts = best.attempts,
            depth = ?best.depth,
            relations = best.selection.len(),
            "component search finished"
        );
        best
    }
}
