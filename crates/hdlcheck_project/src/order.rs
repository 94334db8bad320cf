//! Dependency-ordered build scheduling.

use hdlcheck_common::{CanonPath, Identifier};
use hdlcheck_database::Database;
use hdlcheck_diagnostics::Diagnostic;
use log::{info, warn};
use petgraph::graph::DiGraph;
use std::collections::{HashMap, HashSet};

/// Upper bound on relaxation passes; a well-formed project converges far
/// earlier, and a cyclic one must not spin.
pub const MAX_BUILD_STEPS: usize = 20;

/// The computed build schedule.
#[derive(Debug, Default)]
pub struct CompileOrder {
    /// Every project path, dependencies before dependents where possible.
    pub order: Vec<CanonPath>,
    /// Advisory diagnostics (circular dependencies).
    pub advisories: Vec<Diagnostic>,
    /// Human-readable notes about paths whose dependencies never resolved.
    pub missing: Vec<String>,
}

/// Computes a build order by repeated relaxation.
///
/// A source is emitted once every unit it depends on has been emitted.
/// Ties within a pass break by path order, so the schedule is stable
/// across runs. Sources whose dependencies never materialize (missing
/// units, cycles) are appended last; cycles additionally produce one
/// advisory warning each.
pub fn compile_order(database: &mut Database, builtins: &[Identifier]) -> CompileOrder {
    let paths = database.paths();

    // (library, unit) pairs each path provides and needs, in effective
    // (case-folded) form.
    let mut provides: HashMap<CanonPath, HashSet<(String, String)>> = HashMap::new();
    let mut needs: HashMap<CanonPath, HashSet<(String, String)>> = HashMap::new();
    let mut resolvable: HashSet<(String, String)> = HashSet::new();

    for path in &paths {
        let library = match database.library_of(path) {
            Some(library) => library.clone(),
            None => continue,
        };
        let units: HashSet<(String, String)> = database
            .design_units_of(path)
            .iter()
            .map(|unit| (library.effective_name(), unit.name.effective_name()))
            .collect();
        resolvable.extend(units.iter().cloned());
        provides.insert(path.clone(), units);

        let deps: HashSet<(String, String)> = database
            .resolved_dependencies_of(path, builtins)
            .iter()
            .map(|dep| {
                let library = dep.library_or(&library);
                (library.effective_name(), dep.name.effective_name())
            })
            .collect();
        needs.insert(path.clone(), deps);
    }

    let mut emitted_units: HashSet<(String, String)> = HashSet::new();
    let mut order: Vec<CanonPath> = Vec::new();
    let mut pending: Vec<CanonPath> = paths.clone();

    for step in 0..MAX_BUILD_STEPS {
        let mut next_pending = Vec::new();
        let mut emitted_this_step = false;

        for path in pending {
            let ready = needs
                .get(&path)
                .map(|deps| deps.is_subset(&emitted_units))
                .unwrap_or(true);
            if ready {
                if let Some(units) = provides.get(&path) {
                    emitted_units.extend(units.iter().cloned());
                }
                order.push(path);
                emitted_this_step = true;
            } else {
                next_pending.push(path);
            }
        }

        pending = next_pending;
        if pending.is_empty() {
            break;
        }
        if !emitted_this_step {
            info!("build order settled after {} steps, {} blocked", step + 1, pending.len());
            break;
        }
    }

    let mut advisories = Vec::new();
    let mut missing = Vec::new();
    if !pending.is_empty() {
        advisories = cycle_advisories(&pending, &needs, &provides);
        for path in &pending {
            let unresolved: Vec<String> = needs
                .get(path)
                .map(|deps| {
                    deps.iter()
                        .filter(|dep| !resolvable.contains(*dep))
                        .map(|(library, unit)| format!("{library}.{unit}"))
                        .collect()
                })
                .unwrap_or_default();
            if !unresolved.is_empty() {
                warn!(
                    "'{}' has missing dependencies: {}",
                    path,
                    unresolved.join(", ")
                );
                missing.push(format!(
                    "'{}' has missing dependencies: {}",
                    path,
                    unresolved.join(", ")
                ));
            }
        }
        // Best effort: blocked sources still get compiled, last.
        order.extend(pending);
    }

    CompileOrder {
        order,
        advisories,
        missing,
    }
}

/// One advisory warning per dependency cycle among the blocked paths.
fn cycle_advisories(
    blocked: &[CanonPath],
    needs: &HashMap<CanonPath, HashSet<(String, String)>>,
    provides: &HashMap<CanonPath, HashSet<(String, String)>>,
) -> Vec<Diagnostic> {
    let mut graph: DiGraph<CanonPath, ()> = DiGraph::new();
    let mut nodes = HashMap::new();
    for path in blocked {
        nodes.insert(path.clone(), graph.add_node(path.clone()));
    }
    for path in blocked {
        let deps = match needs.get(path) {
            Some(deps) => deps,
            None => continue,
        };
        for other in blocked {
            if other == path {
                continue;
            }
            let offers = match provides.get(other) {
                Some(offers) => offers,
                None => continue,
            };
            if !deps.is_disjoint(offers) {
                graph.add_edge(nodes[path], nodes[other], ());
            }
        }
    }

    petgraph::algo::tarjan_scc(&graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut members: Vec<String> = component
                .iter()
                .map(|&node| graph[node].to_string())
                .collect();
            members.sort();
            warn!("circular dependency: {}", members.join(" -> "));
            Diagnostic::warning(format!(
                "circular dependency detected: {}",
                members.join(" -> ")
            ))
            .with_path(members[0].clone())
        })
        .collect()
}
