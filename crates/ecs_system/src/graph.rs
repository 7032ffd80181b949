//! Kahn's algorithm for topological sorting, with a deterministic tie-break.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// The graph contained at least one cycle.
///
/// `unsorted` lists the nodes that could not be placed: every cycle member,
/// plus anything that depends on one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    /// Indices of the nodes left over after sorting.
    pub unsorted: Vec<usize>,
}

/// Topologically sorts nodes `0..keys.len()`.
///
/// `edges` are `(before, after)` pairs of node indices. Among the nodes whose
/// prerequisites are all placed, the one with the smallest key goes first, so
/// the result is a pure function of the inputs.
///
/// # Errors
///
/// Returns [`CycleError`] if the edges contain a cycle.
pub fn topological_sort<K: Ord + Copy>(
    keys: &[K],
    edges: impl IntoIterator<Item = (usize, usize)>,
) -> Result<Vec<usize>, CycleError> {
    let node_count = keys.len();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut in_degree = vec![0usize; node_count];

    // 1. Build adjacency lists and in-degree counts.
    for (before, after) in edges {
        dependents[before].push(after);
        in_degree[after] += 1;
    }

    // 2. Seed the ready set with every root.
    let mut ready: BinaryHeap<Reverse<(K, usize)>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(node, _)| Reverse((keys[node], node)))
        .collect();

    // 3. Repeatedly place the smallest ready node.
    let mut sorted = Vec::with_capacity(node_count);
    while let Some(Reverse((_, node))) = ready.pop() {
        sorted.push(node);
        for &next in &dependents[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse((keys[next], next)));
            }
        }
    }

    // 4. Anything left still has an unsatisfied edge.
    if sorted.len() == node_count {
        Ok(sorted)
    } else {
        let unsorted = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(node, _)| node)
            .collect();
        Err(CycleError { unsorted })
    }
}
