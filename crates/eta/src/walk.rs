//! Post-processing helpers for walks returned by the search.

/// Consecutive node pairs of `walk`.
pub fn walk_edges<N>(walk: &[N]) -> impl Iterator<Item = (&N, &N)> + '_ {
    walk.windows(2).map(|w| (&w[0], &w[1]))
}

/// Sum of `score` over the walk's edges; `None` if any edge is unknown.
pub fn walk_score<N, F>(walk: &[N], score: F) -> Option<f64>
where
    F: Fn(&N, &N) -> Option<f64>,
{
    walk_edges(walk).map(|(u, v)| score(u, v)).sum()
}

/// First node repeated at the end (at least a triangle).
pub fn is_closed<N: PartialEq>(walk: &[N]) -> bool {
    walk.len() >= 4 && walk.first() == walk.last()
}

/// Rotate `walk` into a circuit that starts and ends at `source`.
///
/// Open walks are closed by returning from the last node to the first, so
/// the caller must know that edge exists (or route it, e.g. via projection).
/// Returns `None` if `source` is not on the walk.
pub fn rotate_to_source<N: Clone + PartialEq>(walk: &[N], source: &N) -> Option<Vec<N>> {
    let cycle = if is_closed(walk) {
        &walk[..walk.len() - 1]
    } else {
        walk
    };
    let n = cycle.iter().position(|x| x == source)?;
    let mut out = Vec::with_capacity(cycle.len() + 1);
    out.extend_from_slice(&cycle[n..]);
    out.extend_from_slice(&cycle[..n]);
    out.push(source.clone());
    Some(out)
}
