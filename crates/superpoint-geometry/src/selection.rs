use rand::Rng;

use crate::types::Quad;

/// Check that every coordinate of the quad lies in the normalized range [0, 1).
pub fn quad_in_unit_square(quad: &Quad) -> bool {
    quad.iter()
        .flatten()
        .all(|&v| (0.0..1.0).contains(&v))
}

/// Uniformly pick the index of one candidate accepted by `is_valid`.
///
/// Returns `None` when no candidate passes the predicate. The RNG is only
/// consumed when at least one candidate is valid.
pub fn select_valid<T, R: Rng + ?Sized>(
    candidates: &[T],
    is_valid: impl Fn(&T) -> bool,
    rng: &mut R,
) -> Option<usize> {
    let valid = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| is_valid(c))
        .map(|(i, _)| i)
        .collect::<Vec<_>>();

    log::debug!("{} of {} candidates are valid", valid.len(), candidates.len());

    if valid.is_empty() {
        return None;
    }

    Some(valid[rng.random_range(0..valid.len())])
}
