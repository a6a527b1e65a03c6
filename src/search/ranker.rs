//! Global relevance ranking across resource types.

use std::cmp::Ordering;

use crate::types::Hit;

/// Sort hits from every partition into one globally ranked list.
///
/// Ordering is score descending, then resource-type priority descending,
/// then verified before unverified, then most recently updated first. The
/// comparator is total, so the sort is stable with respect to input order
/// only when all four keys tie.
pub fn sort_by_global_relevance(hits: &mut [Hit]) {
    hits.sort_by(compare_hits);
}

fn compare_hits(a: &Hit, b: &Hit) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.resource_type.priority().cmp(&a.resource_type.priority()))
        .then_with(|| b.verified.cmp(&a.verified))
        .then_with(|| b.updated_at.cmp(&a.updated_at))
}
