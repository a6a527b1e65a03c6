//! Facet merging across resource-type partitions.

use crate::types::{FacetBucket, Facets};

/// Merge the facets of every partition into one global set.
///
/// Buckets with the same key have their counts summed; unseen keys are
/// appended. Every dimension ends up sorted by count descending, with key
/// order as the tiebreak so equal counts render deterministically.
pub fn merge_facets<'a, I>(per_type: I) -> Facets
where
    I: IntoIterator<Item = &'a Facets>,
{
    let mut merged = Facets::default();
    for facets in per_type {
        for ((_, target), (_, source)) in merged.dimensions_mut().into_iter().zip(facets.dimensions())
        {
            merge_buckets(target, source);
        }
    }
    for (_, dimension) in merged.dimensions_mut() {
        dimension.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    }
    merged
}

fn merge_buckets(target: &mut Vec<FacetBucket>, source: &[FacetBucket]) {
    for bucket in source {
        match target.iter_mut().find(|t| t.key == bucket.key) {
            Some(existing) => {
                existing.count += bucket.count;
                if existing.label.is_none() {
                    existing.label = bucket.label.clone();
                }
                existing.selected |= bucket.selected;
            }
            None => target.push(bucket.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_keys_sum() {
        let api = Facets {
            cities: vec![FacetBucket::new("paris", 3)],
            ..Default::default()
        };
        let business = Facets {
            cities: vec![FacetBucket::new("paris", 2), FacetBucket::new("lyon", 4)],
            ..Default::default()
        };

        let merged = merge_facets([&api, &business]);
        assert_eq!(merged.cities.len(), 2);
        // Buckets come back count-descending, so the summed key leads.
        assert_eq!(merged.cities[0], FacetBucket::new("paris", 5));
        assert_eq!(merged.cities[1], FacetBucket::new("lyon", 4));
    }

    #[test]
    fn test_dimensions_merge_independently() {
        let a = Facets {
            plans: vec![FacetBucket::new("free", 1)],
            tags: vec![FacetBucket::new("rest", 2)],
            ..Default::default()
        };
        let b = Facets {
            plans: vec![FacetBucket::new("premium", 3)],
            ..Default::default()
        };

        let merged = merge_facets([&a, &b]);
        assert_eq!(merged.plans.len(), 2);
        assert_eq!(merged.plans[0].key, "premium");
        assert_eq!(merged.tags, vec![FacetBucket::new("rest", 2)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_facets([]).is_empty());
    }

    #[test]
    fn test_labels_survive_merging() {
        let a = Facets {
            categories: vec![FacetBucket::new("cat-1", 2)],
            ..Default::default()
        };
        let b = Facets {
            categories: vec![FacetBucket::new("cat-1", 1).with_label("Weather")],
            ..Default::default()
        };

        let merged = merge_facets([&a, &b]);
        assert_eq!(merged.categories[0].count, 3);
        assert_eq!(merged.categories[0].label.as_deref(), Some("Weather"));
    }
}
