//! Pagination of the combined ranked list.

use crate::types::{Hit, Pagination};

/// One page sliced out of the combined list, plus the has-more flag.
#[derive(Debug)]
pub struct Page {
    pub hits: Vec<Hit>,
    pub has_more: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Slice one page out of the combined ranked list.
///
/// The has-more flag compares against the length of the combined list
/// itself, since that list already reflects what the successful partition
/// fetches made available. Without pagination the whole list is returned.
pub fn paginate(hits: Vec<Hit>, pagination: Option<&Pagination>, default_limit: u32) -> Page {
    let Some(p) = pagination else {
        return Page {
            hits,
            has_more: false,
            page: None,
            limit: None,
        };
    };

    let offset = p.effective_offset(default_limit);
    let limit = p.effective_limit(default_limit);
    let has_more = hits.len() > offset + limit;

    let page_hits: Vec<Hit> = hits.into_iter().skip(offset).take(limit).collect();

    Page {
        hits: page_hits,
        has_more,
        page: Some(p.page.unwrap_or(1).max(1)),
        limit: Some(limit as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryRef, Plan, ResourceType};
    use chrono::Utc;

    fn hits(n: usize) -> Vec<Hit> {
        (0..n)
            .map(|i| Hit {
                id: format!("h{i}"),
                name: format!("h{i}"),
                description: None,
                resource_type: ResourceType::Api,
                category: CategoryRef::default(),
                plan: Plan::Free,
                verified: false,
                location: None,
                contact: None,
                tags: Vec::new(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
                score: 1.0,
                highlight: Default::default(),
            })
            .collect()
    }

    #[test]
    fn test_first_page() {
        let p = Pagination {
            page: Some(1),
            limit: Some(10),
            offset: None,
        };
        let page = paginate(hits(15), Some(&p), 20);
        assert_eq!(page.hits.len(), 10);
        assert_eq!(page.hits[0].id, "h0");
        assert!(page.has_more);
    }

    #[test]
    fn test_last_partial_page() {
        let p = Pagination {
            page: Some(2),
            limit: Some(10),
            offset: None,
        };
        let page = paginate(hits(15), Some(&p), 20);
        assert_eq!(page.hits.len(), 5);
        assert_eq!(page.hits[0].id, "h10");
        assert!(!page.has_more);
    }

    #[test]
    fn test_offset_overrides_page() {
        let p = Pagination {
            page: Some(1),
            limit: Some(5),
            offset: Some(12),
        };
        let page = paginate(hits(15), Some(&p), 20);
        assert_eq!(page.hits[0].id, "h12");
        assert_eq!(page.hits.len(), 3);
        assert!(!page.has_more);
    }

    #[test]
    fn test_exact_boundary_has_no_more() {
        let p = Pagination {
            page: Some(1),
            limit: Some(10),
            offset: None,
        };
        let page = paginate(hits(10), Some(&p), 20);
        assert_eq!(page.hits.len(), 10);
        assert!(!page.has_more);
    }

    #[test]
    fn test_no_pagination_returns_everything() {
        let page = paginate(hits(7), None, 20);
        assert_eq!(page.hits.len(), 7);
        assert!(!page.has_more);
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let p = Pagination {
            page: Some(9),
            limit: Some(10),
            offset: None,
        };
        let page = paginate(hits(15), Some(&p), 20);
        assert!(page.hits.is_empty());
        assert!(!page.has_more);
    }
}
