//! Resource types and their per-type search profiles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of resource types, one per index partition.
///
/// The variant order matters only for map iteration; ranking priority comes
/// from [`TypeProfile::priority`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Api,
    Service,
    Business,
    Data,
}

/// Per-type search profile: ranking priority and field boosts.
///
/// One table entry per resource type keeps type-specific literals out of the
/// aggregator and the query builder.
#[derive(Debug, Clone, Copy)]
pub struct TypeProfile {
    /// Tie-break priority at equal relevance score (higher surfaces first).
    pub priority: u8,
    /// Boost applied to the name field in text queries.
    pub name_boost: f32,
    /// Boost applied to the description field.
    pub description_boost: f32,
    /// Boost applied to the category name field.
    pub category_boost: f32,
    /// Boost applied to the tags field.
    pub tags_boost: f32,
}

impl ResourceType {
    /// All known resource types, in descending ranking priority.
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Api,
        ResourceType::Service,
        ResourceType::Business,
        ResourceType::Data,
    ];

    /// The search profile for this type.
    pub fn profile(&self) -> &'static TypeProfile {
        match self {
            ResourceType::Api => &TypeProfile {
                priority: 4,
                name_boost: 3.0,
                description_boost: 2.0,
                category_boost: 2.0,
                tags_boost: 1.0,
            },
            ResourceType::Service => &TypeProfile {
                priority: 3,
                name_boost: 3.0,
                description_boost: 2.0,
                category_boost: 2.0,
                tags_boost: 1.0,
            },
            ResourceType::Business => &TypeProfile {
                priority: 2,
                name_boost: 3.0,
                description_boost: 2.0,
                category_boost: 1.5,
                tags_boost: 1.0,
            },
            ResourceType::Data => &TypeProfile {
                priority: 1,
                name_boost: 3.0,
                description_boost: 2.0,
                category_boost: 1.5,
                tags_boost: 1.0,
            },
        }
    }

    /// Ranking priority shorthand.
    pub fn priority(&self) -> u8 {
        self.profile().priority
    }

    /// Lowercase identifier used in default partition alias names.
    pub fn as_partition_segment(&self) -> &'static str {
        match self {
            ResourceType::Api => "api",
            ResourceType::Service => "service",
            ResourceType::Business => "business",
            ResourceType::Data => "data",
        }
    }

    /// The wire name stored in the index's `resourceType` field.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            ResourceType::Api => "API",
            ResourceType::Service => "SERVICE",
            ResourceType::Business => "BUSINESS",
            ResourceType::Data => "DATA",
        }
    }

    /// Parse a wire name back into a type. Unknown names yield `None`.
    pub fn from_wire_str(s: &str) -> Option<Self> {
        match s {
            "API" => Some(ResourceType::Api),
            "SERVICE" => Some(ResourceType::Service),
            "BUSINESS" => Some(ResourceType::Business),
            "DATA" => Some(ResourceType::Data),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

/// Subscription plans a resource can be listed under.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
    Featured,
}

impl Plan {
    /// The wire name stored in the index's `plan` field.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
            Plan::Featured => "featured",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(ResourceType::Api.priority() > ResourceType::Service.priority());
        assert!(ResourceType::Service.priority() > ResourceType::Business.priority());
        assert!(ResourceType::Business.priority() > ResourceType::Data.priority());
    }

    #[test]
    fn test_wire_names_round_trip() {
        for ty in ResourceType::ALL {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_wire_str()));
            let back: ResourceType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, ty);
        }
    }

    #[test]
    fn test_name_boost_dominates() {
        for ty in ResourceType::ALL {
            let profile = ty.profile();
            assert!(profile.name_boost > profile.description_boost);
            assert!(profile.name_boost > profile.tags_boost);
        }
    }
}
