//! Per-type export of search results.
//!
//! Exports reuse the regular search pipeline but fetch in large pages and
//! reshape hits per format: JSON keeps the structured [`Hit`], CSV and XLSX
//! get a flat row with French column labels matching the product's download
//! templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Hit, ResourceType};

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Xlsx,
}

/// One exported record: structured for JSON, flattened for tabular formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportRow {
    Structured(Hit),
    Flat(FlatRow),
}

/// Flattened row for CSV/XLSX exports. Field names are the column labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Nom")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Type")]
    pub resource_type: String,
    #[serde(rename = "Catégorie")]
    pub category: String,
    #[serde(rename = "Plan")]
    pub plan: String,
    #[serde(rename = "Vérifié")]
    pub verified: String,
    #[serde(rename = "Ville")]
    pub city: String,
    #[serde(rename = "Région")]
    pub region: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Téléphone")]
    pub phone: String,
    #[serde(rename = "Site_Web")]
    pub website: String,
    #[serde(rename = "Tags")]
    pub tags: String,
    #[serde(rename = "Date_Création")]
    pub created_at: String,
    #[serde(rename = "Date_Modification")]
    pub updated_at: String,
    #[serde(rename = "Score_Pertinence")]
    pub score: f32,
}

impl From<&Hit> for FlatRow {
    fn from(hit: &Hit) -> Self {
        let location = hit.location.as_ref();
        let contact = hit.contact.as_ref();
        FlatRow {
            id: hit.id.clone(),
            name: hit.name.clone(),
            description: hit.description.clone().unwrap_or_default(),
            resource_type: hit.resource_type.as_wire_str().to_string(),
            category: hit.category.name.clone(),
            plan: hit.plan.as_wire_str().to_string(),
            verified: if hit.verified { "Oui" } else { "Non" }.to_string(),
            city: location.and_then(|l| l.city.clone()).unwrap_or_default(),
            region: location.and_then(|l| l.region.clone()).unwrap_or_default(),
            email: contact.and_then(|c| c.email.clone()).unwrap_or_default(),
            phone: contact.and_then(|c| c.phone.clone()).unwrap_or_default(),
            website: contact.and_then(|c| c.website.clone()).unwrap_or_default(),
            tags: hit.tags.join(", "),
            created_at: hit.created_at.to_rfc3339(),
            updated_at: hit.updated_at.to_rfc3339(),
            score: hit.score,
        }
    }
}

/// Convert hits into export rows for the requested format.
pub fn to_rows(hits: &[Hit], format: ExportFormat) -> Vec<ExportRow> {
    match format {
        ExportFormat::Json => hits.iter().cloned().map(ExportRow::Structured).collect(),
        ExportFormat::Csv | ExportFormat::Xlsx => {
            hits.iter().map(|h| ExportRow::Flat(h.into())).collect()
        }
    }
}

/// Exported rows for one resource type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub resource_type: ResourceType,
    pub format: ExportFormat,
    pub rows: Vec<ExportRow>,
    pub count: usize,
    pub exported_at: DateTime<Utc>,
}

/// Outcome of a multi-type export. Partial failure keeps the bundles that
/// succeeded and names the types that did not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub bundles: Vec<ExportBundle>,
    pub failed_types: Vec<ResourceType>,
}
