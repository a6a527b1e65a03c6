//! In-process search backend.
//!
//! `MemoryBackend` stores documents as raw JSON per partition and interprets
//! the query dialect emitted by [`crate::query::builder`]: bool/must/filter,
//! `multi_match` substring scoring, terms/term/range/geo_distance filters,
//! terms and range aggregations, sorting and paging. It exists for tests and
//! for embedding the engine without an external index service.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Instant;

use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::backend::{AggBucket, BackendHit, BackendResponse, SearchBackend};
use crate::error::{Result, SeineError};

/// Schema-less in-memory index, one document list per partition.
#[derive(Default)]
pub struct MemoryBackend {
    partitions: RwLock<AHashMap<String, Vec<StoredDoc>>>,
}

#[derive(Debug, Clone)]
struct StoredDoc {
    id: String,
    source: Value,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document to a partition. The document must carry the fields the
    /// query builder targets (`name`, `resourceType`, `createdAt`, ...).
    pub fn add_document<P: Into<String>, I: Into<String>>(
        &self,
        partition: P,
        id: I,
        source: Value,
    ) {
        let mut partitions = self.partitions.write();
        partitions.entry(partition.into()).or_default().push(StoredDoc {
            id: id.into(),
            source,
        });
    }

    pub fn doc_count(&self, partition: &str) -> usize {
        self.partitions
            .read()
            .get(partition)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let partitions = self.partitions.read();
        f.debug_struct("MemoryBackend")
            .field("partitions", &partitions.len())
            .finish()
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn search(&self, partition: &str, body: &Value) -> Result<BackendResponse> {
        let started = Instant::now();
        let docs = {
            let partitions = self.partitions.read();
            match partitions.get(partition) {
                Some(docs) => docs.clone(),
                None => {
                    return Err(SeineError::backend(format!(
                        "unknown partition: {partition}"
                    )));
                }
            }
        };

        let query = &body["query"];
        let mut matched: Vec<(StoredDoc, f32)> = Vec::new();
        for doc in docs {
            if let Some(score) = evaluate_query(query, &doc.source)? {
                matched.push((doc, score));
            }
        }

        let total = matched.len() as u64;
        let aggregations = compute_aggregations(&body["aggs"], &matched);

        let sort_spec = body["sort"].get(0).cloned();
        sort_matches(&mut matched, sort_spec.as_ref());

        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;

        let highlight_query = body
            .get("highlight")
            .and_then(|_| multi_match_query(query))
            .map(str::to_string);

        let hits = matched
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(doc, score)| {
                let sort = sort_values(sort_spec.as_ref(), &doc.source, score);
                let highlight = highlight_query
                    .as_deref()
                    .map(|q| build_highlight(&doc.source, q))
                    .unwrap_or_default();
                BackendHit {
                    id: doc.id,
                    score,
                    source: doc.source,
                    sort,
                    highlight,
                }
            })
            .collect();

        Ok(BackendResponse {
            hits,
            total,
            aggregations,
            took_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Evaluate the bool query against one document. Returns the relevance score
/// when the document matches, `None` when it is filtered out.
fn evaluate_query(query: &Value, source: &Value) -> Result<Option<f32>> {
    let bool_query = match query.get("bool") {
        Some(b) => b,
        None => return Err(SeineError::query("expected a bool query")),
    };

    if let Some(filters) = bool_query["filter"].as_array() {
        for clause in filters {
            if !evaluate_filter(clause, source)? {
                return Ok(None);
            }
        }
    }

    let must = bool_query["must"]
        .as_array()
        .and_then(|m| m.first())
        .cloned()
        .unwrap_or_else(|| serde_json::json!({ "match_all": {} }));

    if must.get("match_all").is_some() {
        return Ok(Some(1.0));
    }

    if let Some(mm) = must.get("multi_match") {
        let needle = mm["query"].as_str().unwrap_or_default().to_lowercase();
        if needle.is_empty() {
            return Ok(Some(1.0));
        }
        let mut score = 0.0f32;
        if let Some(fields) = mm["fields"].as_array() {
            for field in fields {
                let spec = field.as_str().unwrap_or_default();
                let (path, boost) = parse_boosted_field(spec);
                if field_contains(source, path, &needle) {
                    score += boost;
                }
            }
        }
        return Ok(if score > 0.0 { Some(score) } else { None });
    }

    Err(SeineError::query("unsupported query clause"))
}

fn evaluate_filter(clause: &Value, source: &Value) -> Result<bool> {
    if let Some(terms) = clause.get("terms") {
        let (field, expected) = single_entry(terms)?;
        let expected = expected.as_array().map(Vec::as_slice).unwrap_or_default();
        let actual = lookup(source, field);
        return Ok(expected.iter().any(|e| value_matches(&actual, e)));
    }

    if let Some(term) = clause.get("term") {
        let (field, expected) = single_entry(term)?;
        return Ok(value_matches(&lookup(source, field), expected));
    }

    if let Some(range) = clause.get("range") {
        let (field, bounds) = single_entry(range)?;
        return Ok(check_range(&lookup(source, field), bounds));
    }

    if let Some(geo) = clause.get("geo_distance") {
        let max_km = parse_distance_km(geo["distance"].as_str().unwrap_or_default())?;
        let center = (
            geo["location"]["lat"].as_f64().unwrap_or(0.0),
            geo["location"]["lon"].as_f64().unwrap_or(0.0),
        );
        let point = source.get("location");
        let (lat, lon) = match point {
            Some(p) => (
                p["lat"].as_f64().unwrap_or(f64::NAN),
                p["lon"].as_f64().unwrap_or(f64::NAN),
            ),
            None => return Ok(false),
        };
        if lat.is_nan() || lon.is_nan() {
            return Ok(false);
        }
        return Ok(haversine_km(center.0, center.1, lat, lon) <= max_km);
    }

    Err(SeineError::query("unsupported filter clause"))
}

fn single_entry(obj: &Value) -> Result<(&str, &Value)> {
    obj.as_object()
        .and_then(|m| m.iter().next())
        .map(|(k, v)| (k.as_str(), v))
        .ok_or_else(|| SeineError::query("empty filter clause"))
}

/// Resolve a dotted field path, ignoring a trailing `.keyword` suffix.
fn lookup(source: &Value, field: &str) -> Value {
    let path = field.strip_suffix(".keyword").unwrap_or(field);
    let mut current = source;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

fn value_matches(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|i| i == expected),
        other => other == expected,
    }
}

fn check_range(actual: &Value, bounds: &Value) -> bool {
    // Dates compare lexicographically in RFC 3339, numbers numerically.
    if let Some(n) = actual.as_f64() {
        if let Some(gte) = bounds["gte"].as_f64()
            && n < gte
        {
            return false;
        }
        if let Some(lte) = bounds["lte"].as_f64()
            && n > lte
        {
            return false;
        }
        return true;
    }
    if let Some(s) = actual.as_str() {
        if let Some(gte) = bounds["gte"].as_str()
            && s < gte
        {
            return false;
        }
        if let Some(lte) = bounds["lte"].as_str()
            && s > lte
        {
            return false;
        }
        return true;
    }
    false
}

fn parse_boosted_field(spec: &str) -> (&str, f32) {
    match spec.split_once('^') {
        Some((path, boost)) => (path, boost.parse().unwrap_or(1.0)),
        None => (spec, 1.0),
    }
}

fn field_contains(source: &Value, path: &str, needle: &str) -> bool {
    match lookup(source, path) {
        Value::String(text) => text.to_lowercase().contains(needle),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.to_lowercase().contains(needle)),
        _ => false,
    }
}

fn parse_distance_km(distance: &str) -> Result<f64> {
    let (value, factor) = if let Some(v) = distance.strip_suffix("km") {
        (v, 1.0)
    } else if let Some(v) = distance.strip_suffix("mi") {
        (v, 1.609_344)
    } else {
        (distance, 1.0)
    };
    value
        .parse::<f64>()
        .map(|v| v * factor)
        .map_err(|_| SeineError::query(format!("invalid distance: {distance}")))
}

fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

fn multi_match_query(query: &Value) -> Option<&str> {
    query["bool"]["must"]
        .get(0)?
        .get("multi_match")?
        .get("query")?
        .as_str()
}

fn sort_matches(matched: &mut [(StoredDoc, f32)], sort_spec: Option<&Value>) {
    let compare = |a: &(StoredDoc, f32), b: &(StoredDoc, f32)| -> Ordering {
        if let Some(spec) = sort_spec
            && let Some((key, opts)) = spec.as_object().and_then(|m| m.iter().next())
        {
            let descending = opts["order"].as_str() == Some("desc");
            let ordering = match key.as_str() {
                "_score" => a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal),
                "_geo_distance" => {
                    let center = (
                        opts["location"]["lat"].as_f64().unwrap_or(0.0),
                        opts["location"]["lon"].as_f64().unwrap_or(0.0),
                    );
                    let da = doc_distance_km(&a.0.source, center);
                    let db = doc_distance_km(&b.0.source, center);
                    da.partial_cmp(&db).unwrap_or(Ordering::Equal)
                }
                field => {
                    let va = lookup(&a.0.source, field);
                    let vb = lookup(&b.0.source, field);
                    compare_values(&va, &vb)
                }
            };
            let ordering = if descending { ordering.reverse() } else { ordering };
            return ordering.then_with(|| a.0.id.cmp(&b.0.id));
        }

        // Default ordering mirrors the index: score descending, id ascending.
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.id.cmp(&b.0.id))
    };
    matched.sort_by(compare);
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(na), Some(nb)) => na.partial_cmp(&nb).unwrap_or(Ordering::Equal),
        _ => a
            .as_str()
            .unwrap_or_default()
            .cmp(b.as_str().unwrap_or_default()),
    }
}

fn doc_distance_km(source: &Value, center: (f64, f64)) -> f64 {
    let lat = source["location"]["lat"].as_f64();
    let lon = source["location"]["lon"].as_f64();
    match (lat, lon) {
        (Some(lat), Some(lon)) => haversine_km(center.0, center.1, lat, lon),
        _ => f64::INFINITY,
    }
}

fn sort_values(sort_spec: Option<&Value>, source: &Value, score: f32) -> Vec<Value> {
    let Some(spec) = sort_spec else {
        return Vec::new();
    };
    let Some((key, opts)) = spec.as_object().and_then(|m| m.iter().next()) else {
        return Vec::new();
    };
    let value = match key.as_str() {
        "_score" => serde_json::json!(score),
        "_geo_distance" => {
            let center = (
                opts["location"]["lat"].as_f64().unwrap_or(0.0),
                opts["location"]["lon"].as_f64().unwrap_or(0.0),
            );
            serde_json::json!(doc_distance_km(source, center))
        }
        field => lookup(source, field),
    };
    vec![value]
}

fn build_highlight(source: &Value, query: &str) -> HashMap<String, Vec<String>> {
    let mut highlight = HashMap::new();
    for field in ["name", "description"] {
        if let Some(text) = source[field].as_str()
            && let Some((start, end)) = find_case_insensitive(text, query)
        {
            let snippet = format!(
                "{}<em>{}</em>{}",
                &text[..start],
                &text[start..end],
                &text[end..]
            );
            highlight.insert(field.to_string(), vec![snippet]);
        }
    }
    highlight
}

/// Case-insensitive substring search returning byte offsets into `text`
/// itself, so the match always lands on character boundaries. Lowercasing is
/// done per candidate window because it can change a string's byte length.
fn find_case_insensitive(text: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    let needle = needle.to_lowercase();
    let needle_chars = needle.chars().count();
    for (start, _) in text.char_indices() {
        let end = text[start..]
            .char_indices()
            .nth(needle_chars)
            .map_or(text.len(), |(off, _)| start + off);
        if text[start..end].to_lowercase() == needle {
            return Some((start, end));
        }
    }
    None
}

fn compute_aggregations(
    aggs: &Value,
    matched: &[(StoredDoc, f32)],
) -> HashMap<String, Vec<AggBucket>> {
    let mut out = HashMap::new();
    let Some(aggs) = aggs.as_object() else {
        return out;
    };

    for (name, spec) in aggs {
        if let Some(terms) = spec.get("terms") {
            let field = terms["field"].as_str().unwrap_or_default();
            let size = terms["size"].as_u64().unwrap_or(10) as usize;
            out.insert(name.clone(), terms_buckets(matched, field, size));
        } else if let Some(range) = spec.get("range") {
            let field = range["field"].as_str().unwrap_or_default();
            let ranges = range["ranges"].as_array().cloned().unwrap_or_default();
            out.insert(name.clone(), range_buckets(matched, field, &ranges));
        }
    }
    out
}

fn terms_buckets(matched: &[(StoredDoc, f32)], field: &str, size: usize) -> Vec<AggBucket> {
    let mut counts: AHashMap<String, u64> = AHashMap::new();
    for (doc, _) in matched {
        match lookup(&doc.source, field) {
            Value::Array(items) => {
                for item in items {
                    if let Some(key) = scalar_key(&item) {
                        *counts.entry(key).or_default() += 1;
                    }
                }
            }
            other => {
                if let Some(key) = scalar_key(&other) {
                    *counts.entry(key).or_default() += 1;
                }
            }
        }
    }

    let mut buckets: Vec<AggBucket> = counts
        .into_iter()
        .map(|(key, doc_count)| AggBucket { key, doc_count })
        .collect();
    buckets.sort_by(|a, b| b.doc_count.cmp(&a.doc_count).then_with(|| a.key.cmp(&b.key)));
    buckets.truncate(size);
    buckets
}

fn range_buckets(matched: &[(StoredDoc, f32)], field: &str, ranges: &[Value]) -> Vec<AggBucket> {
    ranges
        .iter()
        .map(|range| {
            let key = range["key"].as_str().unwrap_or_default().to_string();
            let from = range["from"].as_f64();
            let to = range["to"].as_f64();
            let doc_count = matched
                .iter()
                .filter(|(doc, _)| {
                    let value = lookup(&doc.source, field).as_f64().unwrap_or(0.0);
                    from.is_none_or(|f| value >= f) && to.is_none_or(|t| value < t)
                })
                .count() as u64;
            AggBucket { key, doc_count }
        })
        .collect()
}

fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
