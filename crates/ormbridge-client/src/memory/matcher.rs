//! Filter evaluation, ordering and pipeline stages for the in-memory store.

use std::cmp::Ordering;

use bson::{Bson, Document};
use regex::RegexBuilder;

use crate::store::{StoreError, StoreResult};

/// Check a document against a match filter.
pub fn matches(doc: &Document, filter: &Document) -> StoreResult<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for sub in sub_filters(key, condition)? {
                    if !matches(doc, sub)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for sub in sub_filters(key, condition)? {
                    if matches(doc, sub)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            op if op.starts_with('$') => {
                return Err(StoreError::InvalidFilter(format!(
                    "unsupported top-level operator {}",
                    op
                )))
            }
            field => field_matches(doc.get(field), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sub_filters<'a>(op: &str, condition: &'a Bson) -> StoreResult<Vec<&'a Document>> {
    let Bson::Array(items) = condition else {
        return Err(StoreError::InvalidFilter(format!("{} requires an array", op)));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => Ok(d),
            other => Err(StoreError::InvalidFilter(format!(
                "{} entries must be documents, got {}",
                op, other
            ))),
        })
        .collect()
}

fn is_operator_document(condition: &Bson) -> Option<&Document> {
    match condition {
        Bson::Document(d) if d.keys().next().is_some_and(|k| k.starts_with('$')) => Some(d),
        _ => None,
    }
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> StoreResult<bool> {
    let Some(ops) = is_operator_document(condition) else {
        return Ok(equals(value, condition));
    };

    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$gt" => compare(value, operand) == Some(Ordering::Greater),
            "$gte" => matches!(
                compare(value, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            "$lt" => compare(value, operand) == Some(Ordering::Less),
            "$lte" => matches!(
                compare(value, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            "$in" => match operand {
                Bson::Array(candidates) => candidates.iter().any(|c| equals(value, c)),
                _ => return Err(StoreError::InvalidFilter("$in requires an array".into())),
            },
            "$regex" => regex_matches(value, operand, ops.get("$options"))?,
            "$options" => true,
            "$not" => !field_matches(value, operand)?,
            other => {
                return Err(StoreError::InvalidFilter(format!(
                    "unsupported operator {}",
                    other
                )))
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn regex_matches(value: Option<&Bson>, pattern: &Bson, options: Option<&Bson>) -> StoreResult<bool> {
    let Bson::String(pattern) = pattern else {
        return Err(StoreError::InvalidFilter("$regex requires a string".into()));
    };
    let case_insensitive = matches!(options, Some(Bson::String(o)) if o.contains('i'));
    let re = RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| StoreError::InvalidFilter(format!("bad $regex {}: {}", pattern, e)))?;
    Ok(matches!(value, Some(Bson::String(s)) if re.is_match(s)))
}

/// Equality as a document store sees it: `null` also matches a missing
/// field and numbers compare across widths.
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match (value, expected) {
        (None | Some(Bson::Null), Bson::Null) => true,
        (None, _) => false,
        (Some(actual), expected) => compare_values(actual, expected) == Some(Ordering::Equal),
    }
}

fn compare(value: Option<&Bson>, operand: &Bson) -> Option<Ordering> {
    value.and_then(|v| compare_values(v, operand))
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(d) => Some(*d),
        _ => None,
    }
}

/// Compare two values of the same kind. Values of different kinds are
/// unordered, so range operators never match across types.
fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        (x, y) if x == y => Some(Ordering::Equal),
        _ => None,
    }
}

fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) => 0,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => 1,
        Some(Bson::String(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::Boolean(_)) => 5,
        Some(Bson::DateTime(_)) => 6,
        Some(_) => 7,
    }
}

/// Total order used for sorting: missing and null first, then by type, then value.
fn sort_order(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// Stable sort by a `{field: 1 | -1}` specification.
pub fn sort_documents(docs: &mut [Document], spec: &Document) -> StoreResult<()> {
    let mut keys = Vec::with_capacity(spec.len());
    for (field, direction) in spec {
        let descending = match as_number(direction) {
            Some(d) if d > 0.0 => false,
            Some(d) if d < 0.0 => true,
            _ => {
                return Err(StoreError::InvalidFilter(format!(
                    "sort direction for {} must be 1 or -1",
                    field
                )))
            }
        };
        keys.push((field.as_str(), descending));
    }

    docs.sort_by(|a, b| {
        for (field, descending) in &keys {
            let ord = sort_order(a.get(*field), b.get(*field));
            let ord = if *descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(())
}

/// Apply a limit the way a cursor does: zero means unlimited, negative
/// values use their magnitude.
pub fn apply_limit(docs: &mut Vec<Document>, limit: i64) {
    if limit != 0 {
        let n = usize::try_from(limit.unsigned_abs()).unwrap_or(usize::MAX);
        docs.truncate(n);
    }
}

/// Run `$match`, `$sort` and `$limit` stages over a document set.
pub fn run_pipeline(mut docs: Vec<Document>, pipeline: &[Document]) -> StoreResult<Vec<Document>> {
    for stage in pipeline {
        let mut entries = stage.iter();
        let (name, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(StoreError::InvalidPipeline(
                    "each stage must have exactly one field".into(),
                ))
            }
        };
        match (name.as_str(), body) {
            ("$match", Bson::Document(filter)) => {
                let mut kept = Vec::with_capacity(docs.len());
                for doc in docs {
                    if matches(&doc, filter)? {
                        kept.push(doc);
                    }
                }
                docs = kept;
            }
            ("$sort", Bson::Document(spec)) => sort_documents(&mut docs, spec)?,
            ("$limit", n) => match as_number(n) {
                Some(n) if n >= 1.0 => apply_limit(&mut docs, n as i64),
                _ => {
                    return Err(StoreError::InvalidPipeline(
                        "$limit must be a positive number".into(),
                    ))
                }
            },
            (other, _) => {
                return Err(StoreError::InvalidPipeline(format!(
                    "unsupported stage {}",
                    other
                )))
            }
        }
    }
    Ok(docs)
}

/// Apply a `$set` update in place.
pub fn apply_update(doc: &mut Document, update: &Document) -> StoreResult<()> {
    for (op, body) in update {
        match (op.as_str(), body) {
            ("$set", Bson::Document(fields)) => {
                for (k, v) in fields {
                    doc.insert(k.clone(), v.clone());
                }
            }
            (other, _) => {
                return Err(StoreError::InvalidUpdate(format!(
                    "unsupported update operator {}",
                    other
                )))
            }
        }
    }
    Ok(())
}

/// Seed document for an upsert: the plain equality fields of the filter.
pub fn upsert_seed(filter: &Document) -> Document {
    filter
        .iter()
        .filter(|(k, v)| !k.starts_with('$') && is_operator_document(v).is_none())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
