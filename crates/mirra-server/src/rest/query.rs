//! List query-string parsing: pagination, sort, and typed equality filters.

use std::collections::HashMap;

use mirra_core::EntityDef;
use mirra_store::{ListOptions, SortField};

use crate::errors::ApiError;

/// Default page size when `limit` is absent.
const DEFAULT_LIMIT: i64 = 50;
/// Hard cap on page size; larger requests are clamped.
const MAX_LIMIT: i64 = 100;

/// Build [`ListOptions`] from raw query parameters.
///
/// - `skip` must be a non-negative integer (default 0)
/// - `limit` must be a positive integer (default 50, clamped to 100)
/// - `sort` is a comma-separated field list, `-` prefix for descending;
///   every field must be declared on the entity
/// - any parameter matching a declared field name becomes an equality
///   filter, parsed per the field's declared type
/// - unrecognized parameters are ignored
pub fn parse_list_options(
    entity: &EntityDef,
    params: &HashMap<String, String>,
) -> Result<ListOptions, ApiError> {
    let mut opts = ListOptions::default();

    if let Some(raw) = params.get("skip") {
        opts.skip = raw
            .parse::<i64>()
            .ok()
            .filter(|v| *v >= 0)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid skip: {raw:?}")))?;
    }

    if let Some(raw) = params.get("limit") {
        let limit = raw
            .parse::<i64>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid limit: {raw:?}")))?;
        opts.limit = limit.min(MAX_LIMIT);
    } else {
        opts.limit = DEFAULT_LIMIT;
    }

    if let Some(raw) = params.get("sort") {
        let sort = SortField::parse_list(raw);
        for clause in &sort {
            if entity.field_type(&clause.field).is_none() && clause.field != "_id" {
                return Err(ApiError::BadRequest(format!(
                    "cannot sort on undeclared field: {}",
                    clause.field
                )));
            }
        }
        opts.sort = sort;
    }

    for (name, raw) in params {
        if matches!(name.as_str(), "skip" | "limit" | "sort") {
            continue;
        }
        let Some(field_type) = entity.field_type(name) else {
            continue;
        };
        let value = field_type.parse(raw).ok_or_else(|| {
            ApiError::BadRequest(format!("invalid value for field {name}: {raw:?}"))
        })?;
        opts.filters.push((name.clone(), value));
    }
    // Deterministic SQL regardless of HashMap iteration order
    opts.filters.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(opts)
}
