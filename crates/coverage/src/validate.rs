//! Structural validation of raw day documents.
//!
//! [`parse_snapshot`] checks a published document field by field and builds the
//! canonical [`PerDaySnapshot`]. Any violation rejects the whole document; a
//! partially valid day is never returned.
//!
//! Expected layout (every field optional, `null` treated as absent):
//!
//! ```json
//! {
//!   "importData": { "USA": 0.12 },
//!   "exportData": { "GBR": 0.08 },
//!   "nerData": { "USA": 41 },
//!   "topEntitiesByCountry": { "USA": [{ "entity": "NATO", "count": 12, "share": 0.3 }] },
//!   "topNer": "NATO",
//!   "foreignPressData": {
//!     "countryCoverage": { "USA": { "coveredBy": { "GBR": 0.6 }, "totalCoverage": 25 } },
//!     "countryCovering": { "GBR": { "covering": { "USA": 1.0 }, "totalCovering": 15 } }
//!   }
//! }
//! ```
//!
//! Ranking lists present in the document are not trusted; they are rebuilt
//! from the per-country totals.

use std::collections::BTreeMap;

use coverage_core::{
    CountryCode, CoverageRelation, EntityCount, FetchError, ForeignPress, PerDaySnapshot,
    ShareMap,
};
use serde_json::{Map, Value};

const IMPORT_DATA: &str = "importData";
const EXPORT_DATA: &str = "exportData";
const NER_DATA: &str = "nerData";
const TOP_ENTITIES_BY_COUNTRY: &str = "topEntitiesByCountry";
const TOP_NER: &str = "topNer";
const FOREIGN_PRESS_DATA: &str = "foreignPressData";
const COUNTRY_COVERAGE: &str = "countryCoverage";
const COUNTRY_COVERING: &str = "countryCovering";
const COVERED_BY: &str = "coveredBy";
const TOTAL_COVERAGE: &str = "totalCoverage";
const COVERING: &str = "covering";
const TOTAL_COVERING: &str = "totalCovering";

fn invalid(msg: impl Into<String>) -> FetchError {
    FetchError::Validation(msg.into())
}

/// Validates a raw day document and converts it into a [`PerDaySnapshot`].
///
/// # Errors
///
/// Returns [`FetchError::Validation`] if the document is not an object, a
/// declared mapping field is not an object, a share is negative or not a
/// finite number, or an entity entry lacks a string `entity` or finite
/// `count`/`share`.
pub fn parse_snapshot(document: &Value) -> Result<PerDaySnapshot, FetchError> {
    let root = document
        .as_object()
        .ok_or_else(|| invalid("document must be a JSON object"))?;

    let top_entity_of_day = match field(root, TOP_NER) {
        None => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(invalid(format!("`{TOP_NER}` must be a string"))),
    };

    Ok(PerDaySnapshot {
        import_share: share_map(optional_object(root, IMPORT_DATA)?, IMPORT_DATA)?,
        export_share: share_map(optional_object(root, EXPORT_DATA)?, EXPORT_DATA)?,
        mention_share: share_map(optional_object(root, NER_DATA)?, NER_DATA)?,
        top_entities_by_country: entities_by_country(optional_object(
            root,
            TOP_ENTITIES_BY_COUNTRY,
        )?)?,
        top_entity_of_day,
        foreign_press: foreign_press(optional_object(root, FOREIGN_PRESS_DATA)?)?,
    })
}

/// Returns a field's value, treating `null` as absent.
fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).filter(|v| !v.is_null())
}

fn optional_object<'a>(
    object: &'a Map<String, Value>,
    name: &str,
) -> Result<Option<&'a Map<String, Value>>, FetchError> {
    match field(object, name) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(invalid(format!("`{name}` must be an object"))),
    }
}

fn finite(value: &Value, context: &str) -> Result<f64, FetchError> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(format!("{context} must be a finite number")))
}

fn non_negative(value: &Value, context: &str) -> Result<f64, FetchError> {
    let v = finite(value, context)?;
    if v < 0.0 {
        return Err(invalid(format!("{context} must not be negative")));
    }
    Ok(v)
}

fn share_map(object: Option<&Map<String, Value>>, name: &str) -> Result<ShareMap, FetchError> {
    let Some(object) = object else {
        return Ok(ShareMap::new());
    };
    object
        .iter()
        .map(|(country, value)| {
            let v = non_negative(value, &format!("`{name}.{country}`"))?;
            Ok((CountryCode::new(country.as_str()), v))
        })
        .collect()
}

fn entities_by_country(
    object: Option<&Map<String, Value>>,
) -> Result<BTreeMap<CountryCode, Vec<EntityCount>>, FetchError> {
    let Some(object) = object else {
        return Ok(BTreeMap::new());
    };

    let mut result = BTreeMap::new();
    for (country, value) in object {
        let context = format!("`{TOP_ENTITIES_BY_COUNTRY}.{country}`");
        let items = value
            .as_array()
            .ok_or_else(|| invalid(format!("{context} must be an array")))?;

        let entities = items
            .iter()
            .enumerate()
            .map(|(i, item)| entity(item, &format!("{context}[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        result.insert(CountryCode::new(country.as_str()), entities);
    }
    Ok(result)
}

fn entity(item: &Value, context: &str) -> Result<EntityCount, FetchError> {
    let object = item
        .as_object()
        .ok_or_else(|| invalid(format!("{context} must be an object")))?;

    let name = object
        .get("entity")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("{context}.entity must be a string")))?;
    let count = object
        .get("count")
        .ok_or_else(|| invalid(format!("{context}.count is missing")))
        .and_then(|v| non_negative(v, &format!("{context}.count")))?;
    let share = object
        .get("share")
        .ok_or_else(|| invalid(format!("{context}.share is missing")))
        .and_then(|v| non_negative(v, &format!("{context}.share")))?;

    Ok(EntityCount::new(name, count, share))
}

fn foreign_press(object: Option<&Map<String, Value>>) -> Result<ForeignPress, FetchError> {
    let Some(object) = object else {
        return Ok(ForeignPress::default());
    };

    let featured = relations(
        optional_object(object, COUNTRY_COVERAGE)?,
        COUNTRY_COVERAGE,
        COVERED_BY,
        TOTAL_COVERAGE,
    )?;
    let covering = relations(
        optional_object(object, COUNTRY_COVERING)?,
        COUNTRY_COVERING,
        COVERING,
        TOTAL_COVERING,
    )?;

    Ok(ForeignPress::from_relations(featured, covering))
}

fn relations(
    object: Option<&Map<String, Value>>,
    name: &str,
    contributors_field: &str,
    total_field: &str,
) -> Result<BTreeMap<CountryCode, CoverageRelation>, FetchError> {
    let Some(object) = object else {
        return Ok(BTreeMap::new());
    };

    let mut result = BTreeMap::new();
    for (country, value) in object {
        let context = format!("`{name}.{country}`");
        let entry = value
            .as_object()
            .ok_or_else(|| invalid(format!("{context} must be an object")))?;

        let contributors = share_map(
            optional_object(entry, contributors_field)?,
            &format!("{name}.{country}.{contributors_field}"),
        )?;
        let total = match field(entry, total_field) {
            Some(v) => non_negative(v, &format!("{context}.{total_field}"))?,
            None => 0.0,
        };

        result.insert(
            CountryCode::new(country.as_str()),
            CoverageRelation::new(contributors, total),
        );
    }
    Ok(result)
}
