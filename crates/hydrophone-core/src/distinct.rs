//! Projection of raw distinct values into `QueryTransaction` facet fields.
//!
//! Stores return distinct values untyped: strings for the scalar facets and
//! positional arrays for the composite ones (`[lastName, firstName]` and
//! `[city, state, province, country]`). Composite components are read by
//! position; sub-documents carrying their camelCase keys are accepted too.

use std::fmt;
use std::str::FromStr;

use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::{Publisher, QueryTransaction, StudySite};

/// The six facets a distinct query can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DistinctField {
    Publishers,
    StudySites,
    CallTypeNames,
    GroundTypes,
    SensorTypes,
    SensorNames,
}

impl DistinctField {
    pub const ALL: [DistinctField; 6] = [
        DistinctField::Publishers,
        DistinctField::StudySites,
        DistinctField::CallTypeNames,
        DistinctField::GroundTypes,
        DistinctField::SensorTypes,
        DistinctField::SensorNames,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publishers => "Publishers",
            Self::StudySites => "StudySites",
            Self::CallTypeNames => "CallTypeNames",
            Self::GroundTypes => "GroundTypes",
            Self::SensorTypes => "SensorTypes",
            Self::SensorNames => "SensorNames",
        }
    }
}

impl FromStr for DistinctField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or(Error::InvalidDistinctFieldName)
    }
}

impl fmt::Display for DistinctField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PUBLISHER_KEYS: [&str; 2] = ["lastName", "firstName"];
const STUDY_SITE_KEYS: [&str; 4] = ["city", "state", "province", "country"];

/// Component `index` of a composite entry whose layout is `keys`.
fn text_at(entry: &JsonValue, keys: &[&str], index: usize) -> Result<String> {
    let component = match entry {
        JsonValue::Array(items) if items.len() == keys.len() => &items[index],
        JsonValue::Object(fields) if fields.len() == keys.len() => {
            fields.get(keys[index]).ok_or(Error::InvalidDistinctResult)?
        }
        _ => return Err(Error::InvalidDistinctResult),
    };
    component
        .as_str()
        .map(String::from)
        .ok_or(Error::InvalidDistinctResult)
}

fn to_publisher(entry: &JsonValue) -> Result<Publisher> {
    Ok(Publisher {
        last_name: text_at(entry, &PUBLISHER_KEYS, 0)?,
        first_name: text_at(entry, &PUBLISHER_KEYS, 1)?,
    })
}

fn to_study_site(entry: &JsonValue) -> Result<StudySite> {
    Ok(StudySite {
        city: text_at(entry, &STUDY_SITE_KEYS, 0)?,
        state: text_at(entry, &STUDY_SITE_KEYS, 1)?,
        province: text_at(entry, &STUDY_SITE_KEYS, 2)?,
        country: text_at(entry, &STUDY_SITE_KEYS, 3)?,
    })
}

fn to_text(entry: &JsonValue) -> Result<String> {
    entry
        .as_str()
        .map(String::from)
        .ok_or(Error::InvalidDistinctResult)
}

/// Replace the facet named `field_name` in `result` with the values in `raw`.
///
/// Fails with `InvalidDistinctFieldName` for an unknown facet and with
/// `InvalidDistinctResult` when `raw` is empty or an entry has the wrong
/// shape. On failure `result` is left untouched.
pub fn extract_distinct(
    result: &mut QueryTransaction,
    field_name: &str,
    raw: &[JsonValue],
) -> Result<()> {
    let field: DistinctField = field_name.parse()?;
    if raw.is_empty() {
        return Err(Error::InvalidDistinctResult);
    }

    let texts = || raw.iter().map(to_text).collect::<Result<Vec<_>>>();
    match field {
        DistinctField::Publishers => {
            result.publishers = raw.iter().map(to_publisher).collect::<Result<_>>()?;
        }
        DistinctField::StudySites => {
            result.study_sites = raw.iter().map(to_study_site).collect::<Result<_>>()?;
        }
        DistinctField::CallTypeNames => result.call_type_names = texts()?,
        DistinctField::GroundTypes => result.ground_types = texts()?,
        DistinctField::SensorTypes => result.sensor_types = texts()?,
        DistinctField::SensorNames => result.sensor_names = texts()?,
    }
    Ok(())
}
