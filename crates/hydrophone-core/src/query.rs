//! Query pipeline construction for document and facet queries.
//!
//! A `QueryTransaction` becomes a pipeline with exactly one match stage: a
//! conjunction of one clause per filterable field, always in the same order.
//! Filter lists are flattened and trimmed first; a list left empty becomes the
//! match-all sentinel (`$in` holding the single regex `.*`), so that clause
//! accepts every document.
//!
//! The pipeline is typed. Stores translate it (`hydrophone-db` renders SQL,
//! the in-memory store calls [`Pipeline::matches`]) and [`Pipeline::to_json`]
//! renders the aggregation document form:
//!
//! ```text
//! [{"$match": {"$and": [
//!     {"publisherName.lastName": {"$in": ["Seger"]}},
//!     {"callTypeName": {"$in": [{"$regex": ".*"}]}},
//!     ...
//!     {"recordTimestamp": {"$gte": 0, "$lte": 0}}
//! ]}}]
//! ```

use std::fmt;

use serde_json::{json, Value as JsonValue};

use crate::defaults::MATCH_ALL_PATTERN;
use crate::models::{Document, QueryTransaction};

/// Document paths that queries can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    PublisherLastName,
    PublisherFirstName,
    StudySiteCity,
    StudySiteState,
    StudySiteProvince,
    StudySiteCountry,
    CallTypeName,
    GroundType,
    SensorType,
    SensorName,
    RecordTimestamp,
}

impl FieldPath {
    /// Dotted path as it appears in the match stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PublisherLastName => "publisherName.lastName",
            Self::PublisherFirstName => "publisherName.firstName",
            Self::StudySiteCity => "studySite.city",
            Self::StudySiteState => "studySite.state",
            Self::StudySiteProvince => "studySite.province",
            Self::StudySiteCountry => "studySite.country",
            Self::CallTypeName => "callTypeName",
            Self::GroundType => "groundType",
            Self::SensorType => "sensorType",
            Self::SensorName => "sensorName",
            Self::RecordTimestamp => "recordTimestamp",
        }
    }

    /// Path segments, for stores that address nested JSON.
    pub fn segments(&self) -> Vec<&'static str> {
        self.as_str().split('.').collect()
    }

    /// Text value of this path in `doc`; `None` for non-text paths.
    pub fn text<'a>(&self, doc: &'a Document) -> Option<&'a str> {
        let value = match self {
            Self::PublisherLastName => &doc.publisher.last_name,
            Self::PublisherFirstName => &doc.publisher.first_name,
            Self::StudySiteCity => &doc.study_site.city,
            Self::StudySiteState => &doc.study_site.state,
            Self::StudySiteProvince => &doc.study_site.province,
            Self::StudySiteCountry => &doc.study_site.country,
            Self::CallTypeName => &doc.call_type_name,
            Self::GroundType => &doc.ground_type,
            Self::SensorType => &doc.sensor_type,
            Self::SensorName => &doc.sensor_name,
            Self::RecordTimestamp => return None,
        };
        Some(value.as_str())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed values for one `$in` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InFilter {
    /// The `.*` regex sentinel: the clause does not constrain results.
    MatchAll,
    /// Literal values; never empty.
    Values(Vec<String>),
}

impl InFilter {
    /// Trim every value and drop blanks; nothing left means match-all.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let kept: Vec<String> = values
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
        if kept.is_empty() {
            Self::MatchAll
        } else {
            Self::Values(kept)
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Values(values) => values.iter().any(|v| v == value),
        }
    }

    fn to_json(&self) -> JsonValue {
        match self {
            Self::MatchAll => json!([{ "$regex": MATCH_ALL_PATTERN }]),
            Self::Values(values) => json!(values),
        }
    }
}

/// One conjunct of the match stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    In { path: FieldPath, filter: InFilter },
    Range { path: FieldPath, gte: i64, lte: i64 },
}

impl Clause {
    pub fn path(&self) -> FieldPath {
        match self {
            Self::In { path, .. } | Self::Range { path, .. } => *path,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::In { path, filter } => path.text(doc).is_some_and(|v| filter.accepts(v)),
            Self::Range { gte, lte, .. } => (*gte..=*lte).contains(&doc.record_timestamp),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let mut clause = serde_json::Map::new();
        let condition = match self {
            Self::In { filter, .. } => json!({ "$in": filter.to_json() }),
            Self::Range { gte, lte, .. } => json!({ "$gte": gte, "$lte": lte }),
        };
        clause.insert(self.path().as_str().to_string(), condition);
        JsonValue::Object(clause)
    }
}

/// An aggregation pipeline made of a single conjunctive match stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    clauses: Vec<Clause>,
}

impl Pipeline {
    /// Clauses of the match stage, in emission order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// True if `doc` satisfies every clause.
    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses.iter().all(|c| c.matches(doc))
    }

    /// Render as `[{"$match": {"$and": [...]}}]`.
    pub fn to_json(&self) -> JsonValue {
        let conjuncts: Vec<JsonValue> = self.clauses.iter().map(Clause::to_json).collect();
        json!([{ "$match": { "$and": conjuncts } }])
    }
}

/// Build the match pipeline for a query.
pub fn build_pipeline(query: &QueryTransaction) -> Pipeline {
    let publishers = &query.publishers;
    let sites = &query.study_sites;

    let text = |path: FieldPath, filter: InFilter| Clause::In { path, filter };
    let strings = |values: &[String]| InFilter::from_values(values.iter().map(String::as_str));

    let clauses = vec![
        text(
            FieldPath::PublisherLastName,
            InFilter::from_values(publishers.iter().map(|p| p.last_name.as_str())),
        ),
        text(
            FieldPath::PublisherFirstName,
            InFilter::from_values(publishers.iter().map(|p| p.first_name.as_str())),
        ),
        text(
            FieldPath::StudySiteCity,
            InFilter::from_values(sites.iter().map(|s| s.city.as_str())),
        ),
        text(
            FieldPath::StudySiteState,
            InFilter::from_values(sites.iter().map(|s| s.state.as_str())),
        ),
        text(
            FieldPath::StudySiteProvince,
            InFilter::from_values(sites.iter().map(|s| s.province.as_str())),
        ),
        text(
            FieldPath::StudySiteCountry,
            InFilter::from_values(sites.iter().map(|s| s.country.as_str())),
        ),
        text(FieldPath::CallTypeName, strings(&query.call_type_names)),
        text(FieldPath::GroundType, strings(&query.ground_types)),
        text(FieldPath::SensorType, strings(&query.sensor_types)),
        text(FieldPath::SensorName, strings(&query.sensor_names)),
        Clause::Range {
            path: FieldPath::RecordTimestamp,
            gte: query.min_record_timestamp,
            lte: query.max_record_timestamp,
        },
    ];

    Pipeline { clauses }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Publisher, StudySite};

    fn sentinel() -> JsonValue {
        json!({ "$in": [{ "$regex": ".*" }] })
    }

    #[test]
    fn test_empty_query_is_all_sentinels_plus_range() {
        let pipeline = build_pipeline(&QueryTransaction::default());
        assert_eq!(pipeline.clauses().len(), 11);

        let rendered = pipeline.to_json();
        let conjuncts = rendered[0]["$match"]["$and"].as_array().unwrap();
        for (clause, path) in conjuncts.iter().zip([
            "publisherName.lastName",
            "publisherName.firstName",
            "studySite.city",
            "studySite.state",
            "studySite.province",
            "studySite.country",
            "callTypeName",
            "groundType",
            "sensorType",
            "sensorName",
        ]) {
            assert_eq!(clause[path], sentinel(), "{path}");
        }
        assert_eq!(conjuncts[10]["recordTimestamp"], json!({"$gte": 0, "$lte": 0}));
    }

    #[test]
    fn test_blank_components_are_dropped() {
        let query = QueryTransaction {
            publishers: vec![Publisher::new("", "X"), Publisher::new("  ", " Y ")],
            ..Default::default()
        };
        let pipeline = build_pipeline(&query);
        assert_eq!(
            pipeline.clauses()[0],
            Clause::In {
                path: FieldPath::PublisherLastName,
                filter: InFilter::MatchAll
            }
        );
        assert_eq!(
            pipeline.clauses()[1],
            Clause::In {
                path: FieldPath::PublisherFirstName,
                filter: InFilter::Values(vec!["X".into(), "Y".into()])
            }
        );
    }

    #[test]
    fn test_sentinel_differs_from_literal_dot_star() {
        let query = QueryTransaction {
            sensor_names: vec![".*".to_string()],
            ..Default::default()
        };
        let rendered = build_pipeline(&query).to_json();
        let clause = &rendered[0]["$match"]["$and"][9]["sensorName"];
        assert_eq!(clause, &json!({ "$in": [".*"] }));
        assert_ne!(clause, &sentinel());
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let query = QueryTransaction {
            publishers: vec![Publisher::new("Seger", "Kerri")],
            study_sites: vec![StudySite::new("Seattle", "WA", "", "USA")],
            ground_types: vec!["beach".into()],
            min_record_timestamp: 10,
            max_record_timestamp: 20,
            ..Default::default()
        };
        let a = serde_json::to_vec(&build_pipeline(&query).to_json()).unwrap();
        let b = serde_json::to_vec(&build_pipeline(&query).to_json()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_matches_evaluates_every_clause() {
        let doc = Document {
            publisher: Publisher::new("Kim", "Lisa"),
            study_site: StudySite::new("Seattle", "", "", "USA"),
            ground_type: "beach".into(),
            record_timestamp: 1514764800,
            ..Default::default()
        };

        let mut query = QueryTransaction {
            ground_types: vec!["beach".into()],
            min_record_timestamp: 1514764800,
            max_record_timestamp: 1514764800,
            ..Default::default()
        };
        assert!(build_pipeline(&query).matches(&doc));

        query.ground_types = vec!["reef".into()];
        assert!(!build_pipeline(&query).matches(&doc));

        query.ground_types.clear();
        query.max_record_timestamp = 1514764799;
        assert!(!build_pipeline(&query).matches(&doc));
    }

    #[test]
    fn test_field_path_segments() {
        assert_eq!(
            FieldPath::StudySiteProvince.segments(),
            vec!["studySite", "province"]
        );
        assert_eq!(FieldPath::RecordTimestamp.segments(), vec!["recordTimestamp"]);
        assert!(FieldPath::RecordTimestamp.text(&Document::default()).is_none());
    }
}
