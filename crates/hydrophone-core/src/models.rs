//! Core data models for hydrophone.
//!
//! These types are shared across all hydrophone crates and represent the
//! bioacoustic observation records and the query envelope used to search them.
//! JSON field names are camelCase; the persisted record has the same shape.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mapping from FUID to URL for one media kind, iterated in key order.
pub type UrlMap = BTreeMap<String, String>;

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// Name of the person or group that published an observation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
}

impl Publisher {
    pub fn new(last_name: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            last_name: last_name.into(),
            first_name: first_name.into(),
        }
    }
}

/// Location where a recording was made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySite {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub country: String,
}

impl StudySite {
    pub fn new(
        city: impl Into<String>,
        state: impl Into<String>,
        province: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
            province: province.into(),
            country: country.into(),
        }
    }
}

/// One bioacoustic field observation.
///
/// `duid` is assigned by the service on create; `uuid` identifies the owner
/// and never changes afterwards. The four URL maps distinguish "absent"
/// (`None`, rejected by validation) from "empty" (allowed).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub duid: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default, rename = "publisherName", alias = "publisher")]
    pub publisher: Publisher,
    #[serde(default)]
    pub call_type_name: String,
    #[serde(default)]
    pub ground_type: String,
    #[serde(default)]
    pub study_site: StudySite,
    #[serde(default)]
    pub ocean: String,
    #[serde(default)]
    pub sensor_type: String,
    #[serde(default)]
    pub sensor_name: String,
    #[serde(default)]
    pub sampling_rate: u32,
    #[serde(default)]
    pub latitude: f32,
    #[serde(default)]
    pub longitude: f32,
    #[serde(default)]
    pub image_urls: Option<UrlMap>,
    #[serde(default)]
    pub audio_urls: Option<UrlMap>,
    #[serde(default)]
    pub video_urls: Option<UrlMap>,
    #[serde(default)]
    pub file_urls: Option<UrlMap>,
    #[serde(default)]
    pub record_timestamp: i64,
    #[serde(default)]
    pub create_timestamp: i64,
    #[serde(default)]
    pub update_timestamp: i64,
    #[serde(default)]
    pub is_public: bool,
}

impl Document {
    /// The URL map for a media kind.
    pub fn urls(&self, kind: MediaKind) -> Option<&UrlMap> {
        match kind {
            MediaKind::Image => self.image_urls.as_ref(),
            MediaKind::Audio => self.audio_urls.as_ref(),
            MediaKind::Video => self.video_urls.as_ref(),
            MediaKind::File => self.file_urls.as_ref(),
        }
    }

    /// Mutable slot for a media kind's URL map.
    pub fn urls_mut(&mut self, kind: MediaKind) -> &mut Option<UrlMap> {
        match kind {
            MediaKind::Image => &mut self.image_urls,
            MediaKind::Audio => &mut self.audio_urls,
            MediaKind::Video => &mut self.video_urls,
            MediaKind::File => &mut self.file_urls,
        }
    }

    /// True when at least one image or audio entry exists.
    pub fn has_image_or_audio(&self) -> bool {
        let non_empty = |m: Option<&UrlMap>| m.is_some_and(|m| !m.is_empty());
        non_empty(self.image_urls.as_ref()) || non_empty(self.audio_urls.as_ref())
    }
}

/// Selects one of a document's four URL maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    File,
}

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Image,
        MediaKind::Audio,
        MediaKind::Video,
        MediaKind::File,
    ];
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
            Self::File => write!(f, "file"),
        }
    }
}

/// The five recognised oceans. Parsing accepts an optional trailing "ocean"
/// token and ignores case and surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ocean {
    Pacific,
    Atlantic,
    Indian,
    Southern,
    Arctic,
}

impl FromStr for Ocean {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        let mut tokens = lowered.split_whitespace();
        let base = match tokens.next() {
            Some("pacific") => Self::Pacific,
            Some("atlantic") => Self::Atlantic,
            Some("indian") => Self::Indian,
            Some("southern") => Self::Southern,
            Some("arctic") => Self::Arctic,
            _ => return Err(crate::Error::InvalidOcean),
        };
        match (tokens.next(), tokens.next()) {
            (None, None) | (Some("ocean"), None) => Ok(base),
            _ => Err(crate::Error::InvalidOcean),
        }
    }
}

impl fmt::Display for Ocean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pacific => write!(f, "Pacific Ocean"),
            Self::Atlantic => write!(f, "Atlantic Ocean"),
            Self::Indian => write!(f, "Indian Ocean"),
            Self::Southern => write!(f, "Southern Ocean"),
            Self::Arctic => write!(f, "Arctic Ocean"),
        }
    }
}

// =============================================================================
// QUERY TYPES
// =============================================================================

/// Filter envelope for document queries, and result envelope for facet queries.
///
/// An empty list means "any value of this field".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTransaction {
    #[serde(default)]
    pub publishers: Vec<Publisher>,
    #[serde(default)]
    pub study_sites: Vec<StudySite>,
    #[serde(default)]
    pub call_type_names: Vec<String>,
    #[serde(default)]
    pub ground_types: Vec<String>,
    #[serde(default)]
    pub sensor_types: Vec<String>,
    #[serde(default)]
    pub sensor_names: Vec<String>,
    #[serde(default)]
    pub min_record_timestamp: i64,
    #[serde(default)]
    pub max_record_timestamp: i64,
}

/// Readiness of the service as seen by RPC entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Available,
    #[default]
    Unavailable,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_json_uses_camel_case_paths() {
        let doc = Document {
            publisher: Publisher::new("Kim", "Lisa"),
            study_site: StudySite::new("Seattle", "", "", "USA"),
            record_timestamp: 1514764800,
            ..Default::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["publisherName"]["lastName"], "Kim");
        assert_eq!(json["studySite"]["city"], "Seattle");
        assert_eq!(json["recordTimestamp"], 1514764800);
        assert!(json["imageUrls"].is_null());
    }

    #[test]
    fn test_absent_map_differs_from_empty_map() {
        let absent: Document = serde_json::from_str(r#"{"uuid":"x"}"#).unwrap();
        assert!(absent.image_urls.is_none());

        let empty: Document = serde_json::from_str(r#"{"uuid":"x","imageUrls":{}}"#).unwrap();
        assert_eq!(empty.image_urls, Some(UrlMap::new()));
    }

    #[test]
    fn test_publisher_alias_accepted() {
        let doc: Document =
            serde_json::from_str(r#"{"publisher":{"lastName":"Seger","firstName":"Kerri"}}"#)
                .unwrap();
        assert_eq!(doc.publisher, Publisher::new("Seger", "Kerri"));
    }

    #[test]
    fn test_has_image_or_audio() {
        let mut doc = Document::default();
        assert!(!doc.has_image_or_audio());

        doc.image_urls = Some(UrlMap::new());
        doc.audio_urls = Some(UrlMap::new());
        assert!(!doc.has_image_or_audio());

        doc.urls_mut(MediaKind::Audio)
            .get_or_insert_with(UrlMap::new)
            .insert("k".into(), "v".into());
        assert!(doc.has_image_or_audio());
    }

    #[test]
    fn test_ocean_parsing() {
        assert_eq!("Pacific".parse::<Ocean>().unwrap(), Ocean::Pacific);
        assert_eq!("INDIAN OCEAN".parse::<Ocean>().unwrap(), Ocean::Indian);
        assert_eq!(" Southern Ocean ".parse::<Ocean>().unwrap(), Ocean::Southern);
        assert!("Atlantic oceans".parse::<Ocean>().is_err());
        assert!("Indian 1 Ocean".parse::<Ocean>().is_err());
        assert!("Ocean".parse::<Ocean>().is_err());
        assert!("".parse::<Ocean>().is_err());
    }

    #[test]
    fn test_query_transaction_defaults_missing_lists() {
        let q: QueryTransaction = serde_json::from_str(r#"{"groundTypes":["beach"]}"#).unwrap();
        assert!(q.publishers.is_empty());
        assert_eq!(q.ground_types, vec!["beach".to_string()]);
        assert_eq!(q.min_record_timestamp, 0);
    }

    #[test]
    fn test_service_state_default_is_unavailable() {
        assert_eq!(ServiceState::default(), ServiceState::Unavailable);
        assert_eq!(ServiceState::Available.to_string(), "available");
    }
}
