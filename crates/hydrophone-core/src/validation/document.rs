//! Whole-document validation.
//!
//! Field validators run in a fixed order and the first failure wins, so a
//! document with several problems always reports the same error. URL maps are
//! probed only after every shape check before them has passed.

use chrono::Utc;

use super::fields::*;
use crate::error::{Error, Result};
use crate::models::Document;
use crate::traits::UrlProbe;

/// Validate `doc` against the current wall clock.
pub async fn validate_document(doc: &Document, probe: &dyn UrlProbe) -> Result<()> {
    validate_document_at(doc, probe, Utc::now().timestamp()).await
}

/// Validate `doc` with an explicit "now" in seconds since the epoch.
pub async fn validate_document_at(doc: &Document, probe: &dyn UrlProbe, now: i64) -> Result<()> {
    validate_duid(&doc.duid)?;
    validate_uuid(&doc.uuid)?;
    validate_publisher(&doc.publisher)?;
    validate_call_type_name(&doc.call_type_name)?;
    validate_ground_type(&doc.ground_type)?;
    validate_study_site(&doc.study_site)?;
    validate_ocean(&doc.ocean)?;
    validate_sensor_type(&doc.sensor_type)?;
    validate_sensor_name(&doc.sensor_name)?;
    validate_sampling_rate(doc.sampling_rate)?;
    validate_latitude(doc.latitude)?;
    validate_longitude(doc.longitude)?;
    validate_image_urls(doc.image_urls.as_ref(), probe).await?;
    validate_audio_urls(doc.audio_urls.as_ref(), probe).await?;
    validate_video_urls(doc.video_urls.as_ref(), probe).await?;
    validate_file_urls(doc.file_urls.as_ref(), probe).await?;
    validate_record_timestamp(doc.record_timestamp, now)?;
    validate_create_timestamp(doc.create_timestamp, doc.record_timestamp, now)?;
    validate_update_timestamp(doc.update_timestamp, doc.create_timestamp, now)?;
    validate_has_image_or_audio(doc)
}

/// At least one image or audio entry must exist.
pub fn validate_has_image_or_audio(doc: &Document) -> Result<()> {
    if doc.has_image_or_audio() {
        Ok(())
    } else {
        Err(Error::AtLeastOneImageAudio)
    }
}
