//! Field-level validators, one per document attribute.
//!
//! Text fields treat whitespace-only values as blank. Identifiers must match
//! their pattern exactly, surrounding whitespace included. Length bounds are
//! inclusive and counted in characters.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::defaults::{
    DUID_LEN, EARLIEST_RECORD_TIMESTAMP, FUID_LEN, MAX_CITY_LEN, MAX_COUNTRY_LEN,
    MAX_FIRST_NAME_LEN, MAX_LAST_NAME_LEN, MAX_PROVINCE_LEN, MAX_SAMPLING_RATE, MAX_STATE_LEN,
    MAX_TERM_LEN, UUID_LEN,
};
use crate::error::{Error, Result};
use crate::models::{MediaKind, Ocean, Publisher, StudySite, UrlMap};
use crate::traits::UrlProbe;

static DUID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^[0-9A-Za-z]{{{DUID_LEN}}}$")).unwrap());

static UUID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^[0-9A-Za-z]{{{UUID_LEN}}}$")).unwrap());

static FUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static IMAGE_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(jpg|jpeg|png|bmp|tif|gif|tiff)$").unwrap());

static AUDIO_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(wav|wma|ogg|m4a|mp3)$").unwrap());

static VIDEO_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(flv|wmv|mov|avi|mp4)$").unwrap());

/// Non-blank and at most `max` characters.
fn is_present_within(value: &str, max: usize) -> bool {
    !value.trim().is_empty() && value.chars().count() <= max
}

/// Possibly empty, at most `max` characters.
fn is_within(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

/// DUID: empty (not yet assigned) or exactly 27 base-62 characters.
pub fn validate_duid(duid: &str) -> Result<()> {
    if duid.is_empty() || DUID_PATTERN.is_match(duid) {
        Ok(())
    } else {
        Err(Error::InvalidDuid)
    }
}

/// Owner UUID: exactly 26 alphanumeric characters.
pub fn validate_uuid(uuid: &str) -> Result<()> {
    if UUID_PATTERN.is_match(uuid) {
        Ok(())
    } else {
        Err(Error::InvalidUuid)
    }
}

/// FUID: canonical lower-case 8-4-4-4-12 hex.
pub fn validate_fuid(fuid: &str) -> Result<()> {
    if fuid.len() == FUID_LEN && FUID_PATTERN.is_match(fuid) {
        Ok(())
    } else {
        Err(Error::InvalidFuid)
    }
}

pub fn validate_last_name(last_name: &str) -> Result<()> {
    if is_present_within(last_name, MAX_LAST_NAME_LEN) {
        Ok(())
    } else {
        Err(Error::InvalidLastName)
    }
}

pub fn validate_first_name(first_name: &str) -> Result<()> {
    if is_present_within(first_name, MAX_FIRST_NAME_LEN) {
        Ok(())
    } else {
        Err(Error::InvalidFirstName)
    }
}

/// Last name first, then first name.
pub fn validate_publisher(publisher: &Publisher) -> Result<()> {
    validate_last_name(&publisher.last_name)?;
    validate_first_name(&publisher.first_name)
}

pub fn validate_call_type_name(call_type_name: &str) -> Result<()> {
    if is_present_within(call_type_name, MAX_TERM_LEN) {
        Ok(())
    } else {
        Err(Error::InvalidCallTypeName)
    }
}

pub fn validate_ground_type(ground_type: &str) -> Result<()> {
    if is_present_within(ground_type, MAX_TERM_LEN) {
        Ok(())
    } else {
        Err(Error::InvalidGroundType)
    }
}

pub fn validate_city(city: &str) -> Result<()> {
    if is_present_within(city, MAX_CITY_LEN) {
        Ok(())
    } else {
        Err(Error::InvalidCity)
    }
}

/// State may be empty.
pub fn validate_state(state: &str) -> Result<()> {
    if is_within(state, MAX_STATE_LEN) {
        Ok(())
    } else {
        Err(Error::InvalidState)
    }
}

/// Province may be empty.
pub fn validate_province(province: &str) -> Result<()> {
    if is_within(province, MAX_PROVINCE_LEN) {
        Ok(())
    } else {
        Err(Error::InvalidProvince)
    }
}

pub fn validate_country(country: &str) -> Result<()> {
    if is_present_within(country, MAX_COUNTRY_LEN) {
        Ok(())
    } else {
        Err(Error::InvalidCountry)
    }
}

/// City, state, province, country, in that order.
pub fn validate_study_site(site: &StudySite) -> Result<()> {
    validate_city(&site.city)?;
    validate_state(&site.state)?;
    validate_province(&site.province)?;
    validate_country(&site.country)
}

pub fn validate_ocean(ocean: &str) -> Result<()> {
    ocean.parse::<Ocean>().map(|_| ())
}

pub fn validate_sensor_type(sensor_type: &str) -> Result<()> {
    if is_present_within(sensor_type, MAX_TERM_LEN) {
        Ok(())
    } else {
        Err(Error::InvalidSensorType)
    }
}

pub fn validate_sensor_name(sensor_name: &str) -> Result<()> {
    if is_present_within(sensor_name, MAX_TERM_LEN) {
        Ok(())
    } else {
        Err(Error::InvalidSensorName)
    }
}

pub fn validate_sampling_rate(sampling_rate: u32) -> Result<()> {
    if sampling_rate <= MAX_SAMPLING_RATE {
        Ok(())
    } else {
        Err(Error::InvalidSamplingRate)
    }
}

pub fn validate_latitude(latitude: f32) -> Result<()> {
    if (-90.0..=90.0).contains(&latitude) {
        Ok(())
    } else {
        Err(Error::InvalidLatitude)
    }
}

pub fn validate_longitude(longitude: f32) -> Result<()> {
    if (-180.0..=180.0).contains(&longitude) {
        Ok(())
    } else {
        Err(Error::InvalidLongitude)
    }
}

fn absent_map_error(kind: MediaKind) -> Error {
    match kind {
        MediaKind::Image => Error::NilImageUrls,
        MediaKind::Audio => Error::NilAudioUrls,
        MediaKind::Video => Error::NilVideoUrls,
        MediaKind::File => Error::NilFileUrls,
    }
}

/// Lower-cased extension of the last path segment, ignoring query and
/// fragment. `None` when the segment has no dot.
fn path_extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let segment = path.rsplit('/').next()?;
    let (_, extension) = segment.rsplit_once('.')?;
    Some(extension.to_lowercase())
}

/// Shape check for one URL value: non-blank, and for image/audio/video the
/// extension of the URL's last path segment must be one of the kind's.
pub fn validate_media_url(kind: MediaKind, url: &str) -> Result<()> {
    let (blank, extension): (Error, Option<(&Regex, Error)>) = match kind {
        MediaKind::Image => (
            Error::InvalidImageUrl,
            Some((&*IMAGE_EXTENSION, Error::ImageKindMismatch)),
        ),
        MediaKind::Audio => (
            Error::InvalidAudioUrl,
            Some((&*AUDIO_EXTENSION, Error::AudioKindMismatch)),
        ),
        MediaKind::Video => (
            Error::InvalidVideoUrl,
            Some((&*VIDEO_EXTENSION, Error::VideoKindMismatch)),
        ),
        MediaKind::File => (Error::InvalidFileUrl, None),
    };

    if url.trim().is_empty() {
        return Err(blank);
    }
    match extension {
        Some((re, mismatch)) => match path_extension(url) {
            Some(ext) if re.is_match(&ext) => Ok(()),
            _ => Err(mismatch),
        },
        None => Ok(()),
    }
}

/// Validate one URL map: present, then per entry in key order the FUID,
/// the URL shape, and finally reachability through `probe`.
pub async fn validate_url_map(
    kind: MediaKind,
    urls: Option<&UrlMap>,
    probe: &dyn UrlProbe,
) -> Result<()> {
    let urls = urls.ok_or_else(|| absent_map_error(kind))?;
    for (fuid, url) in urls {
        validate_fuid(fuid)?;
        validate_media_url(kind, url)?;
        probe.probe(url).await?;
    }
    Ok(())
}

pub async fn validate_image_urls(urls: Option<&UrlMap>, probe: &dyn UrlProbe) -> Result<()> {
    validate_url_map(MediaKind::Image, urls, probe).await
}

pub async fn validate_audio_urls(urls: Option<&UrlMap>, probe: &dyn UrlProbe) -> Result<()> {
    validate_url_map(MediaKind::Audio, urls, probe).await
}

pub async fn validate_video_urls(urls: Option<&UrlMap>, probe: &dyn UrlProbe) -> Result<()> {
    validate_url_map(MediaKind::Video, urls, probe).await
}

pub async fn validate_file_urls(urls: Option<&UrlMap>, probe: &dyn UrlProbe) -> Result<()> {
    validate_url_map(MediaKind::File, urls, probe).await
}

/// Record time must fall in `[EARLIEST_RECORD_TIMESTAMP, now]`.
pub fn validate_record_timestamp(record: i64, now: i64) -> Result<()> {
    if (EARLIEST_RECORD_TIMESTAMP..=now).contains(&record) {
        Ok(())
    } else {
        Err(Error::InvalidRecordTimestamp)
    }
}

/// Zero means unset; otherwise `[record, now]`.
pub fn validate_create_timestamp(create: i64, record: i64, now: i64) -> Result<()> {
    if create == 0 || (record..=now).contains(&create) {
        Ok(())
    } else {
        Err(Error::InvalidCreateTimestamp)
    }
}

/// Zero means unset; otherwise `[create, now]`.
pub fn validate_update_timestamp(update: i64, create: i64, now: i64) -> Result<()> {
    if update == 0 || (create..=now).contains(&update) {
        Ok(())
    } else {
        Err(Error::InvalidUpdateTimestamp)
    }
}
