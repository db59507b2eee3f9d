//! Centralized default constants for the hydrophone service.
//!
//! **This module is the single source of truth** for field bounds, timeouts
//! and configuration defaults. Other crates reference these constants instead
//! of defining their own magic numbers.

use std::time::Duration;

// =============================================================================
// FIELD BOUNDS
// =============================================================================

/// Maximum characters in a publisher last name.
pub const MAX_LAST_NAME_LEN: usize = 32;

/// Maximum characters in a publisher first name.
pub const MAX_FIRST_NAME_LEN: usize = 32;

/// Maximum characters for call type, ground type, sensor type and sensor name.
pub const MAX_TERM_LEN: usize = 64;

/// Maximum characters in a study site city.
pub const MAX_CITY_LEN: usize = 64;

/// Maximum characters in a study site state (may be empty).
pub const MAX_STATE_LEN: usize = 32;

/// Maximum characters in a study site province (may be empty).
pub const MAX_PROVINCE_LEN: usize = 48;

/// Maximum characters in a study site country.
pub const MAX_COUNTRY_LEN: usize = 64;

/// Upper bound on a recording's sampling rate, in Hz.
pub const MAX_SAMPLING_RATE: u32 = 4_000_000_000;

/// Earliest accepted record time: 1990-01-01T00:00:00Z.
pub const EARLIEST_RECORD_TIMESTAMP: i64 = 631_152_000;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Length of a base-62 document identifier.
pub const DUID_LEN: usize = 27;

/// Length of an owner identifier.
pub const UUID_LEN: usize = 26;

/// Length of a canonical file identifier.
pub const FUID_LEN: usize = 36;

// =============================================================================
// QUERY PIPELINE
// =============================================================================

/// Regex emitted as the sole `$in` element for an unconstrained filter.
pub const MATCH_ALL_PATTERN: &str = ".*";

// =============================================================================
// DATABASE
// =============================================================================

/// Bound applied to each database dial, ping and disconnect.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum connections per database handle.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Bound applied to each media URL reachability request.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// SERVER
// =============================================================================

/// Default RPC listen address.
pub const LISTEN_ADDRESS: &str = "0.0.0.0:50051";

/// Message carried by every successful RPC response.
pub const OK_MESSAGE: &str = "OK";
