//! Type-safe ID wrappers.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            /// Check if this ID is empty.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Get the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_owned())
            }
        }

        impl From<&String> for $name {
            fn from(s: &String) -> Self {
                $name(s.clone())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(MessageId, "A message identifier (ULID).");
define_id!(ChannelId, "A channel identifier.");
define_id!(UserId, "A user identifier.");
define_id!(ServerId, "A server identifier.");
define_id!(AttachmentId, "An uploaded file identifier.");

/// Crockford base32 alphabet used by ULIDs.
const CROCKFORD: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Number of leading ULID characters holding the timestamp.
const ULID_TIME_LEN: usize = 10;

fn crockford_value(c: u8) -> Option<u64> {
    let c = c.to_ascii_uppercase();
    CROCKFORD.iter().position(|&a| a == c).map(|p| p as u64)
}

/// Decode the millisecond timestamp embedded in a ULID string.
pub fn ulid_timestamp_ms(ulid: &str) -> Option<i64> {
    let bytes = ulid.as_bytes();
    if bytes.len() < ULID_TIME_LEN {
        return None;
    }

    let mut value: u64 = 0;
    for &b in &bytes[..ULID_TIME_LEN] {
        value = (value << 5) | crockford_value(b)?;
    }

    // 10 chars carry 50 bits, but the timestamp is only 48.
    if value >> 48 != 0 {
        return None;
    }

    i64::try_from(value).ok()
}

/// Encode a millisecond timestamp as the 10-character ULID time prefix.
pub fn ulid_time_prefix(ms: u64) -> String {
    let mut out = [b'0'; ULID_TIME_LEN];
    let mut value = ms & ((1 << 48) - 1);
    for slot in out.iter_mut().rev() {
        *slot = CROCKFORD[(value & 0x1f) as usize];
        value >>= 5;
    }
    out.iter().map(|&b| b as char).collect()
}

impl MessageId {
    /// Creation time in Unix milliseconds, decoded from the ULID.
    pub fn timestamp_ms(&self) -> Option<i64> {
        ulid_timestamp_ms(&self.0)
    }

    /// Creation time as a UTC datetime.
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.timestamp_ms()
            .and_then(chrono::DateTime::from_timestamp_millis)
    }
}
