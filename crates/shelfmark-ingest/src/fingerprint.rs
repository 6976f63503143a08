//! Content fingerprint sent with upload requests.

use chrono::Utc;
use shelfmark_core::ContentFingerprint;

/// Hash and size `bytes`, stamped with the current wall-clock time.
pub fn fingerprint(bytes: &[u8]) -> ContentFingerprint {
    fingerprint_at(bytes, Utc::now().timestamp_millis())
}

/// Same as [`fingerprint`] with a caller-supplied modification time.
pub fn fingerprint_at(bytes: &[u8], mtime_millis: i64) -> ContentFingerprint {
    ContentFingerprint {
        md5: format!("{:x}", md5::compute(bytes)),
        length: bytes.len() as u64,
        mtime: mtime_millis,
    }
}
