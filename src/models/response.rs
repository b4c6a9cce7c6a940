//! Stored response snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A full, replayable copy of a response.
///
/// A live response body can be consumed at most once, so the agent never
/// stores or returns one directly: the router clones a snapshot before
/// the cache write and the caller each take their copy (clone-before-
/// branch). Snapshots are `Clone` precisely so that rule is cheap to
/// follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub cached_at: DateTime<Utc>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            cached_at: Utc::now(),
        }
    }

    /// 2xx check, used by install to reject broken manifest entries.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Minutes since this snapshot was stored. Used for logging only;
    /// the router never revalidates on age.
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_snapshot_is_success() {
        let ok = ResponseSnapshot::new(200, HashMap::new(), b"ok".to_vec());
        let redirect = ResponseSnapshot::new(301, HashMap::new(), Vec::new());
        let missing = ResponseSnapshot::new(404, HashMap::new(), Vec::new());

        assert!(ok.is_success());
        assert!(!redirect.is_success());
        assert!(!missing.is_success());
    }

    #[test]
    fn test_snapshot_age_minutes() {
        let fresh = ResponseSnapshot::new(200, HashMap::new(), Vec::new());
        assert!(fresh.age_minutes() <= 1);

        let mut old = ResponseSnapshot::new(200, HashMap::new(), Vec::new());
        old.cached_at = Utc::now() - Duration::minutes(90);
        assert!(old.age_minutes() >= 90);
    }

    #[test]
    fn test_snapshot_body_text() {
        let snapshot = ResponseSnapshot::new(200, HashMap::new(), b"<html></html>".to_vec());
        assert_eq!(snapshot.body_text(), "<html></html>");
    }
}
