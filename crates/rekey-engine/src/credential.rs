//! The stored credential record the engine rotates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored web credential.
///
/// The orchestrator holds a read-only `original` and a progressively
/// refined `working` copy of this record. Only the password-generation
/// step may change `working.password`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque record id, assigned by the credential store.
    pub id: String,

    /// Origin the credential belongs to, e.g. "https://example.com".
    pub hostname: String,

    /// Account name. Some sites key accounts on email only.
    pub username: Option<String>,

    /// Current password.
    pub password: String,

    /// Origin the login form submits to, when known.
    #[serde(default)]
    pub form_submit_url: Option<String>,

    pub time_created: DateTime<Utc>,

    pub time_last_used: DateTime<Utc>,

    pub time_password_changed: DateTime<Utc>,

    #[serde(default)]
    pub times_used: u64,
}

impl Credential {
    /// Create a fresh record with all timestamps set to now.
    pub fn new(hostname: impl Into<String>, username: Option<String>, password: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            hostname: hostname.into(),
            username,
            password: password.into(),
            form_submit_url: None,
            time_created: now,
            time_last_used: now,
            time_password_changed: now,
            times_used: 0,
        }
    }

    /// Record a successful use of this credential.
    pub fn touch(&mut self) {
        self.time_last_used = Utc::now();
        self.times_used += 1;
    }

    /// Install a newly generated password and stamp the change time.
    pub fn set_password(&mut self, password: String) {
        self.password = password;
        self.time_password_changed = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_credential_has_consistent_timestamps() {
        let cred = Credential::new("https://example.com", Some("u1".into()), "p1");
        assert_eq!(cred.time_created, cred.time_last_used);
        assert_eq!(cred.time_created, cred.time_password_changed);
        assert_eq!(cred.times_used, 0);
    }

    #[test]
    fn touch_increments_use_count() {
        let mut cred = Credential::new("https://example.com", None, "p1");
        let created = cred.time_created;
        cred.touch();
        assert_eq!(cred.times_used, 1);
        assert!(cred.time_last_used >= created);
    }

    #[test]
    fn set_password_stamps_change_time() {
        let mut cred = Credential::new("https://example.com", None, "old");
        let before = cred.time_password_changed;
        cred.set_password("new".into());
        assert_eq!(cred.password, "new");
        assert!(cred.time_password_changed >= before);
    }

    #[test]
    fn roundtrips_through_json() {
        let cred = Credential::new("https://example.com", Some("u1".into()), "p1");
        let json = serde_json::to_string(&cred).unwrap();
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(cred, back);
    }
}
