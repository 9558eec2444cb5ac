//! User profile document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wildthread_core::Email;

/// Profile document written to `users/{uid}` at sign-up.
///
/// The identity service owns credentials; this is only the display data the
/// original registration flow records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Display name entered on the registration form.
    pub name: String,
    /// Email the account was created with.
    pub email: Email,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a profile stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, email: Email) -> Self {
        Self {
            name: name.into(),
            email,
            created_at: Utc::now(),
        }
    }
}
