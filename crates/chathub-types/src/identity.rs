//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

/// User id assigned by pass-through authentication.
pub const DEFAULT_USER_ID: &str = "c05c61eb-65e4-4223-915a-fe72b0c9ece1";

/// Display name assigned by pass-through authentication.
pub const DEFAULT_USER_NAME: &str = "Default User";

/// The user on whose behalf a request runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_id: String,
    pub user_name: String,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }

    /// The fixed identity granted by pass-through authentication.
    pub fn default_user() -> Self {
        Self::new(DEFAULT_USER_ID, DEFAULT_USER_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user() {
        let user = UserIdentity::default_user();
        assert_eq!(user.user_id, DEFAULT_USER_ID);
        assert_eq!(user.user_name, "Default User");
    }
}
