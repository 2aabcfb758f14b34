use serde::{Deserialize, Serialize};

/// The signed-in account, as kept by the credential store.
///
/// `id` is the account id the order service expects as `customerId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserIdentity {
    /// Creates an identity with only the account id set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
        }
    }
}
