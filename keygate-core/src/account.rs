use serde::{Deserialize, Serialize};

/// Numeric account identifier, as stored for the bound identity.
pub type UserId = u64;

/// Role that may manage Keygate settings and is picked at bootstrap.
pub const ROLE_ADMINISTRATOR: &str = "administrator";

/// A user account served by the host's user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,

    pub login: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub roles: Vec<String>,
}

impl Account {
    pub fn new(id: UserId, login: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            id,
            display_name: login.clone(),
            login,
            roles: Vec::new(),
        }
    }

    /// Builder-style role assignment.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_administrator(&self) -> bool {
        self.has_role(ROLE_ADMINISTRATOR)
    }
}
