/*
 * Responsibility
 * - User lookup collaborator contract (username -> record | not found)
 * - The identity type handlers see once a request is authenticated
 * - An in-memory directory (optionally loaded from a JSON file) for services
 *   that do not bring their own store
 */
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity attached to an authenticated request.
///
/// Rebuilt from the user store on every request; never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdentity {
    pub username: String,
    pub roles: BTreeSet<String>,
    pub enabled: bool,
}

impl ResolvedIdentity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// What the user store returns for a username.
#[derive(Clone, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Password hashes stay out of logs
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("roles", &self.roles)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl UserRecord {
    pub fn identity(&self) -> ResolvedIdentity {
        ResolvedIdentity {
            username: self.username.clone(),
            roles: self.roles.clone(),
            enabled: self.enabled,
        }
    }
}

/// Backend failure while looking a user up. "No such user" is `Ok(None)`, not an error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn lookup_user(&self, username: &str) -> Result<Option<UserRecord>, LookupError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to read user directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid user directory: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate username in user directory: {0}")]
    Duplicate(String),
}

/// Read-only user store held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<String, UserRecord>,
}

impl InMemoryUserDirectory {
    pub fn new(records: impl IntoIterator<Item = UserRecord>) -> Result<Self, DirectoryError> {
        let mut users = HashMap::new();
        for record in records {
            if users.contains_key(&record.username) {
                return Err(DirectoryError::Duplicate(record.username));
            }
            users.insert(record.username.clone(), record);
        }
        Ok(Self { users })
    }

    /// Load a JSON array of user records.
    ///
    /// ```json
    /// [{"username": "alice", "password_hash": "$argon2id$...", "roles": ["ROLE_USER"]}]
    /// ```
    pub fn from_json(raw: &str) -> Result<Self, DirectoryError> {
        let records: Vec<UserRecord> = serde_json::from_str(raw)?;
        Self::new(records)
    }

    pub fn from_file(path: &Path) -> Result<Self, DirectoryError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserLookup for InMemoryUserDirectory {
    async fn lookup_user(&self, username: &str) -> Result<Option<UserRecord>, LookupError> {
        Ok(self.users.get(username).cloned())
    }
}
