//! Profile entity and related types

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{
    validate_display_name, validate_email, validate_external_id, validate_profile_id,
    ProfileValidationError,
};
use crate::domain::team::TeamId;

/// Profile identifier - alphanumeric + hyphens, max 50 characters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileId(String);

impl ProfileId {
    /// Create a new ProfileId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, ProfileValidationError> {
        let id = id.into();
        validate_profile_id(&id)?;
        Ok(Self(id))
    }

    /// Mint a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProfileId {
    type Error = ProfileValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProfileId> for String {
    fn from(id: ProfileId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Global role of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular participant
    #[default]
    User,
    /// Event administrator
    Admin,
    /// Full administrative control
    Superadmin,
}

impl UserRole {
    /// Whether the role grants administrative capabilities
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::Superadmin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
            Self::Superadmin => write!(f, "superadmin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::Superadmin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Profile entity
///
/// Created on a participant's first authenticated visit and never
/// hard-deleted. Holds at most one team affiliation at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique identifier
    id: ProfileId,
    /// External authenticated identity key (unique)
    external_id: String,
    /// Display name
    name: String,
    /// Contact email
    email: String,
    /// Global role
    role: UserRole,
    /// Team this profile currently belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    current_team_id: Option<TeamId>,
    /// Pending team invitations
    #[serde(default)]
    invitations: BTreeSet<TeamId>,
    /// Creation timestamp
    created_at: DateTime<Utc>,
    /// Last update timestamp
    updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create a new profile
    pub fn new(
        id: ProfileId,
        external_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, ProfileValidationError> {
        let external_id = external_id.into();
        let name = name.into();
        let email = email.into();

        validate_external_id(&external_id)?;
        validate_display_name(&name)?;
        validate_email(&email)?;

        let now = Utc::now();

        Ok(Self {
            id,
            external_id,
            name,
            email,
            role: UserRole::User,
            current_team_id: None,
            invitations: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Set the role (builder pattern)
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    // Getters

    pub fn id(&self) -> &ProfileId {
        &self.id
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn current_team_id(&self) -> Option<&TeamId> {
        self.current_team_id.as_ref()
    }

    pub fn invitations(&self) -> &BTreeSet<TeamId> {
        &self.invitations
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the profile is currently affiliated with a team
    pub fn is_teamed(&self) -> bool {
        self.current_team_id.is_some()
    }

    // Mutators

    /// Update the display name
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ProfileValidationError> {
        let name = name.into();
        validate_display_name(&name)?;
        self.name = name;
        self.touch();
        Ok(())
    }

    /// Record the team this profile now belongs to
    pub fn set_current_team(&mut self, team_id: TeamId) {
        self.current_team_id = Some(team_id);
        self.touch();
    }

    /// Detach the profile from its team
    pub fn clear_current_team(&mut self) {
        self.current_team_id = None;
        self.touch();
    }

    /// Add a pending invitation, returns false if it was already present
    pub fn add_invitation(&mut self, team_id: TeamId) -> bool {
        let added = self.invitations.insert(team_id);
        if added {
            self.touch();
        }
        added
    }

    /// Remove a pending invitation, returns false if it was not present
    pub fn remove_invitation(&mut self, team_id: &TeamId) -> bool {
        let removed = self.invitations.remove(team_id);
        if removed {
            self.touch();
        }
        removed
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
