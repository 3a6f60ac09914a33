//! PostgreSQL profile repository implementation

use async_trait::async_trait;
use serde_json::json;
use sqlx::{PgPool, Row};

use crate::domain::profile::{Profile, ProfileId, ProfileRepository};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// PostgreSQL implementation of `ProfileRepository`
///
/// Invitation set operations are single `array_append`/`array_remove`
/// statements; there is no application-side read-modify-write.
#[derive(Debug, Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PROFILE_COLUMNS: &str =
    "id, external_id, name, email, role, current_team_id, invitations, created_at, updated_at";

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn get(&self, id: &ProfileId) -> Result<Option<Profile>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get profile: {}", e)))?;

        row.as_ref().map(row_to_profile).transpose()
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Profile>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE external_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::storage(format!("Failed to get profile by external id: {}", e))
        })?;

        row.as_ref().map(row_to_profile).transpose()
    }

    async fn create(&self, profile: Profile) -> Result<Profile, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, external_id, name, email, role, current_team_id,
                                  invitations, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(profile.id().as_str())
        .bind(profile.external_id())
        .bind(profile.name())
        .bind(profile.email())
        .bind(profile.role().to_string())
        .bind(profile.current_team_id().map(|t| t.as_str()))
        .bind(
            profile
                .invitations()
                .iter()
                .map(|t| t.as_str().to_string())
                .collect::<Vec<_>>(),
        )
        .bind(profile.created_at())
        .bind(profile.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();

            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                if msg.contains("external_id") {
                    DomainError::conflict(format!(
                        "Profile with external identity '{}' already exists",
                        profile.external_id()
                    ))
                } else {
                    DomainError::conflict(format!(
                        "Profile '{}' already exists",
                        profile.id()
                    ))
                }
            } else {
                DomainError::storage(format!("Failed to create profile: {}", e))
            }
        })?;

        Ok(profile)
    }

    async fn update(&self, profile: &Profile) -> Result<Profile, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET name = $2, email = $3, role = $4, current_team_id = $5,
                invitations = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(profile.id().as_str())
        .bind(profile.name())
        .bind(profile.email())
        .bind(profile.role().to_string())
        .bind(profile.current_team_id().map(|t| t.as_str()))
        .bind(
            profile
                .invitations()
                .iter()
                .map(|t| t.as_str().to_string())
                .collect::<Vec<_>>(),
        )
        .bind(profile.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update profile: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Profile '{}' not found",
                profile.id()
            )));
        }

        Ok(profile.clone())
    }

    async fn set_current_team(
        &self,
        id: &ProfileId,
        team_id: Option<&TeamId>,
    ) -> Result<Profile, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE profiles SET current_team_id = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(id.as_str())
        .bind(team_id.map(|t| t.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to set current team: {}", e)))?;

        match row {
            Some(row) => row_to_profile(&row),
            None => Err(DomainError::not_found(format!(
                "Profile '{}' not found",
                id
            ))),
        }
    }

    async fn add_invitation(
        &self,
        id: &ProfileId,
        team_id: &TeamId,
    ) -> Result<Profile, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE profiles \
             SET invitations = array_append(invitations, $2), updated_at = NOW() \
             WHERE id = $1 AND NOT ($2 = ANY(invitations)) \
             RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(id.as_str())
        .bind(team_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to add invitation: {}", e)))?;

        if let Some(row) = row {
            return row_to_profile(&row);
        }

        // Either the profile is missing or the invitation already exists
        // (idempotent success).
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Profile '{}' not found", id)))
    }

    async fn remove_invitation(
        &self,
        id: &ProfileId,
        team_id: &TeamId,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE profiles \
             SET invitations = array_remove(invitations, $2), updated_at = NOW() \
             WHERE id = $1 AND $2 = ANY(invitations)",
        )
        .bind(id.as_str())
        .bind(team_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to remove invitation: {}", e)))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        if self.get(id).await?.is_none() {
            return Err(DomainError::not_found(format!(
                "Profile '{}' not found",
                id
            )));
        }

        Ok(false)
    }

    async fn detach_team(&self, team_id: &TeamId) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET current_team_id = CASE
                    WHEN current_team_id = $1 THEN NULL
                    ELSE current_team_id
                END,
                invitations = array_remove(invitations, $1),
                updated_at = NOW()
            WHERE current_team_id = $1 OR $1 = ANY(invitations)
            "#,
        )
        .bind(team_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to detach team: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn list(&self) -> Result<Vec<Profile>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM profiles ORDER BY created_at",
            PROFILE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list profiles: {}", e)))?;

        rows.iter().map(row_to_profile).collect()
    }
}

fn row_to_profile(row: &sqlx::postgres::PgRow) -> Result<Profile, DomainError> {
    let current_team_id: Option<String> = row.get("current_team_id");
    let invitations: Vec<String> = row.get("invitations");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    let mut value = json!({
        "id": row.get::<String, _>("id"),
        "external_id": row.get::<String, _>("external_id"),
        "name": row.get::<String, _>("name"),
        "email": row.get::<String, _>("email"),
        "role": row.get::<String, _>("role"),
        "invitations": invitations,
        "created_at": created_at,
        "updated_at": updated_at,
    });

    if let Some(team_id) = current_team_id {
        value["current_team_id"] = json!(team_id);
    }

    serde_json::from_value(value)
        .map_err(|e| DomainError::storage(format!("Invalid profile row: {}", e)))
}
