//! PostgreSQL team repository implementation

use async_trait::async_trait;
use serde_json::json;
use sqlx::{PgPool, Row};

use crate::domain::profile::ProfileId;
use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::DomainError;

/// PostgreSQL implementation of `TeamRepository`
///
/// Each conditional mutation is one guarded UPDATE: the lock-state check
/// and the membership set change land in the same statement. When the
/// guard fails (zero rows), a follow-up read classifies the failure; the
/// read happens after the atomic attempt and only names the reason.
#[derive(Debug, Clone)]
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: &TeamId) -> Result<Team, DomainError> {
        self.get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", id)))
    }

    fn locked_error(id: &TeamId) -> DomainError {
        DomainError::locked(format!(
            "Team '{}' is locked; membership can no longer change",
            id
        ))
    }
}

const TEAM_COLUMNS: &str =
    "id, name, leader_id, members, join_requests, is_locked, created_at, updated_at";

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM teams WHERE id = $1", TEAM_COLUMNS))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get team: {}", e)))?;

        row.as_ref().map(row_to_team).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM teams WHERE name = $1",
            TEAM_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get team by name: {}", e)))?;

        row.as_ref().map(row_to_team).transpose()
    }

    async fn find_by_member(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Option<Team>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM teams WHERE $1 = ANY(members)",
            TEAM_COLUMNS
        ))
        .bind(profile_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get team by member: {}", e)))?;

        row.as_ref().map(row_to_team).transpose()
    }

    async fn create(&self, team: Team) -> Result<Team, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO teams (id, name, leader_id, members, join_requests, is_locked,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(team.id().as_str())
        .bind(team.name())
        .bind(team.leader_id().as_str())
        .bind(
            team.members()
                .iter()
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>(),
        )
        .bind(
            team.join_requests()
                .iter()
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>(),
        )
        .bind(team.is_locked())
        .bind(team.created_at())
        .bind(team.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();

            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                if msg.contains("teams_name") || msg.contains("name") {
                    DomainError::conflict(format!(
                        "Team name '{}' is already taken",
                        team.name()
                    ))
                } else {
                    DomainError::conflict(format!("Team '{}' already exists", team.id()))
                }
            } else {
                DomainError::storage(format!("Failed to create team: {}", e))
            }
        })?;

        Ok(team)
    }

    async fn add_join_request(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE teams \
             SET join_requests = array_append(join_requests, $2), updated_at = NOW() \
             WHERE id = $1 AND NOT is_locked \
               AND NOT ($2 = ANY(join_requests)) AND NOT ($2 = ANY(members)) \
             RETURNING {}",
            TEAM_COLUMNS
        ))
        .bind(id.as_str())
        .bind(profile_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to add join request: {}", e)))?;

        if let Some(row) = row {
            return row_to_team(&row);
        }

        let team = self.fetch(id).await?;
        if team.is_locked() {
            Err(Self::locked_error(id))
        } else if team.is_member(profile_id) {
            Err(DomainError::conflict(format!(
                "Profile '{}' is already a member of team '{}'",
                profile_id, id
            )))
        } else {
            Err(DomainError::conflict(format!(
                "Profile '{}' already requested to join team '{}'",
                profile_id, id
            )))
        }
    }

    async fn remove_join_request(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE teams \
             SET join_requests = array_remove(join_requests, $2), updated_at = NOW() \
             WHERE id = $1 AND $2 = ANY(join_requests) \
             RETURNING {}",
            TEAM_COLUMNS
        ))
        .bind(id.as_str())
        .bind(profile_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to remove join request: {}", e)))?;

        match row {
            Some(row) => row_to_team(&row),
            None => {
                // Distinguish a missing team from a missing request
                self.fetch(id).await?;
                Err(DomainError::not_found(format!(
                    "No pending join request from profile '{}' on team '{}'",
                    profile_id, id
                )))
            }
        }
    }

    async fn approve_member(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE teams \
             SET join_requests = array_remove(join_requests, $2), \
                 members = array_append(members, $2), updated_at = NOW() \
             WHERE id = $1 AND NOT is_locked AND $2 = ANY(join_requests) \
             RETURNING {}",
            TEAM_COLUMNS
        ))
        .bind(id.as_str())
        .bind(profile_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to approve member: {}", e)))?;

        if let Some(row) = row {
            return row_to_team(&row);
        }

        let team = self.fetch(id).await?;
        if team.is_locked() {
            Err(Self::locked_error(id))
        } else {
            Err(DomainError::not_found(format!(
                "No pending join request from profile '{}' on team '{}'",
                profile_id, id
            )))
        }
    }

    async fn remove_member(
        &self,
        id: &TeamId,
        profile_id: &ProfileId,
    ) -> Result<Team, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE teams \
             SET members = array_remove(members, $2), updated_at = NOW() \
             WHERE id = $1 AND NOT is_locked AND leader_id <> $2 AND $2 = ANY(members) \
             RETURNING {}",
            TEAM_COLUMNS
        ))
        .bind(id.as_str())
        .bind(profile_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to remove member: {}", e)))?;

        if let Some(row) = row {
            return row_to_team(&row);
        }

        let team = self.fetch(id).await?;
        if team.is_locked() {
            Err(Self::locked_error(id))
        } else if team.is_leader(profile_id) {
            Err(DomainError::validation(format!(
                "Leader '{}' cannot be removed from team '{}'; the team must be disbanded",
                profile_id, id
            )))
        } else {
            Err(DomainError::not_found(format!(
                "Profile '{}' is not a member of team '{}'",
                profile_id, id
            )))
        }
    }

    async fn lock(&self, id: &TeamId) -> Result<Team, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE teams \
             SET updated_at = CASE WHEN is_locked THEN updated_at ELSE NOW() END, \
                 is_locked = TRUE \
             WHERE id = $1 \
             RETURNING {}",
            TEAM_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to lock team: {}", e)))?;

        match row {
            Some(row) => row_to_team(&row),
            None => Err(DomainError::not_found(format!("Team '{}' not found", id))),
        }
    }

    async fn delete(&self, id: &TeamId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete team: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_team(row: &sqlx::postgres::PgRow) -> Result<Team, DomainError> {
    let members: Vec<String> = row.get("members");
    let join_requests: Vec<String> = row.get("join_requests");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    let value = json!({
        "id": row.get::<String, _>("id"),
        "name": row.get::<String, _>("name"),
        "leader_id": row.get::<String, _>("leader_id"),
        "members": members,
        "join_requests": join_requests,
        "is_locked": row.get::<bool, _>("is_locked"),
        "created_at": created_at,
        "updated_at": updated_at,
    });

    serde_json::from_value(value)
        .map_err(|e| DomainError::storage(format!("Invalid team row: {}", e)))
}
