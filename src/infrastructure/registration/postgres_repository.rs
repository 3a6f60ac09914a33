//! PostgreSQL registration repository implementation

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use sqlx::{PgPool, Row};

use crate::domain::profile::ProfileId;
use crate::domain::registration::{
    ManualVerification, PaidOutcome, PaymentAttempt, PaymentStatus, Registration,
    RegistrationId, RegistrationQuery, RegistrationRepository,
};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// PostgreSQL implementation of `RegistrationRepository`
///
/// The (team, event) and order-id uniqueness rules live in partial unique
/// indexes, so `create` is a plain INSERT whose violation maps to a
/// conflict. Payment transitions are single guarded UPDATEs that append
/// the audit entry in the same statement.
#[derive(Debug, Clone)]
pub struct PostgresRegistrationRepository {
    pool: PgPool,
}

impl PostgresRegistrationRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_by_order(&self, order_id: &str) -> Result<Registration, DomainError> {
        self.find_by_order_id(order_id).await?.ok_or_else(|| {
            DomainError::not_found(format!(
                "No registration found for order '{}'",
                order_id
            ))
        })
    }
}

const REGISTRATION_COLUMNS: &str = "id, team_id, event_id, selected_members, payment_status, \
     amount_expected, amount_paid, razorpay_order_id, razorpay_payment_id, \
     razorpay_signature, payment_attempts, manual_verifications, checked_in, \
     created_at, updated_at";

#[async_trait]
impl RegistrationRepository for PostgresRegistrationRepository {
    async fn get(&self, id: &RegistrationId) -> Result<Option<Registration>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM registrations WHERE id = $1",
            REGISTRATION_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get registration: {}", e)))?;

        row.as_ref().map(row_to_registration).transpose()
    }

    async fn create(&self, registration: Registration) -> Result<Registration, DomainError> {
        let members: Vec<String> = registration
            .selected_members()
            .iter()
            .map(|m| m.as_str().to_string())
            .collect();
        let attempts = serde_json::to_value(registration.payment_attempts())
            .map_err(|e| DomainError::internal(format!("Failed to encode attempts: {}", e)))?;

        let result = match registration.team_id() {
            Some(team_id) => sqlx::query(
                r#"
                INSERT INTO registrations (id, team_id, event_id, selected_members,
                    payment_status, amount_expected, amount_paid, razorpay_order_id,
                    payment_attempts, checked_in, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(registration.id().as_str())
            .bind(team_id.as_str())
            .bind(registration.event_id().as_str())
            .bind(&members)
            .bind(registration.payment_status().to_string())
            .bind(registration.amount_expected())
            .bind(registration.amount_paid())
            .bind(registration.razorpay_order_id())
            .bind(&attempts)
            .bind(registration.is_checked_in())
            .bind(registration.created_at())
            .bind(registration.updated_at())
            .execute(&self.pool)
            .await,
            // Individual entries have no pair index to lean on; the
            // overlap check and the insert form one statement instead.
            None => sqlx::query(
                r#"
                INSERT INTO registrations (id, team_id, event_id, selected_members,
                    payment_status, amount_expected, amount_paid, razorpay_order_id,
                    payment_attempts, checked_in, created_at, updated_at)
                SELECT $1, NULL, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
                WHERE NOT EXISTS (
                    SELECT 1 FROM registrations
                    WHERE event_id = $2 AND selected_members && $3::text[]
                )
                "#,
            )
            .bind(registration.id().as_str())
            .bind(registration.event_id().as_str())
            .bind(&members)
            .bind(registration.payment_status().to_string())
            .bind(registration.amount_expected())
            .bind(registration.amount_paid())
            .bind(registration.razorpay_order_id())
            .bind(&attempts)
            .bind(registration.is_checked_in())
            .bind(registration.created_at())
            .bind(registration.updated_at())
            .execute(&self.pool)
            .await,
        };

        let result = result.map_err(|e| {
            let msg = e.to_string();

            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                if msg.contains("registrations_order") {
                    DomainError::conflict(format!(
                        "Order '{}' is already attached to a registration",
                        registration.razorpay_order_id().unwrap_or_default()
                    ))
                } else {
                    DomainError::conflict(format!(
                        "Team '{}' already has a registration for event '{}'",
                        registration
                            .team_id()
                            .map(|t| t.as_str())
                            .unwrap_or_default(),
                        registration.event_id()
                    ))
                }
            } else {
                DomainError::storage(format!("Failed to create registration: {}", e))
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::conflict(format!(
                "A selected member is already registered for event '{}'",
                registration.event_id()
            )));
        }

        Ok(registration)
    }

    async fn find_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<Registration>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM registrations WHERE razorpay_order_id = $1",
            REGISTRATION_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::storage(format!("Failed to get registration by order: {}", e))
        })?;

        row.as_ref().map(row_to_registration).transpose()
    }

    async fn mark_pending(&self, order_id: &str) -> Result<Registration, DomainError> {
        let attempt = serde_json::to_value(PaymentAttempt::now(PaymentStatus::Pending))
            .map_err(|e| DomainError::internal(format!("Failed to encode attempt: {}", e)))?;

        let row = sqlx::query(&format!(
            "UPDATE registrations \
             SET payment_status = 'pending', \
                 payment_attempts = payment_attempts || $2::jsonb, \
                 updated_at = NOW() \
             WHERE razorpay_order_id = $1 AND payment_status = 'initiated' \
             RETURNING {}",
            REGISTRATION_COLUMNS
        ))
        .bind(order_id)
        .bind(&attempt)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to mark pending: {}", e)))?;

        if let Some(row) = row {
            return row_to_registration(&row);
        }

        let existing = self.fetch_by_order(order_id).await?;
        Err(DomainError::conflict(format!(
            "Registration '{}' is '{}', cannot move to pending",
            existing.id(),
            existing.payment_status()
        )))
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<PaidOutcome, DomainError> {
        let attempt = serde_json::to_value(
            PaymentAttempt::now(PaymentStatus::Paid).with_order_id(order_id),
        )
        .map_err(|e| DomainError::internal(format!("Failed to encode attempt: {}", e)))?;

        let row = sqlx::query(&format!(
            "UPDATE registrations \
             SET payment_status = 'paid', \
                 razorpay_payment_id = $2, \
                 razorpay_signature = $3, \
                 amount_paid = amount_expected, \
                 payment_attempts = payment_attempts || $4::jsonb, \
                 updated_at = NOW() \
             WHERE razorpay_order_id = $1 AND payment_status <> 'paid' \
             RETURNING {}",
            REGISTRATION_COLUMNS
        ))
        .bind(order_id)
        .bind(payment_id)
        .bind(signature)
        .bind(&attempt)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to mark paid: {}", e)))?;

        match row {
            Some(row) => Ok(PaidOutcome::Transitioned(row_to_registration(&row)?)),
            // Zero rows means either no such order or a paid one; the
            // read settles which.
            None => Ok(PaidOutcome::AlreadyPaid(self.fetch_by_order(order_id).await?)),
        }
    }

    async fn apply_manual_verification(
        &self,
        id: &RegistrationId,
        verification: ManualVerification,
    ) -> Result<Registration, DomainError> {
        let target = verification.action.target_status();
        let attempt = serde_json::to_value(
            PaymentAttempt::now(target).with_note(verification.notes.clone()),
        )
        .map_err(|e| DomainError::internal(format!("Failed to encode attempt: {}", e)))?;
        let record = serde_json::to_value(&verification)
            .map_err(|e| DomainError::internal(format!("Failed to encode override: {}", e)))?;

        let row = sqlx::query(&format!(
            "UPDATE registrations \
             SET payment_status = $2, \
                 amount_paid = CASE WHEN $2 = 'manual_verified' \
                                    THEN amount_expected ELSE amount_paid END, \
                 manual_verifications = manual_verifications || $3::jsonb, \
                 payment_attempts = payment_attempts || $4::jsonb, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {}",
            REGISTRATION_COLUMNS
        ))
        .bind(id.as_str())
        .bind(target.to_string())
        .bind(&record)
        .bind(&attempt)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to apply override: {}", e)))?;

        match row {
            Some(row) => row_to_registration(&row),
            None => Err(DomainError::not_found(format!(
                "Registration '{}' not found",
                id
            ))),
        }
    }

    async fn check_in(&self, id: &RegistrationId) -> Result<Registration, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE registrations \
             SET checked_in = TRUE, updated_at = NOW() \
             WHERE id = $1 AND NOT checked_in \
               AND payment_status IN ('paid', 'manual_verified') \
             RETURNING {}",
            REGISTRATION_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to check in: {}", e)))?;

        if let Some(row) = row {
            return row_to_registration(&row);
        }

        let existing = self.get(id).await?.ok_or_else(|| {
            DomainError::not_found(format!("Registration '{}' not found", id))
        })?;

        if existing.is_checked_in() {
            Err(DomainError::conflict(format!(
                "Registration '{}' is already checked in",
                id
            )))
        } else {
            Err(DomainError::conflict(format!(
                "Registration '{}' is '{}', cannot check in",
                id,
                existing.payment_status()
            )))
        }
    }

    async fn list_for_teams(
        &self,
        team_ids: &[TeamId],
    ) -> Result<Vec<Registration>, DomainError> {
        let ids: Vec<String> = team_ids.iter().map(|t| t.as_str().to_string()).collect();

        let rows = sqlx::query(&format!(
            "SELECT {} FROM registrations WHERE team_id = ANY($1) ORDER BY created_at",
            REGISTRATION_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list registrations: {}", e)))?;

        rows.iter().map(row_to_registration).collect()
    }

    async fn list_for_member(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Registration>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM registrations WHERE $1 = ANY(selected_members) \
             ORDER BY created_at",
            REGISTRATION_COLUMNS
        ))
        .bind(profile_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list registrations: {}", e)))?;

        rows.iter().map(row_to_registration).collect()
    }

    async fn list(
        &self,
        query: &RegistrationQuery,
    ) -> Result<Vec<Registration>, DomainError> {
        let event_id = query.event_id.as_ref().map(|e| e.as_str().to_string());
        let status = query.status.map(|s| s.to_string());

        let rows = sqlx::query(&format!(
            "SELECT {} FROM registrations \
             WHERE ($1::varchar IS NULL OR event_id = $1) \
               AND ($2::varchar IS NULL OR payment_status = $2) \
             ORDER BY created_at",
            REGISTRATION_COLUMNS
        ))
        .bind(event_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list registrations: {}", e)))?;

        rows.iter().map(row_to_registration).collect()
    }
}

fn row_to_registration(row: &sqlx::postgres::PgRow) -> Result<Registration, DomainError> {
    let members: Vec<String> = row.get("selected_members");
    let attempts: Value = row.get("payment_attempts");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    let mut value = Map::new();
    value.insert("id".into(), json!(row.get::<String, _>("id")));
    value.insert("event_id".into(), json!(row.get::<String, _>("event_id")));
    value.insert("selected_members".into(), json!(members));
    value.insert(
        "payment_status".into(),
        json!(row.get::<String, _>("payment_status")),
    );
    value.insert(
        "amount_expected".into(),
        json!(row.get::<i64, _>("amount_expected")),
    );
    value.insert("amount_paid".into(), json!(row.get::<i64, _>("amount_paid")));
    value.insert("payment_attempts".into(), attempts);
    value.insert("checked_in".into(), json!(row.get::<bool, _>("checked_in")));
    value.insert("created_at".into(), json!(created_at));
    value.insert("updated_at".into(), json!(updated_at));

    if let Some(team_id) = row.get::<Option<String>, _>("team_id") {
        value.insert("team_id".into(), json!(team_id));
    }

    if let Some(order_id) = row.get::<Option<String>, _>("razorpay_order_id") {
        value.insert("razorpay_order_id".into(), json!(order_id));
    }

    if let Some(payment_id) = row.get::<Option<String>, _>("razorpay_payment_id") {
        value.insert("razorpay_payment_id".into(), json!(payment_id));
    }

    if let Some(signature) = row.get::<Option<String>, _>("razorpay_signature") {
        value.insert("razorpay_signature".into(), json!(signature));
    }

    value.insert(
        "manual_verifications".into(),
        row.get::<Value, _>("manual_verifications"),
    );

    serde_json::from_value(Value::Object(value))
        .map_err(|e| DomainError::storage(format!("Invalid registration row: {}", e)))
}
