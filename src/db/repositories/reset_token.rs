use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::{password_reset_tokens, prelude::*};

#[derive(Debug, Clone)]
pub struct ResetToken {
    pub id: i32,
    pub user_id: i32,
    pub token: String,
    pub created_at: String,
}

impl ResetToken {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_expired(&self.created_at, now)
    }
}

pub struct ResetTokenRepository {
    conn: DatabaseConnection,
}

impl ResetTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Mint a fresh token for the user and return its value.
    pub async fn create(&self, user_id: i32) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        password_reset_tokens::ActiveModel {
            user_id: Set(user_id),
            token: Set(token.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert reset token")?;

        Ok(token)
    }

    /// Look up a token by owner and value; both must match.
    pub async fn find(&self, user_id: i32, token: &str) -> Result<Option<ResetToken>> {
        let row = PasswordResetTokens::find()
            .filter(password_reset_tokens::Column::UserId.eq(user_id))
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query reset token")?;

        Ok(row.map(|r| ResetToken {
            id: r.id,
            user_id: r.user_id,
            token: r.token,
            created_at: r.created_at,
        }))
    }

    /// Consume a token. Tokens are single use: the row is gone after this.
    pub async fn delete(&self, id: i32) -> Result<()> {
        PasswordResetTokens::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete reset token")?;
        Ok(())
    }
}

/// A token created at `created_at` is accepted strictly less than one hour
/// later. Unparseable timestamps count as expired.
fn is_expired(created_at: &str, now: DateTime<Utc>) -> bool {
    DateTime::parse_from_rfc3339(created_at).map_or(true, |created| {
        now.signed_duration_since(created.with_timezone(&Utc)) >= Duration::hours(1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_created_at(created: DateTime<Utc>) -> ResetToken {
        ResetToken {
            id: 1,
            user_id: 1,
            token: "b5c7dd5e-4b58-4be5-a9b4-9a2b1f5a1c33".to_string(),
            created_at: created.to_rfc3339(),
        }
    }

    #[test]
    fn valid_just_before_the_hour() {
        let created = Utc::now();
        let t = token_created_at(created);
        assert!(!t.is_expired_at(created + Duration::minutes(59)));
    }

    #[test]
    fn expired_just_after_the_hour() {
        let created = Utc::now();
        let t = token_created_at(created);
        assert!(t.is_expired_at(created + Duration::minutes(61)));
    }

    #[test]
    fn expired_exactly_at_the_hour() {
        let created = Utc::now();
        let t = token_created_at(created);
        assert!(t.is_expired_at(created + Duration::hours(1)));
    }

    #[test]
    fn garbage_timestamp_counts_as_expired() {
        let t = ResetToken {
            id: 1,
            user_id: 1,
            token: "x".to_string(),
            created_at: "not-a-timestamp".to_string(),
        };
        assert!(t.is_expired_at(Utc::now()));
    }
}
