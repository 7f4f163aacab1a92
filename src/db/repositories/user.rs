use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{prelude::*, user_game_stats, users};

/// User data returned from the repository (without the password hash).
/// Stats are embedded because every user has exactly one stats row.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub created_at: String,
    pub stats: GameStats,
}

#[derive(Debug, Clone, Copy)]
pub struct GameStats {
    pub current_square: i32,
    pub current_task: i32,
    pub task_completed: bool,
    pub score: i32,
}

/// Partial update applied to a user row and optionally its stats row.
#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_staff: Option<bool>,
    pub stats: Option<GameStatsPatch>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GameStatsPatch {
    pub current_square: Option<i32>,
    pub current_task: Option<i32>,
    pub task_completed: Option<bool>,
    pub score: Option<i32>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a user and its game-stats row in a single transaction, so no
    /// caller can ever observe a user without stats.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        email: &str,
        is_staff: bool,
        security: &SecurityConfig,
    ) -> Result<User> {
        let password = password.to_string();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let txn = self.conn.begin().await?;

        let user = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            email: Set(email.to_string()),
            is_staff: Set(is_staff),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert user")?;

        let stats = user_game_stats::ActiveModel {
            user_id: Set(user.id),
            current_square: Set(0),
            current_task: Set(-1),
            task_completed: Set(false),
            score: Set(0),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert game stats")?;

        txn.commit().await?;

        map_row(user, Some(stats))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let row = Users::find_by_id(id)
            .find_also_related(UserGameStats)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        row.map(|(u, s)| map_row(u, s)).transpose()
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = Users::find()
            .filter(users::Column::Username.eq(username))
            .find_also_related(UserGameStats)
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        row.map(|(u, s)| map_row(u, s)).transpose()
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let existing = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to check username availability")?;

        Ok(existing.is_some())
    }

    /// Verify a password against the stored hash.
    /// Note: this uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        verify_hash_blocking(user.password_hash, password.to_string()).await
    }

    pub async fn verify_password_by_id(&self, id: i32, password: &str) -> Result<bool> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        verify_hash_blocking(user.password_hash, password.to_string()).await
    }

    /// Replace a user's password without checking the old one (used by the
    /// change-password handler after verification, and by the reset flow).
    pub async fn set_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let password = new_password.to_string();
        let security = security.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Apply a partial update to the user row and, when present, its stats
    /// row, inside one transaction.
    pub async fn update(
        &self,
        id: i32,
        patch: UserPatch,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        let txn = self.conn.begin().await?;

        let Some(user) = Users::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(username) = patch.username {
            active.username = Set(username);
        }
        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(is_staff) = patch.is_staff {
            active.is_staff = Set(is_staff);
        }
        if let Some(password) = patch.password {
            let security = security.clone();
            let hash = task::spawn_blocking(move || hash_password(&password, &security))
                .await
                .context("Password hashing task panicked")??;
            active.password_hash = Set(hash);
        }
        active.update(&txn).await.context("Failed to update user")?;

        if let Some(stats_patch) = patch.stats {
            let stats = UserGameStats::find()
                .filter(user_game_stats::Column::UserId.eq(id))
                .one(&txn)
                .await
                .context("Failed to query game stats for update")?
                .ok_or_else(|| anyhow::anyhow!("Game stats missing for user {id}"))?;

            let mut active: user_game_stats::ActiveModel = stats.into();
            if let Some(square) = stats_patch.current_square {
                active.current_square = Set(square);
            }
            if let Some(task) = stats_patch.current_task {
                active.current_task = Set(task);
            }
            if let Some(completed) = stats_patch.task_completed {
                active.task_completed = Set(completed);
            }
            if let Some(score) = stats_patch.score {
                active.score = Set(score);
            }
            active
                .update(&txn)
                .await
                .context("Failed to update game stats")?;
        }

        txn.commit().await?;

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Users::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .find_also_related(UserGameStats)
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        rows.into_iter().map(|(u, s)| map_row(u, s)).collect()
    }

    /// All users joined with stats, highest score first. Tie order is
    /// whatever the store returns.
    pub async fn ranked(&self, limit: Option<u64>, offset: Option<u64>) -> Result<Vec<User>> {
        let mut query = Users::find()
            .find_also_related(UserGameStats)
            .order_by_desc(user_game_stats::Column::Score);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        if let Some(offset) = offset {
            query = query.offset(offset);
        }

        let rows = query
            .all(&self.conn)
            .await
            .context("Failed to query ranked users")?;

        rows.into_iter().map(|(u, s)| map_row(u, s)).collect()
    }
}

fn map_row(user: users::Model, stats: Option<user_game_stats::Model>) -> Result<User> {
    let stats = stats
        .ok_or_else(|| anyhow::anyhow!("Game stats missing for user {}", user.id))?;

    Ok(User {
        id: user.id,
        username: user.username,
        email: user.email,
        is_staff: user.is_staff,
        created_at: user.created_at,
        stats: GameStats {
            current_square: stats.current_square,
            current_task: stats.current_task,
            task_completed: stats.task_completed,
            score: stats.score,
        },
    })
}

async fn verify_hash_blocking(password_hash: String, password: String) -> Result<bool> {
    let is_valid = task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        let argon2 = Argon2::default();
        Ok::<bool, anyhow::Error>(
            argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")??;

    Ok(is_valid)
}

/// Hash a password using Argon2id with params from the security config.
pub fn hash_password(password: &str, security: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        security.argon2_memory_cost_kib,
        security.argon2_time_cost,
        security.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
