use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::catalog::{ChanceRow, TaskRow};
pub use repositories::reset_token::ResetToken;
pub use repositories::user::{GameStats, GameStatsPatch, User, UserPatch};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // In-memory sqlite is per-connection; a pool of them would see
        // different databases.
        let in_memory = db_url.contains(":memory:");
        let max_connections = if in_memory { 1 } else { max_connections };
        let min_connections = if in_memory { 1 } else { min_connections };

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn task_repo(&self) -> repositories::catalog::TaskRepository {
        repositories::catalog::TaskRepository::new(self.conn.clone())
    }

    fn chance_repo(&self) -> repositories::catalog::ChanceRepository {
        repositories::catalog::ChanceRepository::new(self.conn.clone())
    }

    fn reset_token_repo(&self) -> repositories::reset_token::ResetTokenRepository {
        repositories::reset_token::ResetTokenRepository::new(self.conn.clone())
    }

    // ========== Users & game stats ==========

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        email: &str,
        is_staff: bool,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(username, password, email, is_staff, security)
            .await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn verify_user_password_by_id(&self, id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password_by_id(id, password).await
    }

    pub async fn set_user_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .set_password(id, new_password, security)
            .await
    }

    pub async fn update_user(
        &self,
        id: i32,
        patch: UserPatch,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo().update(id, patch, security).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn ranked_users(
        &self,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<User>> {
        self.user_repo().ranked(limit, offset).await
    }

    // ========== Task catalog ==========

    pub async fn list_tasks(&self) -> Result<Vec<TaskRow>> {
        self.task_repo().list().await
    }

    pub async fn get_task(&self, id: i32) -> Result<Option<TaskRow>> {
        self.task_repo().get(id).await
    }

    pub async fn create_task(
        &self,
        description: &str,
        applicable_squares: &[i32],
        score_to_award: i32,
    ) -> Result<TaskRow> {
        self.task_repo()
            .create(description, applicable_squares, score_to_award)
            .await
    }

    pub async fn update_task(
        &self,
        id: i32,
        description: Option<&str>,
        applicable_squares: Option<&[i32]>,
        score_to_award: Option<i32>,
    ) -> Result<Option<TaskRow>> {
        self.task_repo()
            .update(id, description, applicable_squares, score_to_award)
            .await
    }

    pub async fn delete_task(&self, id: i32) -> Result<bool> {
        self.task_repo().delete(id).await
    }

    pub async fn delete_all_tasks(&self) -> Result<u64> {
        self.task_repo().delete_all().await
    }

    // ========== Chance catalog ==========

    pub async fn list_chances(&self) -> Result<Vec<ChanceRow>> {
        self.chance_repo().list().await
    }

    pub async fn get_chance(&self, id: i32) -> Result<Option<ChanceRow>> {
        self.chance_repo().get(id).await
    }

    pub async fn create_chance(&self, description: &str, score_to_award: i32) -> Result<ChanceRow> {
        self.chance_repo().create(description, score_to_award).await
    }

    pub async fn update_chance(
        &self,
        id: i32,
        description: Option<&str>,
        score_to_award: Option<i32>,
    ) -> Result<Option<ChanceRow>> {
        self.chance_repo()
            .update(id, description, score_to_award)
            .await
    }

    pub async fn delete_chance(&self, id: i32) -> Result<bool> {
        self.chance_repo().delete(id).await
    }

    pub async fn delete_all_chances(&self) -> Result<u64> {
        self.chance_repo().delete_all().await
    }

    // ========== Password reset tokens ==========

    pub async fn create_reset_token(&self, user_id: i32) -> Result<String> {
        self.reset_token_repo().create(user_id).await
    }

    pub async fn find_reset_token(&self, user_id: i32, token: &str) -> Result<Option<ResetToken>> {
        self.reset_token_repo().find(user_id, token).await
    }

    pub async fn delete_reset_token(&self, id: i32) -> Result<()> {
        self.reset_token_repo().delete(id).await
    }
}
