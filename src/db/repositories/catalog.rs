use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::config::EmptySquaresPolicy;
use crate::entities::{chances, prelude::*, tasks};

/// A task card from the catalog.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: i32,
    pub description: String,
    pub applicable_squares: Vec<i32>,
    pub score_to_award: i32,
}

impl TaskRow {
    /// Whether this task may appear on the given board square. An empty
    /// square list is resolved through the configured policy.
    #[must_use]
    pub fn applies_to(&self, square: i32, policy: EmptySquaresPolicy) -> bool {
        if self.applicable_squares.is_empty() {
            return matches!(policy, EmptySquaresPolicy::Everywhere);
        }
        self.applicable_squares.contains(&square)
    }
}

/// A chance card from the catalog.
#[derive(Debug, Clone)]
pub struct ChanceRow {
    pub id: i32,
    pub description: String,
    pub score_to_award: i32,
}

pub struct TaskRepository {
    conn: DatabaseConnection,
}

impl TaskRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<TaskRow>> {
        let rows = Tasks::find()
            .order_by_asc(tasks::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list tasks")?;

        Ok(rows.into_iter().map(map_task).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<TaskRow>> {
        let row = Tasks::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query task")?;

        Ok(row.map(map_task))
    }

    pub async fn create(
        &self,
        description: &str,
        applicable_squares: &[i32],
        score_to_award: i32,
    ) -> Result<TaskRow> {
        let model = tasks::ActiveModel {
            description: Set(description.to_string()),
            applicable_squares: Set(serde_json::json!(applicable_squares)),
            score_to_award: Set(score_to_award),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert task")?;

        Ok(map_task(model))
    }

    pub async fn update(
        &self,
        id: i32,
        description: Option<&str>,
        applicable_squares: Option<&[i32]>,
        score_to_award: Option<i32>,
    ) -> Result<Option<TaskRow>> {
        let Some(row) = Tasks::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query task for update")?
        else {
            return Ok(None);
        };

        let mut active: tasks::ActiveModel = row.into();
        if let Some(description) = description {
            active.description = Set(description.to_string());
        }
        if let Some(squares) = applicable_squares {
            active.applicable_squares = Set(serde_json::json!(squares));
        }
        if let Some(score) = score_to_award {
            active.score_to_award = Set(score);
        }
        let updated = active.update(&self.conn).await?;

        Ok(Some(map_task(updated)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Tasks::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = Tasks::delete_many().exec(&self.conn).await?;
        Ok(result.rows_affected)
    }
}

pub struct ChanceRepository {
    conn: DatabaseConnection,
}

impl ChanceRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<ChanceRow>> {
        let rows = Chances::find()
            .order_by_asc(chances::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list chances")?;

        Ok(rows.into_iter().map(map_chance).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<ChanceRow>> {
        let row = Chances::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query chance")?;

        Ok(row.map(map_chance))
    }

    pub async fn create(&self, description: &str, score_to_award: i32) -> Result<ChanceRow> {
        let model = chances::ActiveModel {
            description: Set(description.to_string()),
            score_to_award: Set(score_to_award),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert chance")?;

        Ok(map_chance(model))
    }

    pub async fn update(
        &self,
        id: i32,
        description: Option<&str>,
        score_to_award: Option<i32>,
    ) -> Result<Option<ChanceRow>> {
        let Some(row) = Chances::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query chance for update")?
        else {
            return Ok(None);
        };

        let mut active: chances::ActiveModel = row.into();
        if let Some(description) = description {
            active.description = Set(description.to_string());
        }
        if let Some(score) = score_to_award {
            active.score_to_award = Set(score);
        }
        let updated = active.update(&self.conn).await?;

        Ok(Some(map_chance(updated)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Chances::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = Chances::delete_many().exec(&self.conn).await?;
        Ok(result.rows_affected)
    }
}

fn map_task(model: tasks::Model) -> TaskRow {
    // Tolerate malformed square lists from hand-edited rows.
    let applicable_squares =
        serde_json::from_value(model.applicable_squares).unwrap_or_default();

    TaskRow {
        id: model.id,
        description: model.description,
        applicable_squares,
        score_to_award: model.score_to_award,
    }
}

fn map_chance(model: chances::Model) -> ChanceRow {
    ChanceRow {
        id: model.id,
        description: model.description,
        score_to_award: model.score_to_award,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(squares: &[i32]) -> TaskRow {
        TaskRow {
            id: 1,
            description: "Recycle an item".to_string(),
            applicable_squares: squares.to_vec(),
            score_to_award: 10,
        }
    }

    #[test]
    fn applies_to_listed_square() {
        let t = task(&[1, 4, 9]);
        assert!(t.applies_to(4, EmptySquaresPolicy::Nowhere));
        assert!(!t.applies_to(5, EmptySquaresPolicy::Nowhere));
    }

    #[test]
    fn empty_list_follows_policy() {
        let t = task(&[]);
        assert!(!t.applies_to(3, EmptySquaresPolicy::Nowhere));
        assert!(t.applies_to(3, EmptySquaresPolicy::Everywhere));
    }

    #[test]
    fn policy_ignored_when_squares_listed() {
        let t = task(&[2]);
        assert!(!t.applies_to(3, EmptySquaresPolicy::Everywhere));
    }
}
