//! SQLite persistence: one row per week in `meal_plans`, plus an append-only
//! `modifications` log.

pub mod models;
pub mod pool;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::Result;
use crate::plan::MealPlan;
use crate::week::WeekKey;

pub use models::{Modification, NewModification, PlanBody, StoredPlan};
use models::{ModificationRow, PlanRow};

#[derive(Clone)]
pub struct PlanStore {
    pool: SqlitePool,
}

impl PlanStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = pool::create_pool(database_url).await?;
        pool::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self> {
        let pool = pool::create_memory_pool().await?;
        pool::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert or replace the plan for `week`. `created_at` survives updates.
    pub async fn save_plan(&self, week: WeekKey, plan: &MealPlan) -> Result<()> {
        let body = serde_json::to_string(plan)?;
        self.upsert(week, &body).await
    }

    /// Store a free-text plan as-is.
    pub async fn save_raw_plan(&self, week: WeekKey, text: &str) -> Result<()> {
        self.upsert(week, text).await
    }

    async fn upsert(&self, week: WeekKey, body: &str) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO meal_plans (week_key, plan, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?3) \
             ON CONFLICT(week_key) DO UPDATE SET plan = excluded.plan, updated_at = excluded.updated_at",
        )
        .bind(week.to_string())
        .bind(body)
        .bind(now)
        .execute(&self.pool)
        .await?;
        debug!(%week, "plan saved");
        Ok(())
    }

    pub async fn get_plan(&self, week: WeekKey) -> Result<Option<StoredPlan>> {
        let row = sqlx::query_as::<_, PlanRow>(
            "SELECT week_key, plan, created_at, updated_at FROM meal_plans WHERE week_key = ?1",
        )
        .bind(week.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredPlan::try_from).transpose()
    }

    pub async fn has_plan(&self, week: WeekKey) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meal_plans WHERE week_key = ?1")
            .bind(week.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Stored weeks, newest first.
    pub async fn list_weeks(&self) -> Result<Vec<WeekKey>> {
        let keys: Vec<String> =
            sqlx::query_scalar("SELECT week_key FROM meal_plans ORDER BY week_key DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(keys
            .into_iter()
            .filter_map(|key| match key.parse() {
                Ok(week) => Some(week),
                Err(e) => {
                    warn!(%key, error = %e, "skipping row with unparseable week key");
                    None
                }
            })
            .collect())
    }

    /// Deletes the plan and its modification log. Returns whether a plan
    /// existed.
    pub async fn delete_plan(&self, week: WeekKey) -> Result<bool> {
        let key = week.to_string();
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM modifications WHERE week_key = ?1")
            .bind(&key)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM meal_plans WHERE week_key = ?1")
            .bind(&key)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn add_modification(&self, modification: NewModification) -> Result<Modification> {
        let row = sqlx::query_as::<_, ModificationRow>(
            "INSERT INTO modifications (week_key, timestamp, context, day, message, response) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             RETURNING id, week_key, timestamp, context, day, message, response",
        )
        .bind(modification.week_key.to_string())
        .bind(Utc::now())
        .bind(modification.context)
        .bind(modification.day)
        .bind(modification.message)
        .bind(modification.response)
        .fetch_one(&self.pool)
        .await?;

        Modification::try_from(row)
    }

    /// Modifications for `week`, oldest first.
    pub async fn list_modifications(&self, week: WeekKey) -> Result<Vec<Modification>> {
        let rows = sqlx::query_as::<_, ModificationRow>(
            "SELECT id, week_key, timestamp, context, day, message, response \
             FROM modifications WHERE week_key = ?1 ORDER BY id ASC",
        )
        .bind(week.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Modification::try_from).collect()
    }
}
