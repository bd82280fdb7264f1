use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::entities::{daily_stats, prelude::*};
use tune_core::{StatsStore, apply_outcome};
use tune_types::DailyStats;

pub struct StatsRepository {
    db: DatabaseConnection,
    // Serializes the read-modify-write in record_outcome
    write_lock: Mutex<()>,
}

impl StatsRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    fn model_to_stats(model: daily_stats::Model) -> Result<DailyStats> {
        let guess_to_success: BTreeMap<u32, u32> = serde_json::from_str(&model.guess_to_success)?;
        Ok(DailyStats {
            date: model.date,
            guess_to_success,
            failures: model.failures as u32,
            successes: model.successes as u32,
        })
    }

    pub async fn find_for_day(
        &self,
        category: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyStats>> {
        let model = DailyStatsRecords::find()
            .filter(daily_stats::Column::Category.eq(category))
            .filter(daily_stats::Column::Date.eq(date))
            .one(&self.db)
            .await?;
        model.map(Self::model_to_stats).transpose()
    }
}

#[async_trait]
impl StatsStore for StatsRepository {
    async fn record_outcome(
        &self,
        category: &str,
        date: NaiveDate,
        round: u32,
        success: bool,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let existing = DailyStatsRecords::find()
            .filter(daily_stats::Column::Category.eq(category))
            .filter(daily_stats::Column::Date.eq(date))
            .one(&self.db)
            .await?;

        match existing {
            Some(model) => {
                let id = model.id;
                let mut stats = Self::model_to_stats(model)?;
                apply_outcome(&mut stats, round, success);

                let updated = daily_stats::ActiveModel {
                    id: ActiveValue::Unchanged(id),
                    category: ActiveValue::Unchanged(category.to_string()),
                    date: ActiveValue::Unchanged(date),
                    guess_to_success: ActiveValue::Set(serde_json::to_string(
                        &stats.guess_to_success,
                    )?),
                    failures: ActiveValue::Set(stats.failures as i32),
                    successes: ActiveValue::Set(stats.successes as i32),
                };
                DailyStatsRecords::update(updated).exec(&self.db).await?;
            }
            None => {
                let mut stats = DailyStats::new(date);
                apply_outcome(&mut stats, round, success);

                let created = daily_stats::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    category: ActiveValue::Set(category.to_string()),
                    date: ActiveValue::Set(date),
                    guess_to_success: ActiveValue::Set(serde_json::to_string(
                        &stats.guess_to_success,
                    )?),
                    failures: ActiveValue::Set(stats.failures as i32),
                    successes: ActiveValue::Set(stats.successes as i32),
                };
                DailyStatsRecords::insert(created).exec(&self.db).await?;
            }
        }

        tracing::debug!(
            "Recorded {} at round {} for '{}' on {}",
            if success { "success" } else { "failure" },
            round,
            category,
            date
        );
        Ok(())
    }

    async fn stats_for_month(
        &self,
        category: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<DailyStats>> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| anyhow!("Invalid month {}-{}", year, month))?;
        let next = first
            .checked_add_months(Months::new(1))
            .ok_or_else(|| anyhow!("Month {}-{} out of range", year, month))?;

        let models = DailyStatsRecords::find()
            .filter(daily_stats::Column::Category.eq(category))
            .filter(daily_stats::Column::Date.gte(first))
            .filter(daily_stats::Column::Date.lt(next))
            .order_by_asc(daily_stats::Column::Date)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::model_to_stats).collect()
    }
}
