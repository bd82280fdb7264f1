use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::debug;

use crate::entities::{dailies, prelude::*};
use tune_core::{AnswerStore, fallback_index};
use tune_types::DailyAnswer;

pub struct DailyRepository {
    db: DatabaseConnection,
}

impl DailyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_answer(model: dailies::Model) -> DailyAnswer {
        DailyAnswer {
            id: model.id,
            category: model.category,
            date: model.date,
            url: model.url,
            performer: model.performer,
            title: model.title,
            video_file: model.video_file,
        }
    }

    pub async fn find_for_day(
        &self,
        category: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyAnswer>> {
        let model = Dailies::find()
            .filter(dailies::Column::Category.eq(category))
            .filter(dailies::Column::Date.eq(date))
            .one(&self.db)
            .await?;
        Ok(model.map(Self::model_to_answer))
    }

    pub async fn count_for_category(&self, category: &str) -> Result<u64> {
        let count = Dailies::find()
            .filter(dailies::Column::Category.eq(category))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn count_before(&self, category: &str, date: NaiveDate) -> Result<u64> {
        let count = Dailies::find()
            .filter(dailies::Column::Category.eq(category))
            .filter(dailies::Column::Date.lt(date))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl AnswerStore for DailyRepository {
    async fn answer_for_today(
        &self,
        category: &str,
        today: NaiveDate,
    ) -> Result<Option<DailyAnswer>> {
        if let Some(answer) = self.find_for_day(category, today).await? {
            return Ok(Some(answer));
        }

        // Riddles scheduled after today must not leak through the fallback
        let count = self.count_before(category, today).await?;
        let Some(index) = fallback_index(today, count as usize) else {
            return Ok(None);
        };
        debug!(
            "No riddle for {} in '{}', falling back to entry {} of {}",
            today, category, index, count
        );

        let model = Dailies::find()
            .filter(dailies::Column::Category.eq(category))
            .filter(dailies::Column::Date.lt(today))
            .order_by_asc(dailies::Column::Date)
            .offset(index as u64)
            .limit(1)
            .one(&self.db)
            .await?;
        Ok(model.map(Self::model_to_answer))
    }

    async fn upsert_answer(&self, answer: DailyAnswer) -> Result<()> {
        let txn = self.db.begin().await?;

        Dailies::delete_many()
            .filter(dailies::Column::Category.eq(answer.category.as_str()))
            .filter(dailies::Column::Date.eq(answer.date))
            .exec(&txn)
            .await?;

        let model = dailies::ActiveModel {
            id: ActiveValue::Set(answer.id),
            category: ActiveValue::Set(answer.category),
            date: ActiveValue::Set(answer.date),
            url: ActiveValue::Set(answer.url),
            performer: ActiveValue::Set(answer.performer),
            title: ActiveValue::Set(answer.title),
            video_file: ActiveValue::Set(answer.video_file),
        };
        Dailies::insert(model).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn last_available_date(&self, category: &str) -> Result<Option<NaiveDate>> {
        let latest = Dailies::find()
            .filter(dailies::Column::Category.eq(category))
            .order_by_desc(dailies::Column::Date)
            .one(&self.db)
            .await?;
        Ok(latest.map(|model| model.date))
    }

    async fn find_date_of_duplicate(
        &self,
        category: &str,
        performer: &str,
        title: &str,
    ) -> Result<Option<NaiveDate>> {
        // SQLite's lower() only folds ASCII, so compare here
        let performer = performer.to_lowercase();
        let title = title.to_lowercase();

        let models = Dailies::find()
            .filter(dailies::Column::Category.eq(category))
            .order_by_asc(dailies::Column::Date)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .find(|m| m.performer.to_lowercase() == performer && m.title.to_lowercase() == title)
            .map(|m| m.date))
    }
}
