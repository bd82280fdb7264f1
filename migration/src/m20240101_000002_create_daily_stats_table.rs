use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DailyStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DailyStats::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DailyStats::Category).string().not_null())
                    .col(ColumnDef::new(DailyStats::Date).date().not_null())
                    .col(
                        ColumnDef::new(DailyStats::GuessToSuccess)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(DailyStats::Failures)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DailyStats::Successes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_daily_stats_category_date")
                    .table(DailyStats::Table)
                    .col(DailyStats::Category)
                    .col(DailyStats::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DailyStats::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DailyStats {
    Table,
    Id,
    Category,
    Date,
    GuessToSuccess,
    Failures,
    Successes,
}
