use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dailies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Dailies::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Dailies::Category).string().not_null())
                    .col(ColumnDef::new(Dailies::Date).date().not_null())
                    .col(ColumnDef::new(Dailies::Url).string().not_null())
                    .col(ColumnDef::new(Dailies::Performer).string().not_null())
                    .col(ColumnDef::new(Dailies::Title).string().not_null())
                    .col(ColumnDef::new(Dailies::VideoFile).string().null())
                    .to_owned(),
            )
            .await?;

        // One riddle per category and day
        manager
            .create_index(
                Index::create()
                    .name("idx_dailies_category_date")
                    .table(Dailies::Table)
                    .col(Dailies::Category)
                    .col(Dailies::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Dailies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Dailies {
    Table,
    Id,
    Category,
    Date,
    Url,
    Performer,
    Title,
    VideoFile,
}
