pub use super::dailies::Entity as Dailies;
pub use super::daily_stats::Entity as DailyStatsRecords;
