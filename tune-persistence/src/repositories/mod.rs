pub mod daily_repository;
pub mod stats_repository;

pub use daily_repository::DailyRepository;
pub use stats_repository::StatsRepository;
