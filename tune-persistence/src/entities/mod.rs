pub mod prelude;

pub mod dailies;
pub mod daily_stats;
