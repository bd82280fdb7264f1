pub mod errors;
pub mod maintenance;
pub mod riddle;
pub mod stats;

// Re-export all types
pub use errors::*;
pub use maintenance::*;
pub use riddle::*;
pub use stats::*;
