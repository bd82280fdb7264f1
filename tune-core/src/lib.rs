pub mod clock;
pub mod collaborators;
pub mod errors;
pub mod evaluator;
pub mod maintenance;
pub mod normalize;
pub mod riddle_service;
pub mod rules;
pub mod similarity;
pub mod stats;

// Re-export main components
pub use clock::*;
pub use collaborators::*;
pub use errors::*;
pub use evaluator::*;
pub use maintenance::*;
pub use normalize::*;
pub use riddle_service::*;
pub use rules::*;
pub use similarity::*;
pub use stats::*;
