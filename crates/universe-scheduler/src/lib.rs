//! Universe selection: bias scoring and priority/rotation batch scheduling.

pub mod bias;
pub mod scheduler;
pub mod state;

pub use bias::score as bias_score;
pub use scheduler::{build_batch, Batch, Stock};
pub use state::{load_offset, store_offset};
