pub mod classify;
pub mod setups;

pub use classify::{classify_bar, classify_frame};
pub use setups::detect;
