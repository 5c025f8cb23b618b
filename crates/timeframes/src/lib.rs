pub mod oracle;
pub mod resample;

pub use oracle::{last_closed, last_closed_index};
pub use resample::resample;
