pub mod detected_slashings;
pub mod table;
pub mod validator_spans;

pub use table::Table;
