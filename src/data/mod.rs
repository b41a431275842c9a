pub mod loader;

pub use loader::{load_table, parse_table, RawTable};
