pub mod code_loader;

pub use code_loader::{load_codes, parse_codes};
