pub mod loaders;
pub mod outcome;

pub use loaders::{load_codes, parse_codes};
pub use outcome::{Code, Outcome, OutcomeKind, ResultSet, Tally};
