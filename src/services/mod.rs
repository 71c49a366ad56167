pub mod classifier;
pub mod report;
pub mod result_writer;

pub use classifier::{classify, count_products, has_results, Classification, Verdict};
pub use result_writer::ResultWriter;
