mod aggregate;
mod assign;
mod codes;
mod delete;
mod report;

pub use aggregate::{ScoreQuery, with_aggregated_scores};
pub use assign::assign_codes;
pub use codes::load_code_list;
pub use delete::delete_scores;
pub use report::summarize_labels;
