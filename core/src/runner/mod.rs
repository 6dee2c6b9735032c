pub mod process;
pub mod run_loop;

#[cfg(test)]
mod testing;

pub use process::{process_pull_request, select_labels};
pub use run_loop::{fetch_configuration, RunBudget, RunLoop, RunMode, RunOptions, RunReport};
