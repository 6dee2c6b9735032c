pub mod context;
pub mod github;
pub mod traits;

pub use context::{RepoCoordinates, RunContext};
pub use github::{GhCliProvider, GhError};
pub use traits::{PullRequestSummary, RepoClient};
