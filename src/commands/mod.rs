// ABOUTME: Command module aggregator for the railyard CLI.
// ABOUTME: Re-exports the command handlers and the composition root.

mod context;
mod deploy;
mod rollback;
mod status;
mod variables;

pub use context::AppContext;
pub use deploy::{deploy, deploy_all, redeploy};
pub use rollback::{restart, rollback};
pub use status::{health, history, status};
pub use variables::{delete as variables_delete, list as variables_list, set as variables_set};
