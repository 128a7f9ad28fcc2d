pub mod args;
pub mod commands;
pub mod output;

pub use args::{Cli, Commands};
pub use commands::{
    handle_catalog_command, handle_category_command, handle_document_command, handle_inbox,
    handle_instance_command, handle_queue_command, handle_stats, handle_team_command,
    handle_user_command, handle_workflow_command, Context,
};
pub use output::{OutputFormat, OutputManager};
