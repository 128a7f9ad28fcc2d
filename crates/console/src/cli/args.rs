use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::cli::output::OutputFormat;

#[derive(Parser)]
#[command(name = "civica")]
#[command(about = "Admin console for the Civica workflow backend")]
#[command(version, long_about = None)]
pub struct Cli {
    /// Backend origin (can also be set via API_URL)
    #[arg(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// Bearer token (can also be set via API_TOKEN)
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub output: OutputFormat,

    /// Suppress normal output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Workflow instances
    #[command(subcommand)]
    Instances(InstanceCommands),

    /// Assignment queue
    #[command(subcommand)]
    Queue(QueueCommands),

    /// Admin inbox of instances needing attention
    Inbox {
        #[command(flatten)]
        paging: Paging,
        /// Keep the list on screen and refresh it periodically
        #[arg(long)]
        watch: bool,
    },

    /// Dashboard counters
    Stats,

    /// Data catalogs
    #[command(subcommand)]
    Catalogs(CatalogCommands),

    /// Workflow definitions
    #[command(subcommand)]
    Workflows(WorkflowCommands),

    /// Workflow categories
    #[command(subcommand)]
    Categories(CategoryCommands),

    /// Teams
    #[command(subcommand)]
    Teams(TeamCommands),

    /// Users
    #[command(subcommand)]
    Users(UserCommands),

    /// Instance documents
    #[command(subcommand)]
    Documents(DocumentCommands),
}

#[derive(Args, Debug, Clone)]
pub struct Paging {
    /// Page number (0-based)
    #[arg(long, default_value = "0")]
    pub page: u32,
    /// Rows per page (defaults to DEFAULT_PAGE_SIZE)
    #[arg(long)]
    pub page_size: Option<u32>,
}

#[derive(Subcommand)]
pub enum InstanceCommands {
    /// List instances
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        workflow_id: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },
    /// Show one instance
    Get {
        id: String,
    },
    /// Show the tracking view of an instance
    Track {
        id: String,
        /// Keep polling until the instance finishes
        #[arg(long)]
        watch: bool,
    },
    /// Start an instance waiting for start
    Start {
        id: String,
    },
    /// Cancel an instance
    Cancel {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Submit input for a paused instance
    Submit(SubmitArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SubmitArgs {
    pub id: String,

    /// Form or signer field, as NAME=VALUE (repeatable)
    #[arg(long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// File attachment, as FIELD=PATH (repeatable)
    #[arg(long = "file", value_name = "FIELD=PATH")]
    pub files: Vec<String>,

    /// Selected catalog row as a JSON object (repeatable)
    #[arg(long = "select", value_name = "JSON")]
    pub selections: Vec<String>,

    /// Signature data (typed name or data URL)
    #[arg(long)]
    pub signature: Option<String>,

    /// Accept the terms shown with a signature request
    #[arg(long)]
    pub accept_terms: bool,

    /// Context item confirmed by the operator (repeatable)
    #[arg(long = "confirm", value_name = "KEY")]
    pub confirmed: Vec<String>,

    /// Decision for a context validation request
    #[arg(long, value_enum)]
    pub decision: Option<DecisionArg>,

    /// Comments for a context validation decision
    #[arg(long, default_value = "")]
    pub comments: String,

    /// Wait for the refreshed progress after submitting
    #[arg(long)]
    pub wait: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecisionArg {
    Approve,
    Reject,
}

#[derive(Subcommand)]
pub enum QueueCommands {
    /// Instances nobody has picked up yet
    Pending(LensArgs),
    /// Instances assigned to me
    Mine(LensArgs),
    /// Assign an instance to a user or a team
    Assign {
        instance_id: String,
        #[arg(long, conflicts_with = "team", required_unless_present = "team")]
        user: Option<String>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Remove the current assignment
    Unassign {
        instance_id: String,
    },
    /// Start an instance assigned to me
    Start {
        instance_id: String,
    },
    /// Take an unassigned instance and start it
    QuickStart {
        instance_id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct LensArgs {
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub search: Option<String>,
    #[command(flatten)]
    pub paging: Paging,
    /// Keep the list on screen and refresh it periodically
    #[arg(long)]
    pub watch: bool,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List catalogs
    List,
    /// Show one catalog
    Get {
        id: String,
    },
    /// Re-sync a catalog from its source
    Sync {
        id: String,
    },
    /// Browse catalog rows
    Browse {
        id: String,
        #[arg(long)]
        search: Option<String>,
        /// Column filter, as COLUMN=VALUE (repeatable)
        #[arg(long = "filter", value_name = "COLUMN=VALUE")]
        filters: Vec<String>,
        /// Sort column
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// List workflow definitions
    List {
        #[arg(long)]
        category_id: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Create an instance of a workflow
    Instantiate {
        id: String,
        /// Initial context as a JSON object
        #[arg(long, default_value = "{}")]
        context: String,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories
    List,
}

#[derive(Subcommand)]
pub enum TeamCommands {
    /// List teams
    List,
    /// List the members of a team
    Members {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List users
    List,
    /// Show the authenticated user
    Me,
}

#[derive(Subcommand)]
pub enum DocumentCommands {
    /// List the documents of an instance
    List {
        instance_id: String,
    },
    /// Upload a file to an instance
    Upload {
        instance_id: String,
        path: std::path::PathBuf,
        /// Content type of the file
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Run the automated verification analysis
    Analyze {
        id: String,
    },
    /// Record the admin's verification decision
    Verify {
        id: String,
        #[arg(long, value_enum)]
        decision: DecisionArg,
        #[arg(long)]
        comments: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_submit_with_repeated_fields() {
        let cli = Cli::try_parse_from([
            "civica",
            "instances",
            "submit",
            "i-1",
            "--field",
            "name=Ana",
            "--field",
            "age=30",
            "--file",
            "doc=/tmp/cedula.pdf",
            "-o",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Instances(InstanceCommands::Submit(args)) => {
                assert_eq!(args.id, "i-1");
                assert_eq!(args.fields, vec!["name=Ana", "age=30"]);
                assert_eq!(args.files, vec!["doc=/tmp/cedula.pdf"]);
            }
            _ => panic!("expected instances submit"),
        }
    }

    #[test]
    fn assign_needs_exactly_one_target() {
        assert!(Cli::try_parse_from(["civica", "queue", "assign", "i-1"]).is_err());
        assert!(Cli::try_parse_from([
            "civica", "queue", "assign", "i-1", "--user", "u", "--team", "t"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["civica", "queue", "assign", "i-1", "--team", "t"]).is_ok());
    }
}
