//! CLI structure and command definitions
//!
//! Three command groups sit over `smctl-core`:
//! 1. `provider` - list and change resource provider registration
//! 2. `operation` - inspect and wait on long-running operations
//! 3. `profile` - manage subscriptions and credentials

use clap::{Parser, Subcommand};

/// Service Management CLI for resource provider registration
#[derive(Parser, Debug)]
#[command(name = "smctl")]
#[command(
    version,
    about = "Service Management CLI for resource provider registration and operation tracking"
)]
#[command(long_about = "
Service Management CLI for resource provider registration and operation tracking

Every command runs against one subscription, taken from the selected profile
or from SMCTL_SUBSCRIPTION_ID / SMCTL_TOKEN when no config file is given.

EXAMPLES:
    # Set up a profile with a management certificate
    smctl profile set prod --subscription-id 1111-2222 --certificate ~/certs/mgmt.pem

    # See which providers are registered
    smctl provider list

    # Register everything that is missing
    smctl provider sync

    # Preview without changing anything
    smctl provider sync --dry-run

    # Wait for a long-running operation
    smctl operation wait 6ad2a1c0c0c94d2f9b6a0b7cbd7e1a9e

    # Get JSON output for scripting
    smctl provider list -o json

For more help on a specific command, run:
    smctl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "SMCTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "SMCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Automatically choose format based on command and context
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

impl OutputFormat {
    /// True for the human-oriented formats
    pub fn is_human(&self) -> bool {
        matches!(self, Self::Auto | Self::Table)
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resource provider registration
    #[command(subcommand, visible_alias = "prov")]
    Provider(ProviderCommands),

    /// Long-running operation tracking
    #[command(subcommand, visible_alias = "op")]
    Operation(OperationCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof", visible_alias = "pr")]
    Profile(ProfileCommands),

    /// Show version information
    #[command(visible_alias = "ver", visible_alias = "v")]
    Version,
}

/// Resource provider commands
#[derive(Subcommand, Debug)]
pub enum ProviderCommands {
    /// List registration state for the known provider types
    #[command(visible_alias = "ls")]
    #[command(after_help = "EXAMPLES:
    # List the built-in and configured provider types
    smctl provider list

    # Only ask about specific types
    smctl provider list --type Storage --type CloudServices
")]
    List {
        /// Provider type to query (repeatable); replaces the catalog when given
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        types: Vec<String>,
    },

    /// Register one provider type
    #[command(visible_alias = "reg")]
    Register {
        /// Provider type, e.g. Storage
        resource_type: String,
    },

    /// Unregister one provider type
    #[command(visible_alias = "unreg")]
    Unregister {
        /// Provider type, e.g. Storage
        resource_type: String,
    },

    /// Register every known provider type that is not registered yet
    #[command(after_help = "EXAMPLES:
    # Register everything missing from the catalog
    smctl provider sync

    # Add types on top of the catalog
    smctl provider sync --type HDInsight

    # Show what would be registered
    smctl provider sync --dry-run
")]
    Sync {
        /// Extra provider type to include (repeatable)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        types: Vec<String>,

        /// Only report what would be registered
        #[arg(long)]
        dry_run: bool,
    },
}

/// Operation commands
#[derive(Subcommand, Debug)]
pub enum OperationCommands {
    /// Fetch the current status of an operation
    #[command(visible_alias = "get")]
    Show {
        /// Tracking id returned by the request that started the operation
        tracking_id: String,
    },

    /// Poll an operation until it succeeds, fails or runs out of attempts
    #[command(after_help = "EXAMPLES:
    # Wait with the profile's polling settings (default 60s x 30)
    smctl operation wait 6ad2a1c0c0c94d2f9b6a0b7cbd7e1a9e

    # Poll faster
    smctl operation wait 6ad2a1c0c0c94d2f9b6a0b7cbd7e1a9e --interval 5 --max-attempts 60

Exits with a non-zero status if the operation failed or timed out.
")]
    Wait {
        /// Tracking id returned by the request that started the operation
        tracking_id: String,

        /// Seconds between polls (overrides the profile)
        #[arg(long)]
        interval: Option<u64>,

        /// Polls before giving up (overrides the profile)
        #[arg(long)]
        max_attempts: Option<u32>,
    },
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a profile
    #[command(visible_alias = "sh")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Create or update a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    #[command(after_help = "EXAMPLES:
    # Certificate authentication
    smctl profile set prod --subscription-id 1111-2222 \\
        --certificate ~/certs/mgmt.pem

    # Bearer token, stored in the OS keyring
    smctl profile set dev --subscription-id 3333-4444 \\
        --token eyJ0eXAi... --use-keyring

    # Custom endpoint and polling
    smctl profile set gov --subscription-id 5555-6666 \\
        --certificate ~/certs/gov.pem \\
        --endpoint https://management.core.usgovcloudapi.net \\
        --poll-interval 30 --max-attempts 40
")]
    Set {
        /// Profile name
        name: String,

        /// Subscription id
        #[arg(long)]
        subscription_id: String,

        /// Management endpoint base URL
        #[arg(long)]
        endpoint: Option<String>,

        /// PEM file with the management certificate and private key
        #[arg(long, required_unless_present = "token", conflicts_with = "token")]
        certificate: Option<String>,

        /// Bearer token
        #[arg(long)]
        token: Option<String>,

        /// Store the token in OS keyring instead of config file
        #[cfg(feature = "secure-storage")]
        #[arg(long, requires = "token")]
        use_keyring: bool,

        /// Seconds between polls for `operation wait`
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Polls before `operation wait` gives up
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "del", visible_alias = "delete")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    #[command(visible_alias = "def")]
    Default {
        /// Profile name to use by default
        name: String,
    },
}
