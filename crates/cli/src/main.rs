mod add;
mod find;
mod init;
mod list;
mod remove;
mod update;

use {
    clap::{Parser, Subcommand},
    tracing_subscriber::EnvFilter,
};

#[derive(Parser)]
#[command(
    name = "skillpack",
    version,
    about = "Package manager for agent skill documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Install skills from a source (owner/repo, URL, or local path).
    Add {
        /// Source to install: owner/repo shorthand, hosted URL, git remote,
        /// or local path.
        source: String,
        /// Install into the home scope instead of the project.
        #[arg(short = 'g', long = "global")]
        global: bool,
        /// Target specific agents ('*' for all known agents).
        #[arg(short, long)]
        agent: Vec<String>,
        /// Install specific skills by name ('*' for all discovered).
        #[arg(short, long)]
        skill: Vec<String>,
        /// List available skills without installing.
        #[arg(short, long)]
        list: bool,
        /// Skip the pre-install summary.
        #[arg(short, long)]
        yes: bool,
        /// Shorthand for --skill '*' --agent '*' --yes.
        #[arg(long)]
        all: bool,
        /// Search all subdirectories even when a root SKILL.md exists.
        #[arg(long)]
        full_depth: bool,
        /// Give each agent an independent copy instead of a symlink.
        #[arg(long)]
        copy: bool,
    },
    /// Remove installed skills.
    #[command(alias = "rm")]
    Remove {
        /// Skill names to remove.
        skills: Vec<String>,
        /// Remove from the home scope instead of the project.
        #[arg(short = 'g', long = "global")]
        global: bool,
        /// Detach from specific agents only, keeping the shared copy.
        #[arg(short, long)]
        agent: Vec<String>,
        /// Skip the pre-removal summary.
        #[arg(short, long)]
        yes: bool,
        /// Remove every installed skill.
        #[arg(long)]
        all: bool,
    },
    /// List installed skills.
    #[command(alias = "ls")]
    List {
        /// List the home scope instead of the project.
        #[arg(short = 'g', long = "global")]
        global: bool,
        /// Only show skills reachable from these agents.
        #[arg(short, long)]
        agent: Vec<String>,
    },
    /// Create a new skill skeleton (SKILL.md).
    Init {
        /// Name for the new skill.
        name: Option<String>,
    },
    /// Search the hosted skills index.
    #[command(alias = "search")]
    Find {
        /// Search query.
        query: Option<String>,
    },
    /// Check for available skill updates.
    Check,
    /// Update all skills with pending changes.
    #[command(alias = "upgrade")]
    Update,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Add {
            source,
            global,
            agent,
            skill,
            list,
            yes,
            all,
            full_depth,
            copy,
        } => {
            add::run_add(add::AddOptions {
                source,
                is_global: global,
                agents: agent,
                skills: skill,
                list_only: list,
                yes,
                all,
                full_depth,
                copy,
            })
            .await
        },
        Commands::Remove {
            skills,
            global,
            agent,
            yes,
            all,
        } => {
            remove::run_remove(remove::RemoveOptions {
                skills,
                is_global: global,
                agents: agent,
                yes,
                all,
            })
            .await
        },
        Commands::List { global, agent } => list::run_list(global, agent).await,
        Commands::Init { name } => init::run_init(name),
        Commands::Find { query } => find::run_find(query).await,
        Commands::Check => update::run_check().await,
        Commands::Update => update::run_update().await,
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Shared HTTP client: one attempt per request, fixed 30 second timeout.
pub(crate) fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .user_agent(concat!("skillpack/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
