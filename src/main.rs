mod client;
mod config;
mod normalize;
mod render;
mod router;

use crate::client::{ApiClient, Auth, ResponseData};
use crate::config::{Overrides, Scope, Settings, resolve, save};
use crate::router::{RequestContext, Route, Selection};
use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "shipctl",
    version,
    about = "Report private-location ships and team agents from load-testing APIs"
)]
struct Cli {
    #[arg(long, short = 'v', global = true, help = "Log debug details to stderr")]
    verbose: bool,

    #[arg(
        long,
        global = true,
        env = "SHIPCTL_API_KEY_ID",
        help = "API key id for the workspace API (otherwise read from config)"
    )]
    api_key_id: Option<String>,

    #[arg(
        long,
        global = true,
        env = "SHIPCTL_API_KEY_SECRET",
        hide_env_values = true,
        help = "API key secret for the workspace API (otherwise read from config)"
    )]
    api_key_secret: Option<String>,

    #[arg(
        long,
        global = true,
        env = "SHIPCTL_TOKEN",
        hide_env_values = true,
        help = "Personal access token for the team API (otherwise read from config)"
    )]
    token: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "URL",
        env = "SHIPCTL_WORKSPACE_URL",
        help = "Base URL of the workspace API (defaults to https://a.blazemeter.com/api/v4/)"
    )]
    workspace_url: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "URL",
        env = "SHIPCTL_TEAM_URL",
        help = "Base URL of the team API (defaults to https://api.runscope.com/)"
    )]
    team_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and print resources
    Get(GetArgs),
    /// Persist the credential/URL flags in effect plus defaults to the chosen scope
    Configure {
        #[arg(long, value_name = "ID", help = "Workspace used by `get --ws`")]
        default_workspace: Option<u64>,
        #[arg(long, value_name = "ID", help = "Team used by `get --tm`")]
        default_team: Option<String>,
        #[arg(
            long,
            value_enum,
            default_value_t = ScopeArg::User,
            help = "Where to write the config (local project dir or user config dir)"
        )]
        scope: ScopeArg,
    },
    /// Show current configuration (secrets masked)
    ConfigShow,
    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Args)]
struct GetArgs {
    #[arg(
        long = "workspace-id",
        short = 'w',
        value_name = "ID",
        global = true,
        conflicts_with = "ws"
    )]
    workspace_id: Option<u64>,

    #[arg(long, global = true, help = "Use the configured default workspace")]
    ws: bool,

    #[arg(
        long = "team-id",
        short = 't',
        value_name = "ID",
        global = true,
        conflicts_with = "tm"
    )]
    team_id: Option<String>,

    #[arg(long, global = true, help = "Use the configured default team")]
    tm: bool,

    #[arg(long, global = true, help = "Print the response body untouched")]
    raw: bool,

    #[command(subcommand)]
    resource: GetCommand,
}

#[derive(Subcommand)]
enum GetCommand {
    /// List ships per private location (-w, optionally --hid) or agents of a team (-t)
    Agents {
        #[arg(long = "hid", value_name = "HARBOUR_ID", help = "Only this private location")]
        harbour_id: Option<String>,
    },
    /// List integrations of a team (-t)
    Integrations,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Local,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Local => Scope::Local,
            ScopeArg::User => Scope::User,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let cwd = std::env::current_dir().context("reading current directory")?;
    let overrides = Overrides {
        api_key_id: cli.api_key_id,
        api_key_secret: cli.api_key_secret,
        token: cli.token,
        workspace_url: cli.workspace_url,
        team_url: cli.team_url,
    };

    match cli.command {
        Commands::Get(args) => {
            let settings = resolve(&cwd, overrides)?;
            let mut out = io::stdout().lock();
            run_get(&settings, args, &mut out)?;
            out.flush().context("flushing stdout")?;
        }
        Commands::Configure {
            default_workspace,
            default_team,
            scope,
        } => {
            let mut existing = config::load_scope(scope.into(), &cwd)?;
            let mut changed = false;
            for (slot, value) in [
                (&mut existing.api_key_id, overrides.api_key_id),
                (&mut existing.api_key_secret, overrides.api_key_secret),
                (&mut existing.token, overrides.token),
                (&mut existing.default_team, default_team),
                (&mut existing.workspace_url, overrides.workspace_url),
                (&mut existing.team_url, overrides.team_url),
            ] {
                if let Some(value) = value {
                    *slot = Some(value);
                    changed = true;
                }
            }
            if let Some(workspace) = default_workspace {
                existing.default_workspace = Some(workspace);
                changed = true;
            }
            if !changed {
                return Err(anyhow!(
                    "nothing to save; pass credentials, URLs, --default-workspace or --default-team"
                ));
            }

            let path = save(scope.into(), &existing, &cwd)?;
            println!("Saved configuration to {}", path.display());
        }
        Commands::ConfigShow => {
            let merged = config::load(&cwd)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&config::masked(&merged))?
            );
        }
        Commands::Completion { shell } => {
            use clap_complete::{generate, shells};
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            match shell {
                CompletionShell::Bash => {
                    generate(shells::Bash, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::Zsh => {
                    generate(shells::Zsh, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::Fish => {
                    generate(shells::Fish, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::PowerShell => {
                    generate(shells::PowerShell, &mut cmd, bin, &mut std::io::stdout())
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "shipctl=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("SHIPCTL_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_get(settings: &Settings, args: GetArgs, out: &mut impl Write) -> Result<()> {
    let harbour_id = match &args.resource {
        GetCommand::Agents { harbour_id } => harbour_id.clone(),
        GetCommand::Integrations => None,
    };
    let context = RequestContext::from_selection(
        Selection {
            workspace_id: args.workspace_id,
            use_default_workspace: args.ws,
            team_id: args.team_id,
            use_default_team: args.tm,
            harbour_id,
            raw_output: args.raw,
        },
        &settings.defaults(),
    );

    let (route, subcommand) = match args.resource {
        GetCommand::Agents { .. } => (context.agents_route(), "agents"),
        GetCommand::Integrations => (context.integrations_route(), "integrations"),
    };
    let Some(route) = route else {
        debug!("no workspace or team resolved; showing usage");
        return write_usage(&["get", subcommand], out);
    };
    debug!(?route, "selected route");

    let response = fetch(settings, &route)?;
    if context.raw_output {
        render::raw(&response.body, out).context("writing output")?;
        return Ok(());
    }

    debug!(status = response.status, "normalizing response");
    let report = match &route {
        Route::Workspace { .. } => normalize::private_locations(&response.body, None),
        Route::Harbour { harbour_id, .. } => {
            normalize::private_locations(&response.body, Some(harbour_id))
        }
        Route::Team { .. } => normalize::team_agents(&response.body),
        Route::Integrations { .. } => normalize::integrations(&response.body),
    };
    render::report(&report, out).context("writing output")?;
    Ok(())
}

fn fetch(settings: &Settings, route: &Route) -> Result<ResponseData> {
    match route {
        Route::Workspace { workspace_id } | Route::Harbour { workspace_id, .. } => {
            let client =
                ApiClient::new(settings.workspace_url(), Auth::Basic(settings.api_key_pair()?))?;
            client.get(
                "private-locations",
                &[
                    ("workspaceId", workspace_id.to_string()),
                    ("limit", "0".to_string()),
                ],
            )
        }
        Route::Team { team_id } => {
            let client = ApiClient::new(settings.team_url(), Auth::Bearer(settings.bearer_token()?))?;
            client.get(&format!("v1/teams/{team_id}/agents"), &[])
        }
        Route::Integrations { team_id } => {
            let client = ApiClient::new(settings.team_url(), Auth::Bearer(settings.bearer_token()?))?;
            client.get(&format!("teams/{team_id}/integrations"), &[])
        }
    }
}

fn write_usage(path: &[&str], out: &mut impl Write) -> Result<()> {
    let mut cmd = Cli::command();
    cmd.build();
    let mut sub = &mut cmd;
    for name in path {
        sub = sub
            .find_subcommand_mut(name)
            .ok_or_else(|| anyhow!("unknown subcommand `{name}`"))?;
    }
    write!(out, "{}", sub.render_help()).context("writing usage")?;
    Ok(())
}
