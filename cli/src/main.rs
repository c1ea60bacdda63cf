use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use decor_client::cache::{CacheError, FileCache, LocalCache};
use decor_client::config::{ClientConfig, ConfigError, SupabaseConfig};
use decor_client::identity::supabase::SupabaseAuth;
use decor_client::identity::{IdentityError, IdentityProvider};
use decor_client::net::api::{ApiClient, ApiError};
use decor_client::net::types::{Credentials, NodeRecord, children_of};
use decor_client::notify::{Notice, NoticeLevel};
use decor_client::payment::StubPaymentValidator;
use decor_client::state::Entitlements;
use decor_client::state::auth_form::{AuthForm, AuthMode};
use decor_client::state::entitlements::DEFAULT_DATA_KIND;
use serde_json::Value;
use tokio::sync::broadcast;

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

/// How long to wait for an auth-change event to reach entitlement state.
const AUTH_EVENT_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Parser, Debug)]
#[command(name = "decor", about = "Decoration planner client and mock API CLI")]
struct Cli {
    /// Mock API base URL; defaults to the one derived from the environment.
    #[arg(long, env = "DECOR_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Bearer token sent with mock API requests (as printed by `mock login`).
    #[arg(long, env = "DECOR_API_TOKEN")]
    api_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the mock API answers.
    Ping,
    /// Print the decoration task tree.
    Nodes,
    Mock(MockCommand),
    Account(AccountCommand),
}

#[derive(Args, Debug)]
struct MockCommand {
    #[command(subcommand)]
    command: MockSubcommand,
}

#[derive(Subcommand, Debug)]
enum MockSubcommand {
    Register(MockCredentials),
    Login(MockCredentials),
}

#[derive(Args, Debug)]
struct MockCredentials {
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
}

#[derive(Args, Debug)]
struct AccountCommand {
    #[command(subcommand)]
    command: AccountSubcommand,
}

#[derive(Subcommand, Debug)]
enum AccountSubcommand {
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Status,
    /// Run the (stubbed) payment and mark the account premium.
    Upgrade,
    /// Store premium-only data for the signed-in user.
    Save {
        #[arg(long, default_value = DEFAULT_DATA_KIND)]
        kind: String,
        /// JSON document to store.
        #[arg(long)]
        data: String,
    },
    Load {
        #[arg(long, default_value = DEFAULT_DATA_KIND)]
        kind: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();
    let api_base_url = cli.api_base_url.unwrap_or_else(|| config.api_base_url());

    match cli.command {
        Command::Ping => run_ping(&api_client(&api_base_url, cli.api_token.as_deref())?).await,
        Command::Nodes => run_nodes(&api_client(&api_base_url, cli.api_token.as_deref())?).await,
        Command::Mock(mock) => run_mock(&api_client(&api_base_url, cli.api_token.as_deref())?, mock).await,
        Command::Account(account) => run_account(&config, account).await,
    }
}

fn api_client(base_url: &str, token: Option<&str>) -> Result<ApiClient, CliError> {
    let api = ApiClient::new(base_url)?;
    api.set_auth_token(token);
    Ok(api)
}

async fn run_ping(api: &ApiClient) -> Result<(), CliError> {
    let info = api.info().await?;
    println!("ok: {} at {}", info.name, api.base_url());
    Ok(())
}

async fn run_nodes(api: &ApiClient) -> Result<(), CliError> {
    let nodes = api.nodes().await?;
    print!("{}", render_tree(&nodes));
    Ok(())
}

async fn run_mock(api: &ApiClient, mock: MockCommand) -> Result<(), CliError> {
    match mock.command {
        MockSubcommand::Register(args) => {
            let registered = api.register(&credentials(args)).await?;
            println!("registered id {}", registered.id);
        }
        MockSubcommand::Login(args) => {
            let login = api.login(&credentials(args)).await?;
            println!("{}", login.token);
        }
    }
    Ok(())
}

fn credentials(args: MockCredentials) -> Credentials {
    Credentials { username: args.username, password: args.password }
}

async fn run_account(config: &ClientConfig, account: AccountCommand) -> Result<(), CliError> {
    let file_cache = FileCache::open(&config.cache_path)?;
    tracing::debug!(path = %file_cache.path().display(), "local cache opened");
    let cache: Arc<dyn LocalCache> = Arc::new(file_cache);
    let identity = Arc::new(SupabaseAuth::new(&SupabaseConfig::from_env()?, cache.clone())?);
    let provider: Arc<dyn IdentityProvider> = identity.clone();
    let entitlements = Entitlements::new(
        provider,
        cache,
        Arc::new(StubPaymentValidator::new(config.payment_delay)),
    );

    let mut notices = entitlements.notices().subscribe();
    let subscription = entitlements.initialize().await;

    let outcome = match account.command {
        AccountSubcommand::Register { username, email, password } => {
            let mut form = AuthForm { mode: AuthMode::Register, username, email, password, ..AuthForm::new() };
            submit(&mut form, identity.as_ref(), &entitlements).await
        }
        AccountSubcommand::Login { email, password } => {
            let mut form = AuthForm { email, password, ..AuthForm::new() };
            let outcome = submit(&mut form, identity.as_ref(), &entitlements).await;
            if outcome.is_ok() {
                await_authenticated(&entitlements, true).await;
            }
            outcome
        }
        AccountSubcommand::Logout => {
            entitlements.logout().await;
            await_authenticated(&entitlements, false).await;
            Ok(())
        }
        AccountSubcommand::Status => {
            let state = entitlements.state();
            println!("authenticated: {}", state.is_authenticated);
            println!("premium: {}", state.is_premium);
            println!("username: {}", state.username);
            if state.premium_hint {
                println!("cached premium flag present (not verified)");
            }
            Ok(())
        }
        AccountSubcommand::Upgrade => {
            entitlements.upgrade_to_premium();
            if entitlements.complete_upgrade_to_premium().await {
                Ok(())
            } else {
                Err(CliError::Rejected("upgrade did not complete".into()))
            }
        }
        AccountSubcommand::Save { kind, data } => {
            let value = serde_json::from_str::<Value>(&data)?;
            if entitlements.save_user_data(&value, &kind) {
                Ok(())
            } else {
                Err(CliError::Rejected("data not saved".into()))
            }
        }
        AccountSubcommand::Load { kind } => {
            if let Some(value) = entitlements.get_user_data::<Value>(&kind) {
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            Ok(())
        }
    };

    subscription.unsubscribe();
    print_notices(&mut notices);
    outcome
}

async fn submit(form: &mut AuthForm, identity: &dyn IdentityProvider, entitlements: &Entitlements) -> Result<(), CliError> {
    let mode = form.mode;
    let user = form
        .submit(identity, entitlements, |user| {
            tracing::debug!(user_id = %user.id, "auth form submitted");
        })
        .await;

    match (user, form.error.take()) {
        (Some(user), _) => {
            match mode {
                AuthMode::Register => println!("registered {}; check your email, then log in", user.id),
                AuthMode::Login => println!("signed in as {}", entitlements.state().username),
            }
            Ok(())
        }
        (None, Some(error)) => Err(CliError::Rejected(error)),
        (None, None) => Err(CliError::Rejected("no user returned".into())),
    }
}

/// Events are applied by a background task; give it a moment before exiting
/// so the cache reflects the new session.
async fn await_authenticated(entitlements: &Entitlements, authenticated: bool) {
    let mut state = entitlements.subscribe();
    let settled = tokio::time::timeout(AUTH_EVENT_WAIT, state.wait_for(|s| s.is_authenticated == authenticated)).await;
    if settled.is_err() {
        tracing::warn!(authenticated, "auth change not observed before timeout");
    }
}

fn print_notices(notices: &mut broadcast::Receiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        eprintln!("{}", format_notice(&notice));
    }
}

fn format_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}", notice.message)
}

/// Indented outline of the node tree, children in `sort_order`.
fn render_tree(nodes: &[NodeRecord]) -> String {
    fn walk(nodes: &[NodeRecord], parent: Option<i64>, depth: usize, out: &mut String) {
        for node in children_of(nodes, parent) {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&node.name);
            out.push('\n');
            walk(nodes, Some(node.id), depth + 1, out);
        }
    }

    let mut out = String::new();
    walk(nodes, None, 0, &mut out);
    out
}
