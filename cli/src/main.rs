use std::sync::Arc;

use authkeeper::{
    ConfigError, NormalizedError, RegistrationError, RegistrationForm, RequestClient, SessionConfig, SessionState,
    SessionStore, TracingNavigator, UnauthorizedSignal,
};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("request failed ({}): {}", .0.status_code, .0.message)]
    Request(#[from] NormalizedError),
    #[error("invalid registration: {0}")]
    Registration(#[from] RegistrationError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("signal handler failed: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "authkeeper", about = "Session lifecycle CLI for a cookie-authenticated API")]
struct Cli {
    #[arg(long, env = "AUTH_API_BASE_URL")]
    base_url: String,

    #[arg(long, env = "AUTH_SESSION_TOKEN", hide_env_values = true, help = "Existing session cookie value to resume")]
    session_token: Option<String>,

    #[arg(long, env = "AUTH_SESSION_COOKIE", default_value = "session")]
    session_cookie: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run silent resumption and print the resulting session.
    Resume,
    /// Sign in with email and password.
    Login(LoginArgs),
    /// Create an account and sign in.
    Register(RegisterArgs),
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,

    #[arg(long, env = "AUTH_PASSWORD", hide_env_values = true)]
    password: String,

    #[command(flatten)]
    after: AfterSignIn,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    email: String,

    #[arg(long, env = "AUTH_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long)]
    confirm_password: String,

    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    #[arg(long)]
    display_name: Option<String>,

    #[command(flatten)]
    after: AfterSignIn,
}

#[derive(Args, Debug)]
struct AfterSignIn {
    #[arg(long, default_value_t = false, help = "Keep renewing and print state changes until Ctrl-C")]
    watch: bool,

    #[arg(long, default_value_t = false, help = "Sign out before exiting")]
    logout: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let store = build_store(&cli)?;
    store.init().await;

    let result = match cli.command {
        Command::Resume => print_state(&store.snapshot()),
        Command::Login(args) => run_login(&store, args).await,
        Command::Register(args) => run_register(&store, args).await,
    };
    store.shutdown();
    result
}

/// Seed the cookie store with `--session-token` when given so `init` can
/// resume that session.
fn build_store(cli: &Cli) -> Result<SessionStore, CliError> {
    let config = SessionConfig::from_env_with_base_url(&cli.base_url)?;
    let navigator = Arc::new(TracingNavigator::new());
    let Some(token) = cli.session_token.as_deref() else {
        return Ok(SessionStore::new(config, navigator)?);
    };
    let client = RequestClient::with_session_cookie(&config, UnauthorizedSignal::new(), &cli.session_cookie, token)?;
    Ok(SessionStore::with_client(config, client, navigator))
}

async fn run_login(store: &SessionStore, args: LoginArgs) -> Result<(), CliError> {
    store.login(&args.email, &args.password).await?;
    print_state(&store.snapshot())?;
    run_after_sign_in(store, &args.after).await
}

async fn run_register(store: &SessionStore, args: RegisterArgs) -> Result<(), CliError> {
    let form = RegistrationForm {
        email: args.email,
        password: args.password,
        confirm_password: args.confirm_password,
        first_name: args.first_name,
        last_name: args.last_name,
        display_name: args.display_name,
    };
    let parts = form.into_parts()?;
    store
        .register(
            &parts.email,
            &parts.password,
            &parts.first_name,
            &parts.last_name,
            parts.display_name.as_deref(),
        )
        .await
        .inspect_err(|e| {
            if let Some(code) = e.code {
                tracing::warn!(?code, hint = code.describe(), "registration rejected");
            }
        })?;
    print_state(&store.snapshot())?;
    run_after_sign_in(store, &args.after).await
}

async fn run_after_sign_in(store: &SessionStore, after: &AfterSignIn) -> Result<(), CliError> {
    if after.watch {
        watch(store).await?;
    }
    if after.logout {
        store.logout().await;
        print_state(&store.snapshot())?;
    }
    Ok(())
}

/// Print every state change until the session ends or Ctrl-C.
async fn watch(store: &SessionStore) -> Result<(), CliError> {
    let mut rx = store.subscribe();
    tracing::info!("watching session; Ctrl-C to stop");
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let state = rx.borrow_and_update().clone();
                print_state(&state)?;
                if !state.is_authenticated() {
                    return Ok(());
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                return Ok(());
            }
        }
    }
}

fn print_state(state: &SessionState) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(&json!({
        "authenticated": state.is_authenticated(),
        "loading": state.is_loading(),
        "user": state.user(),
    }))?;
    println!("{rendered}");
    Ok(())
}
