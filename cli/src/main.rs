
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use guessgame::client::{ClientError, GameClient, RegisterForm};
use guessgame::config::{
    ClientConfig, ConfigError, DEFAULT_API_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, Timeouts,
    default_data_dir,
};
use guessgame::net::oauth::{OAUTH_FAILED_ROUTE, OAUTH_SUCCESS_ROUTE};
use guessgame::net::{ApiError, Navigator, SIGN_IN_ROUTE};
use guessgame::state::credentials::CredentialStore;
use guessgame::state::notifier::Notifier;
use guessgame::state::session::{SessionView, SessionWatch, TokioIdleScheduler};
use guessgame::storage::{ConsentFlag, FileStorage, StorageError};
use serde::Serialize;
use serde_json::json;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

const STORAGE_POLL_INTERVAL: Duration = Duration::from_millis(500);
const REQUEST_FAILED: &str = "Request failed. Please try again.";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not signed in")]
    NotSignedIn,
}

impl CliError {
    /// Line shown to the user in addition to the generic recovery hint.
    fn user_message(&self) -> Option<String> {
        match self {
            Self::Client(error) => Some(error.user_message(REQUEST_FAILED)),
            Self::Api(error) => Some(error.user_message(REQUEST_FAILED)),
            Self::Config(error) => Some(error.to_string()),
            Self::NotSignedIn | Self::Storage(_) | Self::InvalidJson(_) | Self::Io(_) => None,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "guessgame-cli", about = "Character guessing game client")]
struct Cli {
    #[arg(long, env = "GUESSGAME_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[arg(long, env = "GUESSGAME_DATA_DIR", help = "Directory for durable storage [default: ~/.guessgame]")]
    data_dir: Option<PathBuf>,

    #[arg(long, env = "GUESSGAME_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    #[arg(long, env = "GUESSGAME_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register(RegisterArgs),
    Login {
        username: String,
        #[arg(long, env = "GUESSGAME_PASSWORD")]
        password: String,
    },
    Logout,
    /// Print the session once hydrated; `--follow` keeps printing on change.
    Status {
        #[arg(long, default_value_t = false)]
        follow: bool,
    },
    VerifyEmail {
        token: String,
    },
    ResendVerification {
        email: String,
    },
    Password(PasswordCommand),
    /// Complete an OAuth sign-in from the redirect URL or its query string.
    OauthCallback {
        url: String,
    },
    Game(GameCommand),
    Consent(ConsentCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    username: String,
    email: String,
    #[arg(long, env = "GUESSGAME_PASSWORD")]
    password: String,
    #[arg(long, help = "Defaults to --password")]
    confirm_password: Option<String>,
    #[arg(long, env = "GUESSGAME_RECAPTCHA_TOKEN")]
    recaptcha_token: String,
}

#[derive(Args, Debug)]
struct PasswordCommand {
    #[command(subcommand)]
    command: PasswordSubcommand,
}

#[derive(Subcommand, Debug)]
enum PasswordSubcommand {
    Reset(ResetCommand),
}

#[derive(Args, Debug)]
struct ResetCommand {
    #[command(subcommand)]
    command: ResetSubcommand,
}

#[derive(Subcommand, Debug)]
enum ResetSubcommand {
    Request {
        email: String,
    },
    Validate {
        token: String,
    },
    Confirm {
        token: String,
        #[arg(long, env = "GUESSGAME_PASSWORD")]
        password: String,
        #[arg(long, help = "Defaults to --password")]
        confirm_password: Option<String>,
    },
}

#[derive(Args, Debug)]
struct GameCommand {
    #[command(subcommand)]
    command: GameSubcommand,
}

#[derive(Subcommand, Debug)]
enum GameSubcommand {
    Start,
    Ask {
        question: String,
    },
    Guess {
        character_name: String,
    },
    Current {
        #[arg(long, default_value_t = false, help = "Start a game when none is in progress")]
        start_if_none: bool,
    },
    History,
}

#[derive(Args, Debug)]
struct ConsentCommand {
    #[command(subcommand)]
    command: ConsentSubcommand,
}

#[derive(Subcommand, Debug)]
enum ConsentSubcommand {
    Accept,
    Show,
}

/// Terminal stand-in for page navigation.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: &str) {
        match route {
            SIGN_IN_ROUTE => eprintln!("Signed out. Run `guessgame-cli login <username>` to sign in."),
            OAUTH_FAILED_ROUTE => eprintln!("OAuth sign-in failed. Try again or sign in with a password."),
            OAUTH_SUCCESS_ROUTE => eprintln!("Signed in. Run `guessgame-cli game current --start-if-none` to play."),
            other => tracing::debug!(route = other, "navigate"),
        }
    }
}

struct Context {
    client: GameClient,
    storage: Arc<FileStorage>,
}

fn build_context(cli: &Cli) -> Result<Context, CliError> {
    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()?,
    };
    let timeouts = Timeouts { request_secs: cli.request_timeout_secs, connect_secs: cli.connect_timeout_secs };
    let config = ClientConfig::new(&cli.api_url, data_dir, timeouts)?;
    let storage = Arc::new(FileStorage::in_dir(&config.data_dir));
    let credentials = CredentialStore::new(storage.clone(), Notifier::new());
    let client = GameClient::new(&config, credentials, Arc::new(TerminalNavigator))?;
    tracing::debug!(api = %config.api_base(), storage = %storage.path().display(), "client ready");
    Ok(Context { client, storage })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "command failed");
            if let Some(message) = error.user_message() {
                eprintln!("{message}");
            }
            eprintln!("Something went wrong. Try again, or run `guessgame-cli status` to check your session.");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = build_context(&cli)?;
    match cli.command {
        Command::Register(args) => run_register(&ctx, args).await,
        Command::Login { username, password } => {
            let user = ctx.client.sign_in(&username, &password).await?;
            println!("Signed in as {}", user.username);
            Ok(())
        }
        Command::Logout => {
            ctx.client.sign_out();
            Ok(())
        }
        Command::Status { follow } => run_status(&ctx, follow).await,
        Command::VerifyEmail { token } => print_json(&ctx.client.http().verify_email(&token).await?),
        Command::ResendVerification { email } => print_json(&ctx.client.http().resend_verification(&email).await?),
        Command::Password(password) => run_password(&ctx, password).await,
        Command::OauthCallback { url } => {
            let user = ctx.client.complete_oauth(&url)?;
            print_json(&user)
        }
        Command::Game(game) => run_game(&ctx, game).await,
        Command::Consent(consent) => run_consent(&ctx, consent),
    }
}

async fn run_register(ctx: &Context, args: RegisterArgs) -> Result<(), CliError> {
    let confirm = args.confirm_password.as_deref().unwrap_or(&args.password);
    let form = RegisterForm {
        username: &args.username,
        email: &args.email,
        password: &args.password,
        confirm_password: confirm,
        recaptcha_token: &args.recaptcha_token,
    };
    print_json(&ctx.client.register(&form).await?)
}

async fn run_password(ctx: &Context, password: PasswordCommand) -> Result<(), CliError> {
    let PasswordSubcommand::Reset(reset) = password.command;
    match reset.command {
        ResetSubcommand::Request { email } => print_json(&ctx.client.forgot_password(&email).await?),
        ResetSubcommand::Validate { token } => print_json(&ctx.client.http().validate_reset_token(&token).await?),
        ResetSubcommand::Confirm { token, password, confirm_password } => {
            let confirm = confirm_password.as_deref().unwrap_or(&password);
            print_json(&ctx.client.reset_password(&token, &password, confirm).await?)
        }
    }
}

async fn run_status(ctx: &Context, follow: bool) -> Result<(), CliError> {
    let runtime = tokio::runtime::Handle::current();
    let scheduler = TokioIdleScheduler::new(runtime.clone());
    let watch = SessionWatch::mount(ctx.client.reader(), &scheduler);
    let changed = Arc::new(Notify::new());
    let signal = changed.clone();
    let _listener = watch.subscribe(move || signal.notify_one());

    while !watch.is_hydrated() {
        changed.notified().await;
    }
    print_view(&watch.current())?;
    if !follow {
        return Ok(());
    }

    let poller = ctx.storage.watch_on(&runtime, STORAGE_POLL_INTERVAL);
    let outcome = loop {
        tokio::select! {
            () = changed.notified() => print_view(&watch.current())?,
            result = tokio::signal::ctrl_c() => break result,
        }
    };
    poller.abort();
    outcome?;
    Ok(())
}

fn print_view(view: &SessionView) -> Result<(), CliError> {
    print_json(&json!({
        "authenticated": view.authenticated,
        "hydrated": view.hydrated,
        "user": view.user,
    }))
}

/// The CLI reads storage synchronously, so the view counts as hydrated.
fn settled_view(ctx: &Context) -> SessionView {
    let snapshot = ctx.client.reader().read();
    SessionView { authenticated: snapshot.authenticated, user: snapshot.user.clone(), hydrated: true }
}

fn require_session(ctx: &Context) -> Result<(), CliError> {
    if ctx.client.guard(&settled_view(ctx)) {
        return Err(CliError::NotSignedIn);
    }
    Ok(())
}

async fn run_game(ctx: &Context, game: GameCommand) -> Result<(), CliError> {
    require_session(ctx)?;
    match game.command {
        GameSubcommand::Start => print_json(&ctx.client.start_game().await?),
        GameSubcommand::Ask { question } => {
            let answer = ctx.client.ask(&question).await?;
            println!("{answer}");
            Ok(())
        }
        GameSubcommand::Guess { character_name } => {
            let result = ctx.client.guess(&character_name).await?;
            print_json(&result)
        }
        GameSubcommand::Current { start_if_none } => {
            if start_if_none {
                if let Some(started) = ctx.client.auto_start(&settled_view(ctx)).await? {
                    return print_json(&started);
                }
                return print_json(&ctx.client.game_state().current);
            }
            print_json(&ctx.client.refresh_current().await?)
        }
        GameSubcommand::History => print_json(&ctx.client.history().await?),
    }
}

fn run_consent(ctx: &Context, consent: ConsentCommand) -> Result<(), CliError> {
    let flag = ConsentFlag::new(ctx.storage.as_ref());
    match consent.command {
        ConsentSubcommand::Accept => {
            flag.accept()?;
            println!("accepted");
        }
        ConsentSubcommand::Show => println!("{}", if flag.is_accepted() { "accepted" } else { "not accepted" }),
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
