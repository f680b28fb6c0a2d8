mod args;
mod commands;
mod console;

use services::{ApiConfig, AppServices, Clock};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use args::{Args, Command, prepare_sqlite_file, print_usage};
use commands::CommandError;
use console::Prompt;

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match Args::parse(std::env::args().skip(1)) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    let env_config = ApiConfig::from_env()?;
    let api_config = match &parsed.api_url {
        Some(url) => ApiConfig::new(url)?.with_timeout(env_config.timeout),
        None => env_config,
    };

    // Open + migrate SQLite at startup so the services see a ready store.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, &api_config, Clock::system()).await?;
    let mut auth = app.auth_session().await;
    debug!(api = %api_config.base_url, signed_in = auth.is_signed_in(), "starting");

    let mut prompt = Prompt::stdin();
    let outcome = match parsed.command {
        Command::Login { email, password } => commands::login(&mut auth, email, password).await,
        Command::Logout => {
            commands::logout(&mut auth).await;
            Ok(())
        }
        Command::Quiz { subject } => commands::quiz(&app, &auth, subject, &mut prompt).await,
        Command::Results { page } => commands::results(&app, &auth, page, &mut prompt).await,
        Command::Result { id, review } => commands::result(&app, &auth, &id, review).await,
    };

    match outcome {
        Err(err) if err.is_unauthorized() => {
            warn!(error = %err, "stored session rejected");
            auth.invalidate().await;
            Err(Box::new(CommandError::SessionExpired))
        }
        other => Ok(other?),
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
