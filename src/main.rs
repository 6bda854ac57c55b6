#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use coursepilot::{
    api::{ApiClient, HttpSessionResolver},
    handlers::CallbackHandler,
    routing::{MemoryHistory, Navigator, RouteGuard},
    session::{LogObserver, NoopObserver, SessionContext, SessionObserver},
    settings::CoursepilotSettings,
    storage::{FileTokenStore, TokenStore},
};
use std::sync::Arc;

/// Coursepilot - session tooling for the course assistant
#[derive(Parser, Debug)]
#[command(
    name = "coursepilot",
    version,
    about = "Inspect and drive the course assistant's login session",
    after_help = "EXAMPLES:\n    \
                  coursepilot login-url                                  # Where to start the login flow\n    \
                  coursepilot callback 'http://localhost/auth/callback?token=...'\n    \
                  coursepilot whoami                                     # Resolve the stored credential\n    \
                  coursepilot visit /admin                               # Ask the route guard"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the stored credential and print the signed-in user
    Whoami,

    /// Complete login from the identity provider's redirect location
    Callback {
        /// Full or relative callback location, e.g. /auth/callback?token=abc
        url: String,
    },

    /// Bootstrap the session and report the guard decision for a path
    Visit {
        /// Application path, e.g. /history
        path: String,
    },

    /// Forget the stored credential
    Logout,

    /// Print the URL that starts the external login flow
    LoginUrl,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Also loads .env and initializes the logger
    let settings =
        CoursepilotSettings::load().map_err(|e| anyhow!("Failed to load settings: {e}"))?;

    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::from_settings(&settings.storage));
    let client = ApiClient::from_settings(&settings.api, Arc::clone(&store))
        .context("Failed to build API client")?;

    let observer: Arc<dyn SessionObserver> = if settings.session.trace_transitions {
        Arc::new(LogObserver)
    } else {
        Arc::new(NoopObserver)
    };
    let context = SessionContext::builder(
        Arc::clone(&store),
        Arc::new(HttpSessionResolver::new(client.clone())),
    )
    .observer(observer)
    .keep_token_on_network_error(settings.session.keep_token_on_network_error)
    .build();
    client.set_unauthorized_hook(context.unauthorized_hook());

    match cli.command {
        Commands::Whoami => whoami(&context).await,
        Commands::Callback { url } => callback(context, &url).await,
        Commands::Visit { path } => visit(&context, &path).await,
        Commands::Logout => {
            context.logout().context("Failed to clear stored credential")?;
            println!("✓ Logged out");
            Ok(())
        }
        Commands::LoginUrl => {
            println!("{}", client.login_url()?);
            Ok(())
        }
    }
}

async fn whoami(context: &SessionContext) -> Result<()> {
    context.bootstrap().await;
    match context.snapshot().user() {
        Some(user) => println!("{} <{}> ({})", user.display_name(), user.email, user.role),
        None => println!("Not signed in"),
    }
    Ok(())
}

async fn callback(context: SessionContext, url: &str) -> Result<()> {
    let history = Arc::new(MemoryHistory::starting_at(url));
    let handler = CallbackHandler::new(context, history.clone());

    let outcome = handler.handle(url).await;
    let location = history.current().unwrap_or_default();
    match outcome {
        Ok(user) => {
            println!(
                "✓ Signed in as {} <{}>, continuing to {location}",
                user.display_name(),
                user.email
            );
            Ok(())
        }
        Err(e) => Err(anyhow!(e).context(format!("Login failed, returned to {location}"))),
    }
}

async fn visit(context: &SessionContext, path: &str) -> Result<()> {
    context.bootstrap().await;
    let outcome = RouteGuard::new(context.clone()).navigate(path);
    match outcome.redirect_location() {
        Some(location) => println!("{path}: {outcome} -> {location}"),
        None => println!("{path}: {outcome}"),
    }
    Ok(())
}
