//! `slots` CLI: specialist availability from Calendly, in the terminal.
//!
//! ## Usage
//!
//! ```sh
//! export CALENDLY_API_KEY=...
//! export SLOTS_ROSTER=roster.json
//!
//! # Bookable slots for one language, in the viewer's time zone
//! slots language --language German --timezone Europe/Paris
//!
//! # Raw availability per specialist (admin view)
//! slots admin
//!
//! # Per-language and per-specialist bookable counts per day
//! slots report --json
//!
//! # Booked appointments per specialist, last 7 and next 14 days
//! slots booked --lookback-days 7 --lookahead-days 14
//!
//! # Developer tooling for filling in roster URIs
//! slots whoami
//! slots event-types --user https://api.calendly.com/users/XXXX
//! slots members
//!
//! # Check the roster file without calling Calendly
//! slots roster
//! ```

mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::Serialize;
use slot_engine::booked::{booked_counts, booked_window};
use slot_engine::settings::resolve_timezone;
use slot_engine::{
    AvailabilityService, CalendlyClient, Credential, EventOwner, Roster, Settings, SlotError,
    DEFAULT_BASE_URL,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Specialist availability from Calendly"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Roster JSON file
    #[arg(long, env = "SLOTS_ROSTER", global = true)]
    roster: Option<PathBuf>,

    /// Calendly personal access token
    #[arg(long, env = "CALENDLY_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Calendly API base URL
    #[arg(long, env = "CALENDLY_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    api_url: String,

    /// Evaluate as of this instant (RFC 3339) instead of the current time
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Bookable slots for everyone speaking one language
    Language {
        #[arg(short, long)]
        language: String,
        /// IANA zone or preset label (defaults to SLOTS_DISPLAY_TIMEZONE)
        #[arg(short, long)]
        timezone: Option<String>,
    },
    /// Raw availability per specialist
    Admin,
    /// Bookable counts per specialist and per language, per day
    Report {
        /// IANA zone or preset label (defaults to SLOTS_DISPLAY_TIMEZONE)
        #[arg(short, long)]
        timezone: Option<String>,
    },
    /// Booked appointments per specialist
    Booked {
        #[arg(long, default_value_t = 7, value_parser = day_count())]
        lookback_days: u32,
        #[arg(long, default_value_t = 14, value_parser = day_count())]
        lookahead_days: u32,
        /// Organization URI (resolved from the API key if omitted)
        #[arg(long)]
        organization: Option<String>,
    },
    /// Show the user and organization behind the API key
    Whoami,
    /// List a user's event types
    EventTypes {
        /// User URI (defaults to the API key's user)
        #[arg(long)]
        user: Option<String>,
    },
    /// List the organization's members
    Members {
        /// Organization URI (resolved from the API key if omitted)
        #[arg(long)]
        organization: Option<String>,
    },
    /// Validate the roster and list who takes part
    Roster,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("Invalid SLOTS_* environment setting")?;
    let now = cli.now.unwrap_or_else(Utc::now);

    match &cli.command {
        Commands::Language { language, timezone } => {
            let roster = load_roster(&cli)?;
            let timezone = pick_timezone(timezone.as_deref(), &settings)?;
            let service = AvailabilityService::new(Arc::new(client(&cli)?), settings.clone());
            let view = service
                .language_view(&roster, language, timezone, now)
                .await
                .context("Failed to fetch availability")?;
            emit(&cli, &view, || render::language(&view, &settings))?;
        }
        Commands::Admin => {
            let roster = load_roster(&cli)?;
            let service = AvailabilityService::new(Arc::new(client(&cli)?), settings.clone());
            let view = service
                .admin_view(&roster, now)
                .await
                .context("Failed to fetch availability")?;
            emit(&cli, &view, || render::admin(&view))?;
        }
        Commands::Report { timezone } => {
            let roster = load_roster(&cli)?;
            let timezone = pick_timezone(timezone.as_deref(), &settings)?;
            let service = AvailabilityService::new(Arc::new(client(&cli)?), settings.clone());
            let report = service
                .aggregate_report(&roster, timezone, now)
                .await
                .context("Failed to fetch availability")?;
            emit(&cli, &report, || render::report(&report, &settings))?;
        }
        Commands::Booked {
            lookback_days,
            lookahead_days,
            organization,
        } => {
            let roster = load_roster(&cli)?;
            let client = client(&cli)?;
            let organization = match organization {
                Some(org) => org.clone(),
                None => client.current_user().await?.current_organization,
            };
            let window = booked_window(
                now,
                Duration::days(i64::from(*lookback_days)),
                Duration::days(i64::from(*lookahead_days)),
            );
            let participants = roster.participants(settings.team.as_deref());
            let counts = match booked_counts(
                &client,
                &participants,
                &EventOwner::Organization(organization),
                window,
            )
            .await
            {
                Ok(counts) => counts,
                Err(SlotError::PermissionDenied(message)) => bail!(
                    "Calendly refused the organization-wide event listing ({}). \
                     Booked counts need a token from an organization owner or admin.",
                    message
                ),
                Err(e) => return Err(e).context("Failed to count booked appointments"),
            };
            emit(&cli, &counts, || render::booked(&counts))?;
        }
        Commands::Whoami => {
            let user = client(&cli)?.current_user().await?;
            emit(&cli, &user, || {
                format!(
                    "{}\n  user:         {}\n  organization: {}\n",
                    user.name, user.uri, user.current_organization
                )
            })?;
        }
        Commands::EventTypes { user } => {
            let client = client(&cli)?;
            let user = match user {
                Some(user) => user.clone(),
                None => client.current_user().await?.uri,
            };
            let types = client.event_types(&user).await?;
            emit(&cli, &types, || render::event_types(&types))?;
        }
        Commands::Members { organization } => {
            let client = client(&cli)?;
            let organization = match organization {
                Some(org) => org.clone(),
                None => client.current_user().await?.current_organization,
            };
            let members = client.organization_members(&organization).await?;
            emit(&cli, &members, || render::members(&members))?;
        }
        Commands::Roster => {
            let roster = load_roster(&cli)?;
            emit(&cli, &roster, || render::roster(&roster, settings.team.as_deref()))?;
        }
    }

    Ok(())
}

/// Booked-count ranges are limited to ten years either way.
fn day_count() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(0..=3650)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info,slot_engine=info", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_roster(cli: &Cli) -> Result<Roster> {
    let Some(path) = &cli.roster else {
        bail!("No roster given. Pass --roster <FILE> or set SLOTS_ROSTER.");
    };
    Ok(Roster::load(path)?)
}

fn client(cli: &Cli) -> Result<CalendlyClient> {
    let credential = Credential::new(cli.api_key.clone())
        .context("Configuration error: set CALENDLY_API_KEY or pass --api-key")?;
    Ok(CalendlyClient::new(&cli.api_url, credential))
}

fn pick_timezone(requested: Option<&str>, settings: &Settings) -> Result<Tz> {
    match requested {
        Some(name) => Ok(resolve_timezone(name)?),
        None => Ok(settings.display_timezone),
    }
}

fn emit<T, F>(cli: &Cli, value: &T, text: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    if cli.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}
