use crate::analysis::Palette;
use crate::api::{
    AirQualityFetcher, AirQualitySource, CityComparisonEntry, CityComparisonFetcher, OpenMeteoClient,
};
use crate::cli::render;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::dashboard::{Dashboard, DashboardSnapshot};
use crate::error::{AppError, Result};
use crate::geolocation::{LocationStore, ManualGeolocation, PermissionStateMachine};
use crate::models::{PermissionState, Position};
use clap::{Args, Parser, Subcommand};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Accuracy reported for coordinates typed in by the user.
const MANUAL_ACCURACY_METERS: f64 = 50.0;

/// Location-aware air quality dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Runs the interactive menu when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the dashboard for a coordinate pair
    Show(ShowArgs),

    /// Compare an AQI value with the reference cities
    Cities(CitiesArgs),
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Bypass the cached dataset
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CitiesArgs {
    /// AQI of the current location
    #[arg(long)]
    pub aqi: f64,
}

/// Entries of the interactive menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ShareLocation,
    DenyLocation,
    Refresh,
    ForceRefresh,
    CompareCities,
    ClearPermissions,
    Exit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 7] = [
        MenuAction::ShareLocation,
        MenuAction::DenyLocation,
        MenuAction::Refresh,
        MenuAction::ForceRefresh,
        MenuAction::CompareCities,
        MenuAction::ClearPermissions,
        MenuAction::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::ShareLocation => "Share / update my location",
            MenuAction::DenyLocation => "Deny location access",
            MenuAction::Refresh => "Show air quality",
            MenuAction::ForceRefresh => "Force refresh air quality",
            MenuAction::CompareCities => "Compare with other cities",
            MenuAction::ClearPermissions => "Clear location permissions",
            MenuAction::Exit => "Exit",
        }
    }

    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|a| a.label()).collect()
    }
}

/// CLI application
pub struct App {
    palette: Palette,
    platform: Arc<ManualGeolocation>,
    location: Arc<PermissionStateMachine>,
    dashboard: Dashboard,
    cities: CityComparisonFetcher,
}

impl App {
    /// Wires the application from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let source: Arc<dyn AirQualitySource> =
            Arc::new(OpenMeteoClient::with_base_url(&config.air_quality_url));
        let platform = Arc::new(ManualGeolocation::new());
        let store = LocationStore::open(&config.state_file, &config.session)?;
        info!("Location store at {}", store.path().display());

        Ok(Self::with_parts(
            config,
            source,
            platform,
            Some(store),
            Arc::new(SystemClock),
        ))
    }

    pub fn with_parts(
        config: &Config,
        source: Arc<dyn AirQualitySource>,
        platform: Arc<ManualGeolocation>,
        store: Option<LocationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let location = Arc::new(PermissionStateMachine::new(platform.clone(), store));
        let dashboard = Dashboard::new(
            Arc::clone(&location),
            AirQualityFetcher::new(Arc::clone(&source), config.air_quality_retry, Arc::clone(&clock)),
            CityComparisonFetcher::new(Arc::clone(&source), config.city_retry, config.palette),
            config.palette,
            clock,
        );
        let cities = CityComparisonFetcher::new(source, config.city_retry, config.palette);

        Self {
            palette: config.palette,
            platform,
            location,
            dashboard,
            cities,
        }
    }

    pub fn location(&self) -> &Arc<PermissionStateMachine> {
        &self.location
    }

    /// Restores any location of this session and starts listening for
    /// permission changes.
    pub async fn start(&self) {
        self.location.mount().await;
    }

    pub fn stop(&self) {
        self.location.unmount();
    }

    /// Runs a non-interactive command.
    pub async fn run_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Show(args) => {
                let position = validate_position(args.lat, args.lon)?;
                self.share_location(position).await?;
                self.show_dashboard(args.force).await?;
            },
            Commands::Cities(args) => {
                if !args.aqi.is_finite() || args.aqi < 0.0 {
                    return Err(AppError::Cli(format!(
                        "AQI must be a non-negative number, got {}",
                        args.aqi
                    )));
                }
                let entries = with_spinner("Comparing reference cities...", self.cities.fetch(args.aqi))
                    .await?;
                print_cities(&entries);
            },
        }
        Ok(())
    }

    /// Runs one menu action. Returns `false` when the user chose to exit.
    pub async fn run_action(&self, action: MenuAction) -> Result<bool> {
        match action {
            MenuAction::ShareLocation => {
                let position = prompt_position()?;
                if let Err(e) = self.share_location(position).await {
                    println!("{}", e.to_string().red());
                }
                render::print_location(&self.location.state());
            },
            MenuAction::DenyLocation => {
                self.platform.deny();
                // Watch callbacks apply the denial synchronously.
                render::print_location(&self.location.state());
            },
            MenuAction::Refresh => self.show_dashboard(false).await?,
            MenuAction::ForceRefresh => self.show_dashboard(true).await?,
            MenuAction::CompareCities => match self.refresh(false).await? {
                Some(snapshot) => print_cities(&snapshot.cities),
                None => println!("{}", "Share your location first.".yellow()),
            },
            MenuAction::ClearPermissions => {
                self.location.clear_permissions();
                println!("{}", "Location permissions cleared.".green());
            },
            MenuAction::Exit => return Ok(false),
        }
        Ok(true)
    }

    /// The user grants access at `position`.
    ///
    /// While tracking, the new position reaches the state machine through the
    /// watch; otherwise a one-shot request is made.
    pub async fn share_location(&self, position: Position) -> Result<()> {
        self.platform.grant(position);
        if self.location.state().is_watching {
            return Ok(());
        }
        self.location
            .request_permission()
            .await
            .map(|_| ())
            .map_err(|e| AppError::Cli(e.to_string()))
    }

    async fn refresh(&self, force: bool) -> Result<Option<DashboardSnapshot>> {
        with_spinner("Fetching air quality...", self.dashboard.refresh(force)).await
    }

    async fn show_dashboard(&self, force: bool) -> Result<()> {
        match self.refresh(force).await? {
            Some(snapshot) => {
                render::print_location(&self.location.state());
                render::print_dashboard(&snapshot, self.palette);
            },
            None => {
                let state = self.location.state();
                if state.permission_state == PermissionState::Denied {
                    warn!("Dashboard requested without location permission");
                }
                render::print_location(&state);
            },
        }
        Ok(())
    }
}

fn print_cities(entries: &[CityComparisonEntry]) {
    println!("{}", "City comparison".bold());
    println!("{}", render::city_table(entries));
}

/// Shows a spinner until `task` completes.
async fn with_spinner<T>(message: &'static str, task: impl Future<Output = T>) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let output = task.await;
    spinner.finish_and_clear();
    Ok(output)
}

pub fn validate_position(latitude: f64, longitude: f64) -> Result<Position> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::Cli(format!(
            "Latitude must be between -90 and 90, got {}",
            latitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::Cli(format!(
            "Longitude must be between -180 and 180, got {}",
            longitude
        )));
    }
    Ok(Position {
        latitude,
        longitude,
        accuracy: MANUAL_ACCURACY_METERS,
    })
}

/// Asks for a coordinate pair.
pub fn prompt_position() -> Result<Position> {
    let theme = ColorfulTheme::default();
    let latitude: f64 = Input::with_theme(&theme)
        .with_prompt("Latitude")
        .validate_with(|v: &f64| -> std::result::Result<(), &str> {
            if (-90.0..=90.0).contains(v) {
                Ok(())
            } else {
                Err("Latitude must be between -90 and 90")
            }
        })
        .interact_text()?;
    let longitude: f64 = Input::with_theme(&theme)
        .with_prompt("Longitude")
        .validate_with(|v: &f64| -> std::result::Result<(), &str> {
            if (-180.0..=180.0).contains(v) {
                Ok(())
            } else {
                Err("Longitude must be between -180 and 180")
            }
        })
        .interact_text()?;
    validate_position(latitude, longitude)
}
