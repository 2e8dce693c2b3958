use clap::Parser;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Select};
use nefes::cli::{App, Cli, MenuAction};
use nefes::config::Config;
use nefes::error::Result;
use nefes::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = logging::init(&config)?;

    info!("Initializing air quality dashboard...");

    let app = match App::new(&config) {
        Ok(app) => {
            info!("Application initialized successfully.");
            app
        },
        Err(e) => {
            error!("Failed to initialize application: {:?}", e);
            println!(
                "{}",
                "Error: Failed to initialize application. Check logs.".red()
            );
            return Err(e);
        },
    };

    if let Some(command) = cli.command {
        let result = app.run_command(command).await;
        app.stop();
        return result;
    }

    println!("{}", "Welcome to the Air Quality Dashboard!".cyan().bold());
    app.start().await;
    nefes::cli::render::print_location(&app.location().state());

    // Main interactive loop
    loop {
        println!("\n---\n");

        let labels = MenuAction::labels();
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact_opt()? // Ctrl+C / Esc is treated as Exit
            .unwrap_or(labels.len() - 1);

        let action = MenuAction::ALL
            .get(selection)
            .copied()
            .unwrap_or(MenuAction::Exit);
        match app.run_action(action).await {
            Ok(true) => {},
            Ok(false) => {
                println!("{}", "Exiting application. Goodbye!".green());
                break;
            },
            Err(e) => {
                error!("Command execution failed: {:?}", e);
                println!(
                    "{} {}",
                    "Error executing command:".red(),
                    e.to_string().red()
                );
            },
        }
    }

    app.stop();
    Ok(())
}
