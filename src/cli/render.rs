//! Terminal rendering of location state, dashboard snapshots and city comparisons.

use crate::analysis::{AqiStatus, Palette};
use crate::api::CityComparisonEntry;
use crate::dashboard::DashboardSnapshot;
use crate::models::{hour_label, AirQualityDataset, LocationPermissionState};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};

/// Parses "#RRGGBB". Anything else is `None`.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn paint(text: &str, hex: &str) -> ColoredString {
    match hex_to_rgb(hex) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

fn cell_color(hex: &str) -> Color {
    match hex_to_rgb(hex) {
        Some((r, g, b)) => Color::Rgb { r, g, b },
        None => Color::Reset,
    }
}

/// "06:00, 07:00" or "none".
pub fn format_hours(hours: &[u32]) -> String {
    if hours.is_empty() {
        return "none".to_string();
    }
    hours.iter().map(|&h| hour_label(h)).collect::<Vec<_>>().join(", ")
}

pub fn fallback_notice(attempts: u32) -> String {
    format!(
        "Live data unavailable after {} attempt{}, showing sample data",
        attempts,
        if attempts == 1 { "" } else { "s" }
    )
}

pub fn print_location(state: &LocationPermissionState) {
    let map = state.map_view();
    let dialog = state.dialog_view();

    println!("{} {}", "Location permission:".bold(), dialog.permission_state);
    match (map.is_renderable(), map.latitude, map.longitude) {
        (true, Some(lat), Some(lon)) => {
            let accuracy = map
                .accuracy_meters
                .map(|a| format!(" ±{:.0}m", a))
                .unwrap_or_default();
            println!("{} ({:.4}, {:.4}){}", "Position:".bold(), lat, lon, accuracy);
            if state.is_watching {
                println!("{}", "Tracking location changes".dimmed());
            }
        },
        _ => println!("{}", "Position unknown".dimmed()),
    }
    if dialog.loading {
        println!("{}", "Requesting location...".yellow());
    }
    if let Some(error) = &dialog.error {
        println!("{}", error.red());
    }
    if dialog.should_prompt() {
        println!(
            "{}",
            "Share your location to see air quality where you are.".cyan()
        );
    }
}

/// Latest pollutant values, one row per pollutant.
pub fn pollutant_table(snapshot: &DashboardSnapshot) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Pollutant", "Value", "Sub-index", "Correlation with AQI"]);

    let dataset = snapshot.dataset();
    for series in &dataset.pollutants {
        let sub_index = snapshot
            .metrics
            .individual_aqis
            .iter()
            .find(|(p, _)| *p == series.pollutant)
            .map(|(_, v)| *v)
            .unwrap_or_default();
        let correlation = snapshot
            .metrics
            .correlations
            .iter()
            .find(|(p, _)| *p == series.pollutant)
            .map(|(_, r)| *r)
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(series.name).fg(cell_color(series.color)),
            Cell::new(format!("{:.1} {}", series.value, series.unit))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.0}", sub_index)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:+.2}", correlation)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// The 24-hour series with AQI cells coloured by band.
pub fn hourly_table(dataset: &AirQualityDataset, palette: Palette) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Hour", "AQI", "Status", "PM2.5", "PM10", "NO2", "O3", "SO2", "CO"]);

    for entry in &dataset.hourly {
        let color = cell_color(palette.color(entry.aqi));
        let r = &entry.readings;
        table.add_row(vec![
            Cell::new(&entry.time),
            Cell::new(format!("{:.0}", entry.aqi)).fg(color),
            Cell::new(AqiStatus::from_aqi(entry.aqi).label()).fg(color),
            Cell::new(format!("{:.1}", r.pm25)),
            Cell::new(format!("{:.1}", r.pm10)),
            Cell::new(format!("{:.1}", r.no2)),
            Cell::new(format!("{:.1}", r.o3)),
            Cell::new(format!("{:.1}", r.so2)),
            Cell::new(format!("{:.0}", r.co)),
        ]);
    }
    table
}

pub fn city_table(entries: &[CityComparisonEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["City", "AQI", "Status"]);

    for entry in entries {
        let color = cell_color(entry.display_color);
        let name = if entry.is_current_location {
            Cell::new(&entry.name).fg(Color::Cyan)
        } else {
            Cell::new(&entry.name)
        };
        table.add_row(vec![
            name,
            Cell::new(format!("{:.0}", entry.aqi))
                .fg(color)
                .set_alignment(CellAlignment::Right),
            Cell::new(AqiStatus::from_aqi(entry.aqi).label()).fg(color),
        ]);
    }
    table
}

pub fn print_dashboard(snapshot: &DashboardSnapshot, palette: Palette) {
    let dataset = snapshot.dataset();
    let metrics = &snapshot.metrics;

    if snapshot.fetch.is_fallback {
        println!("{}", fallback_notice(snapshot.fetch.attempts).yellow());
    }

    let current = &dataset.current;
    println!(
        "{} {} ({})",
        "Current AQI:".bold(),
        paint(&format!("{:.0}", current.aqi), metrics.status_color).bold(),
        paint(current.status.label(), metrics.status_color)
    );

    let main = &metrics.main_pollutant;
    let verdict = if main.exceeds_guideline() {
        format!("{:.1}x the guideline", main.ratio).red()
    } else {
        "within guideline".green()
    };
    println!(
        "{} {} at {:.1} {} ({})",
        "Main pollutant:".bold(),
        main.pollutant.name(),
        main.value,
        main.pollutant.unit(),
        verdict
    );

    println!("{}", pollutant_table(snapshot));
    println!("{}", hourly_table(dataset, palette));

    if let (Some(cleanest), Some(dirtiest)) = (metrics.extremes.cleanest, metrics.extremes.dirtiest) {
        println!(
            "{} {}   {} {}",
            "Cleanest hour:".bold(),
            hour_label(cleanest).green(),
            "Dirtiest hour:".bold(),
            hour_label(dirtiest).red()
        );
    }

    let rec = &metrics.recommendations;
    if let Some(advice) = rec.current {
        println!("{} {}", "Outdoors right now:".bold(), advice.label());
    }
    println!("{} {}", "Sports:".bold(), format_hours(&rec.sports));
    println!("{} {}", "Children:".bold(), format_hours(&rec.children));
    println!("{} {}", "Walking:".bold(), format_hours(&rec.walking));

    println!("{}", city_table(&snapshot.cities));
}
