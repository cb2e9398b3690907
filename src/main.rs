//! SLauncher - home screen launcher backed by a shared app icon cache
//!
//! Headless front end: restores the saved grid, binds every slot through the
//! icon cache and prints what each slot shows.

mod config;
mod event_bus;
mod functions;
mod panels;
mod services;

use config::LauncherConfig;
use env_logger::Env;
use functions::formatting::readable_bytes;
use log::{debug, info, warn};
use panels::events::{self, LauncherEvent};
use panels::grid::{AppGrid, CellIcon};
use slauncher_apps::{AppSelection, get_config_path, get_selection_path};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    println!("Starting SLauncher...");

    let mut event_rx = events::subscribe();

    let config = LauncherConfig::load(&get_config_path());
    let status = services::start_all(&config)?;
    println!("Found {} apps", status.catalog.len());

    // Restore the home screen
    let selection = AppSelection::load(&get_selection_path());
    let mut grid = AppGrid::new(selection.app_count, status.icons.clone());
    grid.update_selected_apps(selection.resolve(&status.catalog));
    grid.preload_visible_icons();

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let cells = runtime.block_on(grid.bind_all());

    for (position, cell) in cells.iter().enumerate() {
        let name = grid
            .app_at(position)
            .map_or("(empty)", |app| app.app_name.as_str());
        let shown = match cell {
            CellIcon::Empty => "-".to_string(),
            CellIcon::Ready(icon) => format!("{}x{} icon", icon.width(), icon.height()),
            CellIcon::Placeholder => "placeholder".to_string(),
        };
        println!("[{position}] {name:<32} {shown}");
    }
    let ready = cells.iter().filter(|cell| cell.is_ready()).count();
    println!("{} of {} slots have icons", ready, cells.len());

    for event in events::drain_latest(&mut event_rx) {
        match event {
            LauncherEvent::IconFailed(key) => warn!("No icon for {}", key),
            LauncherEvent::CatalogRefreshed { app_count } => {
                info!("Catalog indexed {} apps", app_count)
            }
            other => debug!("{:?}", other),
        }
    }

    let usage = status.icons.utilization();
    println!(
        "{} ({} of {})",
        status.icons.cache_info(),
        readable_bytes(usage.total_cost),
        readable_bytes(usage.capacity)
    );

    services::stop_all();
    Ok(())
}
