// Entry point and interactive query loop.
//
// The terminal stands in for the map page's controls:
// - Option [1] selects a region (state key or `all-states`) and rebuilds the map.
// - Option [2] switches the statistic that drives the coloring.
// - Option [3] shows the hover text for one boundary feature.
// - Option [4] lists the regions with data.
// A failed build prints why and keeps showing the previous map.
use anyhow::Result;
use casemap::config::AppConfig;
use casemap::output;
use casemap::session::{MapSession, MapView};
use casemap::source::DirectorySource;
use casemap::types::StatKind;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration; built-in defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Print `label` and read one trimmed line from stdin.
fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn print_view(view: &MapView) {
    println!();
    for line in view.info_panel() {
        println!("{}", line);
    }
    println!();
    println!("{}\n", output::preview_legend(&view.legend));
    if !view.join_report.unmatched_features.is_empty() {
        println!(
            "({} of {} shapes have no data)\n",
            view.join_report.unmatched_features.len(),
            view.features.len()
        );
    }
}

fn print_regions(session: &MapSession<DirectorySource>) {
    let (Some(store), Some(view)) = (session.store(), session.view()) else {
        println!("No data loaded yet.\n");
        return;
    };
    println!("Regions: {}\n", store.keys().join(", "));
    if let Some(bucket) = store.get(&view.region) {
        println!("{}\n", output::preview_regions(bucket, 10));
    }
}

async fn handle_select_region(session: &MapSession<DirectorySource>) {
    let region = prompt("Enter region: ");
    match session.select_region(&region).await {
        Ok(_) => {
            if let Some(view) = session.view() {
                print_view(&view);
            }
        }
        Err(e) => eprintln!("Map not updated: {}\n", e),
    }
}

fn handle_select_stat(session: &MapSession<DirectorySource>) {
    let input = prompt("Enter statistic (confirmed/deaths/recovered): ");
    let stat: StatKind = match input.parse() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}\n", e);
            return;
        }
    };
    match session.select_stat(stat) {
        Ok(()) => {
            if let Some(view) = session.view() {
                print_view(&view);
            }
        }
        Err(e) => eprintln!("Map not updated: {}\n", e),
    }
}

fn handle_details(session: &MapSession<DirectorySource>) {
    let Some(view) = session.view() else {
        println!("No map shown yet.\n");
        return;
    };
    let name = prompt("Enter shape name: ");
    match view.tooltip(&name) {
        Some(lines) => println!("{}\n", lines.join("\n")),
        None => println!("No shape named '{}' on this map.\n", name),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    let source = DirectorySource::new(&config.data.reports_dir, &config.data.maps_dir);
    let session = MapSession::new(source, config.session_options());

    let initial = session.selection().region;
    match session.select_region(&initial).await {
        Ok(_) => {
            if let Some(view) = session.view() {
                print_view(&view);
            }
        }
        Err(e) => eprintln!("Could not build the initial map: {}\n", e),
    }

    loop {
        println!("[1] Select region");
        println!("[2] Select statistic");
        println!("[3] Shape details");
        println!("[4] List regions");
        println!("[0] Exit\n");
        match prompt("Enter choice: ").as_str() {
            "1" => handle_select_region(&session).await,
            "2" => handle_select_stat(&session),
            "3" => handle_details(&session),
            "4" => print_regions(&session),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-4.\n"),
        }
    }
    Ok(())
}
