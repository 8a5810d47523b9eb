use broadstreet::cache::DatasetCache;
use broadstreet::config::AppConfig;
use broadstreet::stats::{self, Summary};
use broadstreet::{export, server};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and print the outbreak statistics
    Summary {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Rebuild the dataset even if a cached copy exists
        #[arg(long)]
        refresh: bool,
    },
    /// Export the joined death records as CSV
    Export {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long, value_name = "FILE", default_value = "joined.csv")]
        out: PathBuf,
    },
    /// Serve the joined dataset and summary to the dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cache = DatasetCache::new();

    match &cli.command {
        Commands::Summary { config, refresh } => {
            let app_config = AppConfig::load_from_file(config)?;
            let dataset = cache.load(&app_config, *refresh)?;
            print_summary(&stats::summarize(&dataset));
        }
        Commands::Export { config, out } => {
            let app_config = AppConfig::load_from_file(config)?;
            let dataset = cache.load(&app_config, false)?;
            export::write_joined_csv(&dataset, out)?;
            println!("Exported {} records to {:?}", dataset.deaths.len(), out);
        }
        Commands::Serve { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            // Build the full dataset before binding: the dashboard never
            // sees a partially joined dataset, it sees the error instead.
            let dataset = cache.load(&app_config, false)?;
            server::start_server(app_config, dataset).await?;
        }
    }

    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("Deaths");
    println!("  Total deaths:            {}", summary.total_deaths);
    println!("  Death locations:         {}", summary.death_locations);
    println!(
        "  Avg deaths per location: {:.1}",
        summary.mean_deaths_per_location
    );
    println!(
        "  Max deaths at a location: {}",
        summary.max_deaths_at_location
    );
    println!("Pumps");
    println!("  Total pumps:             {}", summary.pump_count);
    println!(
        "  Avg distance to pump:    {:.1} m",
        summary.mean_distance_m
    );
    println!("  Max distance to pump:    {:.1} m", summary.max_distance_m);
    println!("  Closest:                 {:.1} m", summary.min_distance_m);
    println!("  75% within:              {:.1} m", summary.distance_p75_m);
    println!("Deaths by nearest pump");
    for group in &summary.deaths_by_pump {
        println!(
            "  pump {:<6} {:>5} deaths, mean distance {:.1} m",
            group.pump_id, group.total_deaths, group.mean_distance_m
        );
    }
}
