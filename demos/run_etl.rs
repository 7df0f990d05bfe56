use chrono::NaiveDate;
use open_meteo_etl::{ConflictResolution, EtlConfig, ForecastRequest, OpenMeteoEtl, OutputTargets};
use std::env;
use std::error::Error;

/// Usage: `cargo run --example run_etl -- [START_DATE] [END_DATE] [NOTHING|UPDATE]`
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let defaults = ForecastRequest::default();
    let start_date = match args.first() {
        Some(s) => s.parse::<NaiveDate>()?,
        None => defaults.start_date,
    };
    let end_date = match args.get(1) {
        Some(s) => s.parse::<NaiveDate>()?,
        None => defaults.end_date,
    };
    let conflict_resolution = match args.get(2) {
        Some(s) => s.parse::<ConflictResolution>()?,
        None => ConflictResolution::default(),
    };

    let config = EtlConfig::builder()
        .request(
            ForecastRequest::builder()
                .start_date(start_date)
                .end_date(end_date)
                .build(),
        )
        .output(
            OutputTargets::builder()
                .conflict_resolution(conflict_resolution)
                .build(),
        )
        .build();
    let etl = OpenMeteoEtl::builder().config(config).build();

    let outcome = etl.run().await;
    println!("success: {} ({})", outcome.success, outcome.stage);
    println!("{}", outcome.message);
    for load in &outcome.loads {
        println!("  {}", load);
        for failure in &load.failures {
            println!("    {}: {}", failure.key, failure.message);
        }
    }

    Ok(())
}
