use std::path::PathBuf;

use ascii_table::{Align, AsciiTable};
use clap::Parser;
use edmapp::file::EdmFile;
use edmapp::TempUnit;

#[derive(Parser)]
struct Args {
    #[arg(help = "Path to a JPI EDM data file")]
    file: PathBuf,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let data = match std::fs::read(&args.file) {
        Ok(data) => data,
        Err(e) => {
            println!("Unable to read '{}': {e}", args.file.display());
            std::process::exit(1);
        }
    };
    let file = match EdmFile::open(data, TempUnit::Original) {
        Ok(file) => file,
        Err(e) => {
            println!("Unable to parse '{}': {e}", args.file.display());
            std::process::exit(1);
        }
    };

    println!("Tail number: {}", file.tail_number().unwrap_or("(none)"));
    println!("Model: {}", file.model_string());
    if let Some(downloaded) = file.download_time() {
        println!("Downloaded: {}", downloaded.format("%Y-%m-%d %H:%M"));
    }
    println!("Flights: {}", file.flight_count());

    let data: Vec<[String; 6]> = file
        .flights()
        .iter()
        .map(|flight| {
            [
                flight.number().to_string(),
                flight
                    .start_time()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
                flight.samples().len().to_string(),
                format!("{:.2}", flight.duration_hours()),
                if flight.has_gps() { "GPS" } else { "" }.to_owned(),
                flight.parse_warnings().join("; "),
            ]
        })
        .collect();

    let mut table = AsciiTable::default();
    table.column(0).set_header("FLIGHT").set_align(Align::Right);
    table.column(1).set_header("START").set_align(Align::Left);
    table.column(2).set_header("SAMPLES").set_align(Align::Right);
    table.column(3).set_header("HOURS").set_align(Align::Right);
    table.column(4).set_header("GPS").set_align(Align::Center);
    table.column(5).set_header("WARNINGS").set_align(Align::Left);
    table.print(data);
}
