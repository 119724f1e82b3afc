use std::path::PathBuf;

use clap::Parser;
use edmapp::file::EdmFile;
use edmapp::TempUnit;

#[derive(Parser)]
struct Args {
    #[arg(help = "Path to a JPI EDM data file")]
    file: PathBuf,
    #[arg(short = 'f', help = "Export only this flight number")]
    flight: Option<u16>,
    #[arg(short = 'o', default_value = ".", help = "Directory for CSV output")]
    output: PathBuf,
    #[arg(short = 'u', default_value = "original", value_parser = parse_unit,
          help = "Temperature unit: original, celsius or fahrenheit")]
    unit: TempUnit,
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
    let file = match EdmFile::open(data, args.unit) {
        Ok(file) => file,
        Err(e) => {
            println!("Unable to parse '{}': {e}", args.file.display());
            std::process::exit(1);
        }
    };

    let numbers = match args.flight {
        Some(number) => vec![number],
        None => file.flight_numbers(),
    };

    let tail = file.tail_number().unwrap_or("unknown").replace(',', "_");
    let mut exported = 0;
    for number in numbers {
        let Some(flight) = file.flight(number) else {
            println!("Flight {number} is not in this file");
            std::process::exit(1);
        };
        for warning in flight.parse_warnings() {
            println!("Flight {number}: {warning}");
        }
        if flight.is_empty() {
            println!("Flight {number}: no samples, skipping");
            continue;
        }
        let path = args.output.join(format!("{tail}_{number}.csv"));
        if let Err(e) = std::fs::write(&path, flight.to_csv()) {
            println!("Unable to write '{}': {e}", path.display());
            std::process::exit(1);
        }
        println!(
            "Flight {number}: {} samples -> {}",
            flight.samples().len(),
            path.display()
        );
        exported += 1;
    }
    println!("Exported {exported} flight(s)");
}

fn parse_unit(s: &str) -> Result<TempUnit, String> {
    match s.to_ascii_lowercase().as_str() {
        "original" => Ok(TempUnit::Original),
        "celsius" | "c" => Ok(TempUnit::Celsius),
        "fahrenheit" | "f" => Ok(TempUnit::Fahrenheit),
        other => Err(format!("unknown temperature unit '{other}'")),
    }
}
