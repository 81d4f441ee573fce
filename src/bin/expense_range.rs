//! Print stored expenses between two timestamps.
//!
//! Usage: cargo run --bin expense_range <data.json> "2025-01-01T00:00:00, 2025-02-01T00:00:00"

use std::process::ExitCode;

use expense_bot::store::RecordStore;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let (Some(path), Some(range)) = (args.get(1), args.get(2)) else {
        let program = args.first().map_or("expense_range", String::as_str);
        eprintln!("Usage: {program} <data.json> \"<start>, <end>\"");
        return ExitCode::FAILURE;
    };

    match RecordStore::new(path).filter_by_range(range) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
