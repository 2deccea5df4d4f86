//! Sample-file generator.
//!
//! Usage: `gen-points <sampleFilePath> <count> [seed]`
//!
//! Writes `count` uniformly distributed points over the default domain.

use std::path::Path;
use std::process::ExitCode;

use planar_closest::io::{self, Domain, SampleFile};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if !(3..=4).contains(&args.len()) {
        println!("Usage: {} <sampleFilePath> <count> [seed]", args[0]);
        return ExitCode::SUCCESS;
    }

    let count: usize = match args[2].parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("invalid count: `{}`", args[2]);
            return ExitCode::FAILURE;
        }
    };
    let seed: u64 = match args.get(3).map(|s| s.parse()) {
        None => 0,
        Some(Ok(s)) => s,
        Some(Err(_)) => {
            eprintln!("invalid seed: `{}`", args[3]);
            return ExitCode::FAILURE;
        }
    };

    let domain = Domain::default();
    let sample = SampleFile {
        domain,
        points: io::generate_points(count, domain, seed),
    };
    if let Err(err) = io::write_sample_file(Path::new(&args[1]), &sample) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }
    println!("Wrote {count} points to {}", args[1]);
    ExitCode::SUCCESS
}
