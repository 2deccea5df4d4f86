//! Rank-specialized solver CLI.
//!
//! Usage: `cp-solve <sampleFilePath> <resultFilePath>`
//!
//! With the `mpi-support` feature the binary runs under `mpirun` and each
//! process takes one rank; without it, it runs as a single serial worker.
//! The coordinator (rank 0) reads the sample, prints progress, and writes
//! the result file. A wrong argument count prints usage and exits 0; any
//! I/O or solver failure exits nonzero on every rank after the collective
//! failure agreement.

use std::path::Path;
use std::process::ExitCode;

use planar_closest::algs::{SolveConfig, solve};
use planar_closest::comm::{Communicator, agree_result};
use planar_closest::io;
use planar_closest::solver_error::SolverError;

fn main() -> ExitCode {
    #[cfg(feature = "mpi-support")]
    {
        let Some(comm) = planar_closest::comm::MpiComm::new() else {
            eprintln!("MPI initialization failed");
            return ExitCode::FAILURE;
        };
        drive(&comm)
    }
    #[cfg(not(feature = "mpi-support"))]
    drive(&planar_closest::comm::NoComm)
}

fn drive<C: Communicator>(comm: &C) -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        if comm.rank() == 0 {
            println!("Usage: {} <sampleFilePath> <resultFilePath>", args[0]);
        }
        return ExitCode::SUCCESS;
    }

    match run(comm, Path::new(&args[1]), Path::new(&args[2])) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("rank {}: {err}", comm.rank());
            ExitCode::FAILURE
        }
    }
}

fn run<C: Communicator>(comm: &C, sample_path: &Path, result_path: &Path) -> Result<(), SolverError> {
    let root = comm.rank() == 0;

    let read = if root {
        println!("Reading the points...");
        io::read_sample_file(sample_path).map(Some)
    } else {
        Ok(None)
    };
    let sample = agree_result(comm, "read", read)?;
    if let Some(sample) = &sample {
        println!("File read {} points successfully!", sample.points.len());
    }

    let report = solve(comm, sample.map(|s| s.points), &SolveConfig::default())?;

    let write = if let Some(report) = report {
        if report.has_pair() {
            println!("The closest pair distance is {:<15.10}", report.distance);
        } else {
            println!("Fewer than two points: no pair to report.");
        }
        println!(
            "Solution completed in {:<10.6} seconds!",
            report.elapsed.as_secs_f64()
        );
        println!("Writing results...");
        io::write_report_file(result_path, &report)
    } else {
        Ok(())
    };
    agree_result(comm, "write", write)?;
    if root {
        println!("Results written to {}", result_path.display());
    }
    Ok(())
}
