//! Sample-file and result-file I/O.
//!
//! # Sample format (text)
//! - line 1: point count `N`
//! - line 2: domain limits `minX maxX minY maxY`
//! - line 3: dimension (must be `2`)
//! - then `N` lines of `x y`
//!
//! Readers and writers are generic over [`Read`]/[`Write`]; the `_file`
//! wrappers attach the path to any open/create failure. Blank lines are
//! tolerated anywhere.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use rand::distributions::Standard;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::algs::SolveReport;
use crate::geometry::Point;
use crate::solver_error::SolverError;

/// Rectangular domain limits carried in the sample header.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Domain {
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::new(0.0, 1000.0, 0.0, 1000.0)
    }
}

/// A parsed sample file: domain header plus the point set.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleFile {
    pub domain: Domain,
    pub points: Vec<Point>,
}

struct ContentLines<'a> {
    inner: std::str::Lines<'a>,
    current: usize,
}

impl<'a> ContentLines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines(),
            current: 0,
        }
    }

    fn next_content(&mut self) -> Result<&'a str, SolverError> {
        for line in self.inner.by_ref() {
            self.current += 1;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed);
            }
        }
        Err(SolverError::Parse {
            line: self.current + 1,
            reason: "unexpected end of file".into(),
        })
    }
}

fn parse_number<T: FromStr>(raw: &str, line: usize, what: &str) -> Result<T, SolverError> {
    raw.parse().map_err(|_| SolverError::Parse {
        line,
        reason: format!("invalid {what}: `{raw}`"),
    })
}

fn parse_floats<const N: usize>(
    raw: &str,
    line: usize,
    what: &str,
) -> Result<[f64; N], SolverError> {
    let mut values = [0f64; N];
    let mut tokens = raw.split_whitespace();
    for value in &mut values {
        let token = tokens.next().ok_or_else(|| SolverError::Parse {
            line,
            reason: format!("expected {N} values for {what}, got fewer"),
        })?;
        *value = parse_number(token, line, what)?;
    }
    if tokens.next().is_some() {
        return Err(SolverError::Parse {
            line,
            reason: format!("expected exactly {N} values for {what}"),
        });
    }
    Ok(values)
}

/// Parse a sample file from any byte stream.
pub fn read_sample<R: Read>(mut reader: R) -> Result<SampleFile, SolverError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut lines = ContentLines::new(&text);

    let raw = lines.next_content()?;
    let count: usize = parse_number(raw, lines.current, "point count")?;
    let raw = lines.next_content()?;
    let [min_x, max_x, min_y, max_y] = parse_floats(raw, lines.current, "domain limits")?;
    let raw = lines.next_content()?;
    let dimension: usize = parse_number(raw, lines.current, "dimension")?;
    if dimension != 2 {
        return Err(SolverError::UnsupportedDimension(dimension));
    }

    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = lines.next_content()?;
        let [x, y] = parse_floats(raw, lines.current, "point coordinates")?;
        points.push(Point::new(x, y));
    }

    Ok(SampleFile {
        domain: Domain::new(min_x, max_x, min_y, max_y),
        points,
    })
}

/// Parse a sample file from a path.
pub fn read_sample_file(path: &Path) -> Result<SampleFile, SolverError> {
    let file = File::open(path).map_err(|source| SolverError::Io {
        path: path.to_owned(),
        source,
    })?;
    read_sample(BufReader::new(file))
}

/// Write a sample file to any byte stream.
pub fn write_sample<W: Write>(mut writer: W, sample: &SampleFile) -> Result<(), SolverError> {
    writeln!(writer, "{}", sample.points.len())?;
    let d = sample.domain;
    writeln!(writer, "{:.6} {:.6} {:.6} {:.6}", d.min_x, d.max_x, d.min_y, d.max_y)?;
    writeln!(writer, "2")?;
    for p in &sample.points {
        writeln!(writer, "{:15.10} {:15.10}", p.x, p.y)?;
    }
    Ok(())
}

/// Write a sample file to a path.
pub fn write_sample_file(path: &Path, sample: &SampleFile) -> Result<(), SolverError> {
    let file = File::create(path).map_err(|source| SolverError::Io {
        path: path.to_owned(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    write_sample(&mut writer, sample)?;
    writer.flush()?;
    Ok(())
}

/// Write the result artifact: the distance, then the elapsed time.
pub fn write_report<W: Write>(mut writer: W, report: &SolveReport) -> Result<(), SolverError> {
    writeln!(
        writer,
        "The closest pair distance is {:<15.10}",
        report.distance
    )?;
    writeln!(
        writer,
        "Elapsed Time: {:<15.10} seconds",
        report.elapsed.as_secs_f64()
    )?;
    Ok(())
}

/// Write the result artifact to a path.
pub fn write_report_file(path: &Path, report: &SolveReport) -> Result<(), SolverError> {
    let file = File::create(path).map_err(|source| SolverError::Io {
        path: path.to_owned(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    write_report(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}

/// Fill the domain with uniformly distributed points, reproducibly.
pub fn generate_points(count: usize, domain: Domain, seed: u64) -> Vec<Point> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let (ux, uy): (f64, f64) = (rng.sample(Standard), rng.sample(Standard));
            Point::new(
                domain.min_x + ux * (domain.max_x - domain.min_x),
                domain.min_y + uy * (domain.max_y - domain.min_y),
            )
        })
        .collect()
}
