//! CSV tables in and out of the runner.
//!
//! - Edge list: columns `u, v, score` (node ids are read as strings).
//! - Base network: columns `u, v, length, cost`.
//! - Coordinates: columns `node, x, y` (`x`/`y` are lon/lat for spherical input).

use anyhow::{Context, Result};
use eta::api::{EdgeMetrics, ScoredEdge};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

fn read_csv(path: &Path) -> Result<DataFrame> {
    LazyCsvReader::new(path)
        .with_infer_schema_length(Some(100))
        .finish()
        .and_then(|lf| lf.collect())
        .with_context(|| format!("reading {}", path.display()))
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let s = df
        .column(name)
        .with_context(|| format!("missing column `{name}`"))?
        .cast(&DataType::String)?;
    s.str()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(str::to_owned)
                .with_context(|| format!("row {row}: empty `{name}`"))
        })
        .collect()
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let s = df
        .column(name)
        .with_context(|| format!("missing column `{name}`"))?
        .cast(&DataType::Float64)?;
    s.f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.with_context(|| format!("row {row}: `{name}` is not a number")))
        .collect()
}

pub fn read_edges(path: &Path) -> Result<Vec<ScoredEdge<String>>> {
    let df = read_csv(path)?;
    let u = string_column(&df, "u")?;
    let v = string_column(&df, "v")?;
    let score = float_column(&df, "score")?;
    tracing::info!(rows = df.height(), path = %path.display(), "edges loaded");
    Ok(u
        .into_iter()
        .zip(v)
        .zip(score)
        .map(|((u, v), s)| ScoredEdge::new(u, v, s))
        .collect())
}

pub fn read_network(path: &Path) -> Result<Vec<(String, String, EdgeMetrics)>> {
    let df = read_csv(path)?;
    let u = string_column(&df, "u")?;
    let v = string_column(&df, "v")?;
    let length = float_column(&df, "length")?;
    let cost = float_column(&df, "cost")?;
    tracing::info!(rows = df.height(), path = %path.display(), "network loaded");
    Ok(u
        .into_iter()
        .zip(v)
        .zip(length.into_iter().zip(cost))
        .map(|((u, v), (l, c))| (u, v, EdgeMetrics::new(l, c)))
        .collect())
}

pub fn read_coords(path: &Path) -> Result<Vec<(String, f64, f64)>> {
    let df = read_csv(path)?;
    let node = string_column(&df, "node")?;
    let x = float_column(&df, "x")?;
    let y = float_column(&df, "y")?;
    Ok(node
        .into_iter()
        .zip(x)
        .zip(y)
        .map(|((n, x), y)| (n, x, y))
        .collect())
}

fn write_csv(path: &Path, mut df: DataFrame) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("writing {}", path.display()))
}

pub fn write_edges(path: &Path, edges: &[ScoredEdge<usize>]) -> Result<()> {
    let df = df!(
        "u" => edges.iter().map(|e| e.u as u64).collect::<Vec<_>>(),
        "v" => edges.iter().map(|e| e.v as u64).collect::<Vec<_>>(),
        "score" => edges.iter().map(|e| e.score).collect::<Vec<_>>()
    )?;
    write_csv(path, df)
}

pub fn write_coords(path: &Path, points: &[(f64, f64)]) -> Result<()> {
    let df = df!(
        "node" => (0..points.len() as u64).collect::<Vec<_>>(),
        "x" => points.iter().map(|p| p.0).collect::<Vec<_>>(),
        "y" => points.iter().map(|p| p.1).collect::<Vec<_>>()
    )?;
    write_csv(path, df)
}
