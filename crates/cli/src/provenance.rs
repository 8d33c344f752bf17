//! Sidecars that tie a walk report or a generated edge list to the run that made it.
//!
//! `eta-cli search --out runs/walk.json` writes `runs/walk.provenance.json`;
//! `eta-cli gen --out-edges g/edges.csv` writes `g/edges.provenance.json`.
//! Each sidecar names the subcommand, the CSV tables it read, every file it
//! wrote, and the parameters needed to repeat the run.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One `search` or `gen` invocation.
pub struct RunRecord {
    command: &'static str,
    params: Value,
    inputs: Vec<PathBuf>,
    extra_outputs: Vec<PathBuf>,
}

impl RunRecord {
    pub fn new(command: &'static str, params: Value) -> Self {
        Self {
            command,
            params,
            inputs: Vec::new(),
            extra_outputs: Vec::new(),
        }
    }

    /// Table the run read (edge list, base network, coordinates, grid world).
    pub fn with_input(mut self, path: Option<&Path>) -> Self {
        self.inputs.extend(path.map(Path::to_path_buf));
        self
    }

    /// File written alongside the primary artifact, e.g. the coordinates of a generated graph.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_outputs.push(path.into());
        self
    }
}

/// Write the sidecar for `artifact` and return its path.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, record: RunRecord) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let sidecar = sidecar_path(artifact);
    let callsite = Location::caller();
    let lossy = |p: &Path| p.to_string_lossy().into_owned();
    let outputs: Vec<String> = std::iter::once(artifact)
        .chain(record.extra_outputs.iter().map(PathBuf::as_path))
        .map(lossy)
        .collect();
    let inputs: Vec<String> = record.inputs.iter().map(|p| lossy(p)).collect();
    let doc = json!({
        "command": record.command,
        "code_rev": current_git_rev(),
        "eta_version": eta::VERSION,
        "callsite": format!("{}:{}", callsite.file(), callsite.line()),
        "params": record.params,
        "inputs": inputs,
        "outputs": outputs
    });
    fs::write(&sidecar, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", sidecar.display()))?;
    Ok(sidecar)
}

/// `walk.json` → `walk.provenance.json`, `edges.csv` → `edges.provenance.json`.
fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "walk".into());
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

/// `GIT_COMMIT` (build time, then run time), else `git rev-parse HEAD`, else "unknown".
pub fn current_git_rev() -> String {
    let env = option_env!("GIT_COMMIT")
        .map(str::to_owned)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|s| !s.is_empty());
    if let Some(rev) = env {
        return rev;
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sidecar_sits_next_to_report_and_edge_list() {
        assert_eq!(
            sidecar_path(Path::new("runs/round2/walk.json")),
            Path::new("runs/round2/walk.provenance.json")
        );
        assert_eq!(
            sidecar_path(Path::new("graphs/edges.csv")),
            Path::new("graphs/edges.provenance.json")
        );
    }

    #[test]
    fn generated_graph_sidecar_lists_both_tables() {
        let dir = tempdir().unwrap();
        let edges = dir.path().join("edges.csv");
        let coords = dir.path().join("coords.csv");
        fs::write(&edges, "u,v,score\n0,1,2.5\n").unwrap();
        let record = RunRecord::new("gen", json!({"nodes": 30, "seed": 1})).with_output(&coords);
        let path = write_sidecar(&edges, record).unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(parsed["command"], "gen");
        assert_eq!(parsed["outputs"][0], edges.to_string_lossy().as_ref());
        assert_eq!(parsed["outputs"][1], coords.to_string_lossy().as_ref());
        assert_eq!(parsed["inputs"], json!([]));
        assert_eq!(parsed["params"]["seed"], 1);
        assert_eq!(parsed["eta_version"], eta::VERSION);
    }

    #[test]
    fn walk_report_sidecar_records_inputs_it_read() {
        let dir = tempdir().unwrap();
        let report = dir.path().join("walk.json");
        let edges = dir.path().join("edges.csv");
        fs::write(&report, "{}").unwrap();
        let record = RunRecord::new("search", json!({"sn": -1}))
            .with_input(Some(edges.as_path()))
            .with_input(None);
        write_sidecar(&report, record).unwrap();
        let raw = fs::read(dir.path().join("walk.provenance.json")).unwrap();
        let parsed: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(parsed["command"], "search");
        assert_eq!(parsed["inputs"], json!([edges.to_string_lossy()]));
        assert_eq!(parsed["outputs"], json!([report.to_string_lossy()]));
    }
}
