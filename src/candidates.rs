use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;

/// Minimum similarity ratio for a name to count as a candidate.
pub const SIMILARITY_CUTOFF: f64 = 0.75;
/// Most candidates ever sent to the provider.
pub const MAX_CANDIDATES: usize = 5;

/// Lists executable names reachable from the user's shell.
#[allow(async_fn_in_trait)]
pub trait ExecutableSource {
    async fn list_executables(&self) -> Result<Vec<String>>;
}

/// Asks bash for its command completions, falling back to a `$PATH` scan.
pub struct ShellExecutables {
    shell: String,
}

impl Default for ShellExecutables {
    fn default() -> Self {
        Self {
            shell: "bash".to_string(),
        }
    }
}

impl ShellExecutables {
    pub fn new() -> Self {
        Self::default()
    }

    async fn compgen(&self) -> Result<Vec<String>> {
        let output = TokioCommand::new(&self.shell)
            .arg("-c")
            .arg("compgen -c")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to spawn {} for compgen", self.shell))?;

        if !output.status.success() {
            anyhow::bail!("compgen exited with {}", output.status);
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}

impl ExecutableSource for ShellExecutables {
    async fn list_executables(&self) -> Result<Vec<String>> {
        match self.compgen().await {
            Ok(names) if !names.is_empty() => Ok(names),
            Ok(_) => scan_path_var(),
            Err(e) => {
                log::debug!("compgen unavailable ({:#}), scanning PATH", e);
                scan_path_var()
            }
        }
    }
}

fn scan_path_var() -> Result<Vec<String>> {
    let path = std::env::var_os("PATH").context("PATH is not set")?;
    Ok(scan_path(&path))
}

/// Names of executable files in every directory of a PATH-style list.
pub fn scan_path(path: &OsStr) -> Vec<String> {
    let mut names = Vec::new();

    for dir in std::env::split_paths(path) {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.filter_map(|entry| entry.ok()) {
            let is_executable = entry
                .metadata()
                .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
                .unwrap_or(false);
            if is_executable {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
    }

    names
}

/// Executable names close to the mistyped base token, best match first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    names: Vec<String>,
}

impl CandidateSet {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Ranks `available` against `base` by similarity ratio.
pub fn rank_candidates<S: AsRef<str>>(base: &str, available: &[S]) -> CandidateSet {
    let mut seen = HashSet::new();
    let mut scored: Vec<(f64, &str)> = available
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| *name != base && seen.insert(*name))
        .map(|name| (similarity_ratio(base, name), name))
        .filter(|(score, _)| *score >= SIMILARITY_CUTOFF)
        .collect();

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.cmp(b.1))
    });

    CandidateSet {
        names: scored
            .into_iter()
            .take(MAX_CANDIDATES)
            .map(|(_, name)| name.to_string())
            .collect(),
    }
}

/// Enumeration failures leave the request ungrounded instead of failing the run.
pub async fn find_candidates<S: ExecutableSource>(source: &S, base: &str) -> CandidateSet {
    match source.list_executables().await {
        Ok(available) => {
            let set = rank_candidates(base, &available);
            log::debug!("{} executables scanned, candidates: {:?}", available.len(), set.names());
            set
        }
        Err(e) => {
            log::debug!("Executable enumeration failed: {:#}", e);
            CandidateSet::default()
        }
    }
}

/// `2 * M / (|a| + |b|)`, where `M` counts characters in recursively matched common blocks.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Earliest longest common substring as `(start_a, start_b, len)`.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];

    for i in 0..a.len() {
        let mut row = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                row[j + 1] = prev[j] + 1;
                if row[j + 1] > best.2 {
                    best = (i + 1 - row[j + 1], j + 1 - row[j + 1], row[j + 1]);
                }
            }
        }
        prev = row;
    }

    best
}
