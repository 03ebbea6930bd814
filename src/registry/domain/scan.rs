//! Scan input and registry summary values.

use super::{ComponentId, FilePath, RepoName, ScopeViolation};
use serde::{Deserialize, Serialize};

/// One `(file_path, repo)` tuple produced by an external file scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedFile {
    /// Repository-relative path.
    pub file_path: FilePath,
    /// Repository the file was found in.
    pub repo: RepoName,
}

impl ScannedFile {
    /// Creates a scanned-file tuple.
    #[must_use]
    pub const fn new(file_path: FilePath, repo: RepoName) -> Self {
        Self { file_path, repo }
    }
}

/// Outcome of ingesting one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Number of tuples received.
    pub scanned: usize,
    /// Files that already had a mapping.
    pub mapped: usize,
    /// Files recorded in the ledger for the first time.
    pub newly_unregistered: usize,
    /// Files already in the ledger whose counter was bumped.
    pub redetected: usize,
}

/// A changed file that has a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFile {
    /// The changed path.
    pub file_path: FilePath,
    /// Component the path maps to.
    pub component_id: ComponentId,
    /// Boundary breaches reported by that component.
    pub scope_violations: Vec<ScopeViolation>,
}

/// Result of checking a change set before it is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCheck {
    /// Changed files with a mapping.
    pub tracked: Vec<TrackedFile>,
    /// Changed files with no mapping, now recorded in the ledger.
    pub untracked: Vec<FilePath>,
}

impl ChangeCheck {
    /// Returns `true` when every changed file is mapped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.untracked.is_empty()
    }

    /// Total number of files checked.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.tracked.len().saturating_add(self.untracked.len())
    }
}

/// Mapping coverage of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCoverage {
    /// Repository name.
    pub repo: RepoName,
    /// Files mapped to components owned by the repository.
    pub mapped: usize,
    /// Ledger rows still awaiting a mapping (unregistered or under review).
    pub unmapped: usize,
    /// Ledger rows a reviewer chose to ignore.
    pub ignored: usize,
}

impl RepoCoverage {
    /// Creates an empty coverage row for `repo`.
    #[must_use]
    pub const fn empty(repo: RepoName) -> Self {
        Self {
            repo,
            mapped: 0,
            unmapped: 0,
            ignored: 0,
        }
    }

    /// Whole-percent share of mapped files among mapped and unmapped ones.
    ///
    /// Ignored files count towards neither side. Returns 0 when nothing has
    /// been seen.
    #[must_use]
    pub fn percent(&self) -> usize {
        coverage_percent(self.mapped, self.unmapped)
    }
}

/// Coverage across every repository the registry knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Per-repository rows, ordered by repository name.
    pub repos: Vec<RepoCoverage>,
}

impl CoverageReport {
    /// Total mapped files.
    #[must_use]
    pub fn mapped(&self) -> usize {
        self.repos.iter().map(|row| row.mapped).sum()
    }

    /// Total unmapped files.
    #[must_use]
    pub fn unmapped(&self) -> usize {
        self.repos.iter().map(|row| row.unmapped).sum()
    }

    /// Whole-percent coverage across all repositories.
    #[must_use]
    pub fn percent(&self) -> usize {
        coverage_percent(self.mapped(), self.unmapped())
    }
}

fn coverage_percent(mapped: usize, unmapped: usize) -> usize {
    let total = mapped.saturating_add(unmapped);
    mapped
        .saturating_mul(100)
        .checked_div(total)
        .unwrap_or(0)
}
