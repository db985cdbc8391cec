//! Line-level comparison between the submitted and the tailored resume.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Modified,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineChange {
    /// 1-based line number in the longer of the two texts.
    pub line_number: usize,
    pub original: Option<String>,
    pub tailored: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub diff: Vec<LineChange>,
    pub total_changes: usize,
    /// `total_changes * 5`, capped at 100.
    pub estimated_impact_score: u32,
}

/// Compares the texts position by position. Lines past the end of the shorter
/// text are reported as added or removed.
pub fn line_diff(original: &str, tailored: &str) -> DiffReport {
    let original_lines: Vec<&str> = original.lines().collect();
    let tailored_lines: Vec<&str> = tailored.lines().collect();
    let longest = original_lines.len().max(tailored_lines.len());

    let diff: Vec<LineChange> = (0..longest)
        .filter_map(|i| {
            let before = original_lines.get(i).copied();
            let after = tailored_lines.get(i).copied();
            let kind = match (before, after) {
                (Some(a), Some(b)) if a == b => return None,
                (Some(_), Some(_)) => ChangeKind::Modified,
                (None, Some(_)) => ChangeKind::Added,
                (Some(_), None) => ChangeKind::Removed,
                (None, None) => return None,
            };
            Some(LineChange {
                line_number: i + 1,
                original: before.map(String::from),
                tailored: after.map(String::from),
                kind,
            })
        })
        .collect();

    let total_changes = diff.len();
    DiffReport {
        estimated_impact_score: (total_changes.saturating_mul(5)).min(100) as u32,
        total_changes,
        diff,
    }
}
