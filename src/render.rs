//! Category-file output.
//!
//! Serializes the reconstructed grids into the pre-formatted category file
//! consumed downstream: one JSON document per test code, one block per
//! section, each question listing its reporting-category labels. Labels are
//! lowercased in the file; the grids carry them as printed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::grid::SectionGrid;
use crate::layout::{SectionKind, SectionLayout};

// ============================================================
// Error Types
// ============================================================

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no grid for section {0:?}")]
    MissingSection(SectionKind),

    #[error("failed to serialize category file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

// ============================================================
// Document shape
// ============================================================

#[derive(Debug, Serialize)]
struct CategoryFile {
    test_code: String,
    e: SectionReport,
    m: SectionReport,
    r: SectionReport,
    s: SectionReport,
}

#[derive(Debug, Serialize)]
struct SectionReport {
    reporting_categories: BTreeMap<String, String>,
    #[serde(rename = "passage-breaks", skip_serializing_if = "Option::is_none")]
    passage_breaks: Option<Vec<String>>,
    q: BTreeMap<u32, QuestionEntry>,
}

#[derive(Debug, Serialize)]
struct QuestionEntry {
    cat: Vec<String>,
}

/// Passage boundaries are fixed per section, not recovered from the scan.
/// Science passages vary per form, so that section carries none.
fn passage_breaks(kind: SectionKind) -> Option<Vec<String>> {
    let breaks: &[u32] = match kind {
        SectionKind::English => &[1, 16, 31, 46, 61],
        SectionKind::Math => &[1, 21, 41],
        SectionKind::Reading => &[1, 11, 21, 31],
        SectionKind::Science => return None,
    };
    Some(breaks.iter().map(u32::to_string).collect())
}

fn section_report(kind: SectionKind, grid: &SectionGrid) -> SectionReport {
    let layout = SectionLayout::of(kind);
    let reporting_categories = layout
        .legend()
        .iter()
        .map(|(short, long)| (short.to_lowercase(), (*long).to_string()))
        .collect();
    let q = grid
        .iter()
        .map(|(question, labels)| {
            let cat = labels.iter().map(|l| l.to_lowercase()).collect();
            (question, QuestionEntry { cat })
        })
        .collect();
    SectionReport {
        reporting_categories,
        passage_breaks: passage_breaks(kind),
        q,
    }
}

// ============================================================
// Rendering
// ============================================================

fn grid_for<'a>(
    grids: &'a [(SectionKind, SectionGrid)],
    kind: SectionKind,
) -> Result<&'a SectionGrid> {
    grids
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, g)| g)
        .ok_or(RenderError::MissingSection(kind))
}

/// Render the category file for a test code from all four section grids.
pub fn render_category_file(
    test_code: &str,
    grids: &[(SectionKind, SectionGrid)],
) -> Result<String> {
    let file = CategoryFile {
        test_code: test_code.to_string(),
        e: section_report(SectionKind::English, grid_for(grids, SectionKind::English)?),
        m: section_report(SectionKind::Math, grid_for(grids, SectionKind::Math)?),
        r: section_report(SectionKind::Reading, grid_for(grids, SectionKind::Reading)?),
        s: section_report(SectionKind::Science, grid_for(grids, SectionKind::Science)?),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Write `cat_ACT_<test_code>.json` into `dir` and return its path.
pub fn write_category_file(
    dir: &Path,
    test_code: &str,
    grids: &[(SectionKind, SectionGrid)],
) -> Result<PathBuf> {
    let text = render_category_file(test_code, grids)?;
    let path = dir.join(format!("cat_ACT_{test_code}.json"));
    std::fs::write(&path, text)?;
    info!(path = %path.display(), "wrote category file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_grids() -> Vec<(SectionKind, SectionGrid)> {
        SectionKind::all()
            .into_iter()
            .map(|kind| {
                let layout = SectionLayout::of(kind);
                let mut grid = SectionGrid::new(layout.question_count);
                for q in 1..=layout.question_count {
                    grid.assign(q, layout.labels[(q as usize - 1) % layout.labels.len()]);
                }
                (kind, grid)
            })
            .collect()
    }

    #[test]
    fn test_render_is_valid_json_with_all_sections() {
        let text = render_category_file("202304", &full_grids()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["test_code"], "202304");
        for sid in ["e", "m", "r", "s"] {
            assert!(value[sid]["q"].is_object(), "missing section {sid}");
            assert!(value[sid]["reporting_categories"].is_object());
        }
        assert_eq!(value["e"]["q"]["1"]["cat"][0], "pow");
        assert_eq!(value["m"]["q"]["60"]["cat"][0], "g");
        assert_eq!(value["e"]["q"].as_object().unwrap().len(), 75);
        assert_eq!(value["s"]["q"].as_object().unwrap().len(), 40);
    }

    #[test]
    fn test_passage_breaks_per_section() {
        let text = render_category_file("202304", &full_grids()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["e"]["passage-breaks"][0], "1");
        assert_eq!(value["m"]["passage-breaks"][1], "21");
        assert!(value["s"].get("passage-breaks").is_none());
    }

    #[test]
    fn test_unmarked_question_has_empty_cat() {
        let mut grids = full_grids();
        let layout = SectionLayout::of(SectionKind::Reading);
        grids[2].1 = SectionGrid::new(layout.question_count);
        let text = render_category_file("202304", &grids).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["r"]["q"]["1"]["cat"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_missing_section_is_an_error() {
        let mut grids = full_grids();
        grids.retain(|(k, _)| *k != SectionKind::Science);
        assert!(matches!(
            render_category_file("202304", &grids),
            Err(RenderError::MissingSection(SectionKind::Science))
        ));
    }

    #[test]
    fn test_write_category_file_names_by_test_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_category_file(dir.path(), "202404", &full_grids()).unwrap();
        assert!(path.ends_with("cat_ACT_202404.json"));
        assert!(path.exists());
    }
}
