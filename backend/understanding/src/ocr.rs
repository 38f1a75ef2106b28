//! Optical Character Recognition (OCR)
//!
//! Runs the `tesseract` command-line tool on an image and turns its TSV
//! output into text lines with normalized bounding boxes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{debug, info};

use textra_core::{Position, Recognized, Region};

use crate::locale::tesseract_language;

/// TSV row level for a whole page.
const LEVEL_PAGE: u32 = 1;
/// TSV row level for a single word.
const LEVEL_WORD: u32 = 5;

pub struct OcrService {
    binary: PathBuf,
}

impl OcrService {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Recognize the text of one image file.
    pub async fn extract_text(&self, image_path: &Path, locale: Option<&str>) -> Result<Recognized> {
        let language = tesseract_language(locale);
        info!(path = %image_path.display(), language, "Running OCR");

        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", language])
            .arg("tsv")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let recognized = parse_tsv(&tsv)?;
        debug!(
            path = %image_path.display(),
            lines = recognized.positions.len(),
            "OCR finished"
        );
        Ok(recognized)
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Bounds {
    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Parse tesseract TSV output into line-level fragments.
///
/// Words are grouped by (page, block, paragraph, line); each line becomes
/// one position, with coordinates relative to the page size.
pub fn parse_tsv(tsv: &str) -> Result<Recognized> {
    let mut page_size = None;
    let mut lines: BTreeMap<(u32, u32, u32, u32), (Vec<String>, Bounds)> = BTreeMap::new();

    for (number, row) in tsv.lines().enumerate() {
        if number == 0 || row.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() < 11 {
            bail!("malformed tesseract TSV row {}: {row:?}", number + 1);
        }
        let int = |i: usize| -> Result<u32> {
            fields[i]
                .trim()
                .parse()
                .with_context(|| format!("bad number in TSV row {}", number + 1))
        };

        let level = int(0)?;
        let (left, top, width, height) = (int(6)?, int(7)?, int(8)?, int(9)?);
        if level == LEVEL_PAGE {
            page_size = Some((f64::from(width.max(1)), f64::from(height.max(1))));
            continue;
        }

        let text = fields.get(11).map(|t| t.trim()).unwrap_or("");
        if level != LEVEL_WORD || text.is_empty() {
            continue;
        }

        let key = (int(1)?, int(2)?, int(3)?, int(4)?);
        let bounds = Bounds {
            left: f64::from(left),
            top: f64::from(top),
            right: f64::from(left + width),
            bottom: f64::from(top + height),
        };
        let entry = lines.entry(key).or_insert_with(|| (Vec::new(), bounds));
        entry.0.push(text.to_string());
        entry.1 = entry.1.union(bounds);
    }

    let (page_width, page_height) = page_size.unwrap_or((1.0, 1.0));
    let positions: Vec<Position> = lines
        .into_values()
        .map(|(words, b)| Position {
            text: words.join(" "),
            region: Region::Box {
                x: b.left / page_width,
                y: b.top / page_height,
                width: (b.right - b.left) / page_width,
                height: (b.bottom - b.top) / page_height,
            },
        })
        .collect();

    let text = positions
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Recognized { text, positions })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn groups_words_into_lines() {
        let tsv = [
            HEADER,
            "1\t1\t0\t0\t0\t0\t0\t0\t1000\t500\t-1\t",
            "4\t1\t1\t1\t1\t0\t100\t50\t300\t40\t-1\t",
            "5\t1\t1\t1\t1\t1\t100\t50\t120\t40\t96.1\tHello",
            "5\t1\t1\t1\t1\t2\t250\t50\t150\t40\t95.0\tworld",
            "5\t1\t1\t1\t2\t1\t100\t100\t200\t40\t91.3\tSecond",
        ]
        .join("\n");

        let recognized = parse_tsv(&tsv).unwrap();
        assert_eq!(recognized.text, "Hello world\nSecond");
        assert_eq!(recognized.positions.len(), 2);
        match recognized.positions[0].region {
            Region::Box { x, y, width, height } => {
                assert!((x - 0.1).abs() < 1e-9);
                assert!((y - 0.1).abs() < 1e-9);
                assert!((width - 0.3).abs() < 1e-9);
                assert!((height - 0.08).abs() < 1e-9);
            }
            other => panic!("unexpected region {other:?}"),
        }
    }

    #[test]
    fn empty_output_has_no_text() {
        let recognized = parse_tsv(HEADER).unwrap();
        assert!(recognized.text.is_empty());
        assert!(recognized.positions.is_empty());
    }

    #[test]
    fn rejects_truncated_rows() {
        let tsv = format!("{HEADER}\n5\t1\t1");
        assert!(parse_tsv(&tsv).is_err());
    }
}
