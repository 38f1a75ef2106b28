//! Expansion of destinations into concrete output paths.

use std::path::{Path, PathBuf};

use textra_core::{Destination, OutputKind, Result, TextraError, Unit, PLACEHOLDER};

/// How a file inside a directory destination is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    /// `<input>.<ext>`, for inputs with a single unit.
    InputName,
    /// `<page>.<ext>`, when the directory receives pages of one input only.
    PageIndex,
    /// `<input>-<page>.<ext>`, when pages of several inputs share the directory.
    InputAndPage,
}

/// Everything needed to name a unit's file inside a directory.
#[derive(Debug, Clone, Copy)]
pub struct DefaultName<'a> {
    pub base_name: &'a str,
    pub style: NameStyle,
    pub kind: OutputKind,
}

impl DefaultName<'_> {
    fn file_name(&self, unit: &Unit) -> String {
        let ext = self.kind.extension();
        match self.style {
            NameStyle::InputName => format!("{}.{ext}", self.base_name),
            NameStyle::PageIndex => format!("{}.{ext}", unit.page_index),
            NameStyle::InputAndPage => format!("{}-{}.{ext}", self.base_name, unit.page_index),
        }
    }
}

pub fn placeholder_count(template: &str) -> usize {
    template.matches(PLACEHOLDER).count()
}

/// Fails unless `template` holds exactly one placeholder.
pub fn validate_pattern(template: &str) -> Result<()> {
    match placeholder_count(template) {
        1 => Ok(()),
        found => Err(TextraError::InvalidPattern {
            template: template.to_string(),
            found,
        }),
    }
}

/// Check the parts of a destination that do not depend on any unit.
pub fn validate_destination(destination: &Destination) -> Result<()> {
    match destination {
        Destination::None | Destination::Stdout | Destination::SingleFile(_) => Ok(()),
        Destination::Pattern(template) => validate_pattern(template),
        Destination::Directory(dir) => {
            if dir.is_dir() {
                Ok(())
            } else {
                Err(TextraError::MustBeDirectory {
                    path: dir.clone(),
                    reason: "directory does not exist".to_string(),
                })
            }
        }
    }
}

/// Resolve the file a unit writes for `destination`.
///
/// Returns `None` for destinations that are not backed by a file. The result
/// depends only on the arguments, so resolving the same pair twice yields the
/// same path.
pub fn resolve(
    destination: &Destination,
    unit: &Unit,
    default: &DefaultName<'_>,
) -> Result<Option<PathBuf>> {
    match destination {
        Destination::None | Destination::Stdout => Ok(None),
        Destination::SingleFile(path) => Ok(Some(path.clone())),
        Destination::Directory(dir) => Ok(Some(dir.join(default.file_name(unit)))),
        Destination::Pattern(template) => {
            validate_pattern(template)?;
            let expanded = template.replacen(PLACEHOLDER, &unit.page_index.to_string(), 1);
            Ok(Some(PathBuf::from(expanded)))
        }
    }
}

/// Parent directory a resolved path will be written into, if it is not the
/// working directory.
pub fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}
