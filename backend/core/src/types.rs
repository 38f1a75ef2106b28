use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Placeholder substituted with a page index inside pattern destinations.
pub const PLACEHOLDER: &str = "{}";

/// The family an input file belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Image,
    Document,
    Audio,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Image => write!(f, "image"),
            InputKind::Document => write!(f, "document"),
            InputKind::Audio => write!(f, "audio"),
        }
    }
}

/// A validated input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub path: PathBuf,
    pub kind: InputKind,
    /// Number of recognizable units, always >= 1.
    pub unit_count: usize,
}

impl InputSpec {
    /// File name without directory or extension, used for default output names.
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string())
    }
}

/// What a request produces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Full text, aggregated when several units share one file.
    Text,
    /// Text of a single unit per file.
    PageText,
    /// Positioned fragments serialized as JSON.
    Positions,
}

impl OutputKind {
    pub const ALL: [OutputKind; 3] = [OutputKind::Text, OutputKind::PageText, OutputKind::Positions];

    /// Short flag that requests this output on the command line.
    pub fn flag(&self) -> &'static str {
        match self {
            OutputKind::Text => "-o",
            OutputKind::PageText => "-t",
            OutputKind::Positions => "-p",
        }
    }

    /// Extension used for default file names inside a directory destination.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputKind::Text | OutputKind::PageText => "txt",
            OutputKind::Positions => "json",
        }
    }
}

/// Which inputs a request applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    PerInput(usize),
}

/// Where a request came from on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    #[default]
    Flag,
    /// Trailing bare token in the legacy `textra FILE... DEST` form.
    Positional,
}

/// Where output goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    None,
    Stdout,
    SingleFile(PathBuf),
    Directory(PathBuf),
    Pattern(String),
}

impl Destination {
    /// Classify a raw destination argument by its shape.
    ///
    /// `-` is standard output, anything containing `{}` is a pattern, an
    /// existing directory or a path ending in a separator is a directory, and
    /// everything else is a literal file.
    pub fn classify(raw: &str) -> Self {
        if raw == "-" {
            Destination::Stdout
        } else if raw.contains(PLACEHOLDER) {
            Destination::Pattern(raw.to_string())
        } else if Path::new(raw).is_dir() || raw.ends_with(std::path::MAIN_SEPARATOR) {
            Destination::Directory(PathBuf::from(raw))
        } else {
            Destination::SingleFile(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::None => write!(f, "<none>"),
            Destination::Stdout => write!(f, "<stdout>"),
            Destination::SingleFile(path) | Destination::Directory(path) => {
                write!(f, "{}", path.display())
            }
            Destination::Pattern(template) => write!(f, "{template}"),
        }
    }
}

/// One requested output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRequest {
    pub kind: OutputKind,
    pub scope: Scope,
    pub destination: Destination,
    pub origin: Origin,
}

impl OutputRequest {
    pub fn global(kind: OutputKind, destination: Destination) -> Self {
        Self {
            kind,
            scope: Scope::Global,
            destination,
            origin: Origin::Flag,
        }
    }

    pub fn per_input(kind: OutputKind, input: usize, destination: Destination) -> Self {
        Self {
            kind,
            scope: Scope::PerInput(input),
            destination,
            origin: Origin::Flag,
        }
    }

    pub fn positional(destination: Destination) -> Self {
        Self {
            kind: OutputKind::Text,
            scope: Scope::Global,
            destination,
            origin: Origin::Positional,
        }
    }
}

/// One indivisible recognizable piece of input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Unit {
    pub input_index: usize,
    /// 1-based, always 1 for non-paged inputs.
    pub page_index: usize,
    /// Position in command-line declaration order.
    pub ordinal: usize,
}

/// Spatial extent of a recognized fragment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Region {
    /// Normalized image coordinates, origin at the top-left corner.
    Box {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Time range in seconds.
    Span { start: f64, end: f64 },
}

/// A recognized text fragment with its location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub text: String,
    #[serde(rename = "boundingRegion")]
    pub region: Region,
}

/// Input to a single recognition call.
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub path: PathBuf,
    pub kind: InputKind,
    pub page_index: usize,
    pub locale: Option<String>,
}

/// What a recognizer returns for one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recognized {
    pub text: String,
    pub positions: Vec<Position>,
}

/// A recognized unit, ready for the output writer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub unit: Unit,
    pub text: String,
    pub positions: Vec<Position>,
}

impl RecognitionResult {
    pub fn new(unit: Unit, recognized: Recognized) -> Self {
        Self {
            unit,
            text: recognized.text,
            positions: recognized.positions,
        }
    }
}
