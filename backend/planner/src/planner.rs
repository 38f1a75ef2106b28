use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::debug;

use textra_core::{
    Destination, InputSpec, Origin, OutputKind, OutputRequest, Result, Scope, TextraError, Unit,
};

use crate::template::{self, DefaultName, NameStyle};

/// Where a unit's text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextRoute {
    Stdout,
    File(PathBuf),
}

/// One unit together with every path it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUnit {
    pub unit: Unit,
    pub text: TextRoute,
    pub page_text: Option<PathBuf>,
    pub positions: Option<PathBuf>,
}

/// Per-input overrides layered over the global requests, one slot per kind.
#[derive(Debug, Default)]
pub struct RequestOverlay {
    global: HashMap<OutputKind, OutputRequest>,
    per_input: HashMap<(usize, OutputKind), OutputRequest>,
}

impl RequestOverlay {
    pub fn build(requests: &[OutputRequest], input_count: usize) -> Result<Self> {
        let mut overlay = Self::default();
        for request in requests {
            let previous = match request.scope {
                Scope::Global => overlay.global.insert(request.kind, request.clone()),
                Scope::PerInput(index) => {
                    if index >= input_count {
                        return Err(TextraError::grammar(format!(
                            "{} refers to input #{} but only {input_count} input files were given",
                            request.kind.flag(),
                            index + 1
                        )));
                    }
                    overlay.per_input.insert((index, request.kind), request.clone())
                }
            };
            if previous.is_some() {
                return Err(TextraError::grammar(format!(
                    "{} was given more than once for the same input",
                    request.kind.flag()
                )));
            }
        }
        Ok(overlay)
    }

    /// The request that applies to `input` for `kind`, if any.
    pub fn effective(&self, input: usize, kind: OutputKind) -> Option<&OutputRequest> {
        self.per_input
            .get(&(input, kind))
            .or_else(|| self.global.get(&kind))
    }

    fn positional(&self) -> Option<&OutputRequest> {
        self.global.values().find(|r| r.origin == Origin::Positional)
    }
}

/// The validated, immutable mapping from units to output paths.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    inputs: Vec<InputSpec>,
    units: Vec<PlannedUnit>,
}

impl ExecutionPlan {
    pub fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    /// Units in ordinal order.
    pub fn units(&self) -> &[PlannedUnit] {
        &self.units
    }

    pub fn input_of(&self, unit: &Unit) -> &InputSpec {
        &self.inputs[unit.input_index]
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn streams_to_stdout(&self) -> bool {
        self.units.iter().any(|u| u.text == TextRoute::Stdout)
    }

    /// Every distinct file the plan writes, in order of first use.
    pub fn output_files(&self) -> Vec<&Path> {
        let mut seen = BTreeSet::new();
        let mut files = Vec::new();
        for planned in &self.units {
            let text = match &planned.text {
                TextRoute::File(path) => Some(path),
                TextRoute::Stdout => None,
            };
            for path in [text, planned.page_text.as_ref(), planned.positions.as_ref()]
                .into_iter()
                .flatten()
            {
                if seen.insert(path.as_path()) {
                    files.push(path.as_path());
                }
            }
        }
        files
    }
}

/// Units and inputs routed to one destination for one kind.
#[derive(Debug, Default)]
struct Group {
    inputs: BTreeSet<usize>,
    units: usize,
    positional: bool,
}

impl Group {
    fn name_style(&self, input: &InputSpec) -> NameStyle {
        if input.unit_count == 1 {
            NameStyle::InputName
        } else if self.inputs.len() == 1 {
            NameStyle::PageIndex
        } else {
            NameStyle::InputAndPage
        }
    }
}

/// Paths claimed so far, for the no-duplicate-output check.
#[derive(Default)]
struct Claims {
    owners: HashMap<PathBuf, (String, bool)>,
}

impl Claims {
    /// Claim `path` for `owner`. Shared claims may repeat; that is how
    /// several units fold into one combined text file.
    fn claim(&mut self, path: &Path, owner: String, shared: bool) -> Result<()> {
        if let Some((first, first_shared)) = self.owners.get(path) {
            if shared && *first_shared {
                return Ok(());
            }
            return Err(TextraError::OutputCollision {
                path: path.to_path_buf(),
                first: first.clone(),
                second: owner,
            });
        }

        if let Some(parent) = template::parent_dir(path) {
            if !parent.is_dir() {
                return Err(TextraError::MustBeDirectory {
                    path: parent.to_path_buf(),
                    reason: format!("parent of {} does not exist", path.display()),
                });
            }
        }

        self.owners.insert(path.to_path_buf(), (owner, shared));
        Ok(())
    }
}

/// Expand inputs into units numbered in declaration order.
pub fn expand_units(inputs: &[InputSpec]) -> Vec<Unit> {
    let mut units = Vec::with_capacity(inputs.iter().map(|i| i.unit_count).sum());
    for (input_index, input) in inputs.iter().enumerate() {
        for page_index in 1..=input.unit_count {
            units.push(Unit {
                input_index,
                page_index,
                ordinal: units.len(),
            });
        }
    }
    units
}

/// Build and validate the execution plan.
///
/// Nothing is written and nothing is recognized here; any error means the
/// whole run stops before side effects.
pub fn build(inputs: Vec<InputSpec>, requests: &[OutputRequest]) -> Result<ExecutionPlan> {
    let overlay = RequestOverlay::build(requests, inputs.len())?;
    if let Some(request) = overlay.positional() {
        check_positional(request, &inputs)?;
    }

    let units = expand_units(&inputs);

    let mut groups: HashMap<(OutputKind, &Destination), Group> = HashMap::new();
    // Group keys in order of first use, so validation errors are reported
    // for the earliest offending unit.
    let mut order = Vec::new();
    for unit in &units {
        for kind in OutputKind::ALL {
            if let Some(request) = overlay.effective(unit.input_index, kind) {
                let key = (kind, &request.destination);
                let group = groups.entry(key).or_insert_with(|| {
                    order.push(key);
                    Group::default()
                });
                group.inputs.insert(unit.input_index);
                group.units += 1;
                group.positional |= request.origin == Origin::Positional;
            }
        }
    }

    for key in &order {
        let (kind, destination) = *key;
        validate_group(kind, destination, &groups[key])?;
    }

    let mut claims = Claims::default();
    let mut planned = Vec::with_capacity(units.len());
    for unit in units {
        let input = &inputs[unit.input_index];
        let mut route = |kind: OutputKind| -> Result<Option<PathBuf>> {
            let Some(request) = overlay.effective(unit.input_index, kind) else {
                return Ok(None);
            };
            let group = &groups[&(kind, &request.destination)];
            let base_name = input.base_name();
            let default = DefaultName {
                base_name: &base_name,
                style: group.name_style(input),
                kind,
            };
            let Some(path) = template::resolve(&request.destination, &unit, &default)? else {
                return Ok(None);
            };
            let shared = kind == OutputKind::Text
                && matches!(request.destination, Destination::SingleFile(_));
            let owner = format!(
                "{} page {} ({})",
                input.path.display(),
                unit.page_index,
                kind.flag()
            );
            claims.claim(&path, owner, shared)?;
            Ok(Some(path))
        };

        let text_path = route(OutputKind::Text)?;
        let page_text = route(OutputKind::PageText)?;
        let positions = route(OutputKind::Positions)?;

        // Text without a file destination is always streamed.
        let text = match text_path {
            Some(path) => TextRoute::File(path),
            None => TextRoute::Stdout,
        };

        planned.push(PlannedUnit {
            unit,
            text,
            page_text,
            positions,
        });
    }

    let plan = ExecutionPlan {
        inputs,
        units: planned,
    };
    debug!(
        units = plan.len(),
        files = plan.output_files().len(),
        stdout = plan.streams_to_stdout(),
        "Execution plan built"
    );
    Ok(plan)
}

/// Extra rules for the legacy trailing destination.
fn check_positional(request: &OutputRequest, inputs: &[InputSpec]) -> Result<()> {
    if inputs.len() < 2 {
        return Ok(());
    }
    let path = match &request.destination {
        Destination::None | Destination::Stdout | Destination::Directory(_) => return Ok(()),
        Destination::SingleFile(path) => path.clone(),
        Destination::Pattern(template) => PathBuf::from(template),
    };
    Err(TextraError::MustBeDirectory {
        path,
        reason: format!("{} input files need one output file each", inputs.len()),
    })
}

fn validate_group(kind: OutputKind, destination: &Destination, group: &Group) -> Result<()> {
    template::validate_destination(destination)?;
    match destination {
        Destination::SingleFile(path) => {
            let aggregates = kind == OutputKind::Text && !group.positional;
            if group.units > 1 && !aggregates {
                return Err(TextraError::MustContainPattern {
                    path: path.clone(),
                    units: group.units,
                });
            }
        }
        Destination::Stdout if kind != OutputKind::Text => {
            return Err(TextraError::grammar(format!(
                "{} cannot write to standard output",
                kind.flag()
            )));
        }
        Destination::None
        | Destination::Stdout
        | Destination::Directory(_)
        | Destination::Pattern(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use textra_core::InputKind;

    fn image(name: &str) -> InputSpec {
        InputSpec {
            path: PathBuf::from(name),
            kind: InputKind::Image,
            unit_count: 1,
        }
    }

    fn document(name: &str, pages: usize) -> InputSpec {
        InputSpec {
            path: PathBuf::from(name),
            kind: InputKind::Document,
            unit_count: pages,
        }
    }

    fn text_files(plan: &ExecutionPlan) -> Vec<PathBuf> {
        plan.units()
            .iter()
            .filter_map(|u| match &u.text {
                TextRoute::File(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn document_without_destination_streams_every_page() {
        let plan = build(vec![document("doc_3.pdf", 3)], &[]).unwrap();
        assert_eq!(plan.len(), 3);
        assert!(plan.units().iter().all(|u| u.text == TextRoute::Stdout));
        let pages: Vec<_> = plan.units().iter().map(|u| u.unit.page_index).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert!(plan.output_files().is_empty());
    }

    #[test]
    fn ordinals_follow_declaration_order() {
        let plan = build(vec![image("a.png"), document("b.pdf", 2), image("c.png")], &[]).unwrap();
        let ordinals: Vec<_> = plan
            .units()
            .iter()
            .map(|u| (u.unit.input_index, u.unit.page_index, u.unit.ordinal))
            .collect();
        assert_eq!(ordinals, vec![(0, 1, 0), (1, 1, 1), (1, 2, 2), (2, 1, 3)]);
    }

    #[test]
    fn positional_pattern_expands_pages() {
        let request = OutputRequest::positional(Destination::Pattern("output-{}.txt".into()));
        let plan = build(vec![document("doc_3.pdf", 3)], &[request]).unwrap();
        assert_eq!(
            text_files(&plan),
            vec![
                PathBuf::from("output-1.txt"),
                PathBuf::from("output-2.txt"),
                PathBuf::from("output-3.txt"),
            ]
        );
        assert!(!plan.streams_to_stdout());
    }

    #[test]
    fn positional_literal_file_for_pages_needs_pattern() {
        let request = OutputRequest::positional(Destination::SingleFile("output.txt".into()));
        let err = build(vec![document("doc_3.pdf", 3)], &[request]).unwrap_err();
        assert!(err.to_string().contains("must contain a pattern"));
    }

    #[test]
    fn positional_literal_file_for_single_image_is_fine() {
        let request = OutputRequest::positional(Destination::SingleFile("docp1.txt".into()));
        let plan = build(vec![image("docp1.png")], &[request]).unwrap();
        assert_eq!(text_files(&plan), vec![PathBuf::from("docp1.txt")]);
    }

    #[test]
    fn positional_with_several_inputs_must_be_directory() {
        for destination in [
            Destination::SingleFile("doc.txt".into()),
            Destination::Pattern("doc-{}.txt".into()),
        ] {
            let request = OutputRequest::positional(destination);
            let err = build(vec![image("docp1.png"), image("docp2.png")], &[request]).unwrap_err();
            assert!(err.to_string().contains("must be a directory"), "{err}");
        }
    }

    #[test]
    fn positional_directory_names_files_after_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let request = OutputRequest::positional(Destination::Directory(dir.path().to_path_buf()));
        let inputs = vec![image("docp1.png"), image("docp2.png"), image("docp3.png")];
        let plan = build(inputs, &[request]).unwrap();
        assert_eq!(
            text_files(&plan),
            vec![
                dir.path().join("docp1.txt"),
                dir.path().join("docp2.txt"),
                dir.path().join("docp3.txt"),
            ]
        );
    }

    #[test]
    fn positional_directory_for_document_uses_page_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let request = OutputRequest::positional(Destination::Directory(dir.path().to_path_buf()));
        let plan = build(vec![document("doc_3.pdf", 3)], &[request]).unwrap();
        assert_eq!(
            text_files(&plan),
            vec![
                dir.path().join("1.txt"),
                dir.path().join("2.txt"),
                dir.path().join("3.txt"),
            ]
        );
    }

    #[test]
    fn global_text_file_combines_inputs() {
        let request = OutputRequest::global(
            OutputKind::Text,
            Destination::SingleFile("combined.txt".into()),
        );
        let plan = build(vec![image("a.png"), image("b.png")], &[request]).unwrap();
        assert_eq!(
            text_files(&plan),
            vec![PathBuf::from("combined.txt"), PathBuf::from("combined.txt")]
        );
        assert_eq!(plan.output_files(), vec![Path::new("combined.txt")]);
    }

    #[test]
    fn per_input_request_overrides_global() {
        let requests = [
            OutputRequest::per_input(OutputKind::Text, 0, Destination::SingleFile("a.txt".into())),
            OutputRequest::global(OutputKind::Text, Destination::SingleFile("rest.txt".into())),
        ];
        let plan = build(vec![image("a.png"), image("b.png"), image("c.png")], &requests).unwrap();
        assert_eq!(
            text_files(&plan),
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("rest.txt"),
                PathBuf::from("rest.txt"),
            ]
        );
    }

    #[test]
    fn page_text_literal_file_with_pages_needs_pattern() {
        let request = OutputRequest::global(
            OutputKind::PageText,
            Destination::SingleFile("page.txt".into()),
        );
        let err = build(vec![document("doc_3.pdf", 3)], &[request]).unwrap_err();
        assert!(matches!(err, TextraError::MustContainPattern { units: 3, .. }));
    }

    #[test]
    fn page_text_pattern_still_streams_text() {
        let request = OutputRequest::global(
            OutputKind::PageText,
            Destination::Pattern("page-{}.txt".into()),
        );
        let plan = build(vec![document("doc.pdf", 2)], &[request]).unwrap();
        assert!(plan.units().iter().all(|u| u.text == TextRoute::Stdout));
        assert_eq!(plan.units()[1].page_text, Some(PathBuf::from("page-2.txt")));
    }

    #[test]
    fn positions_alone_still_stream_text() {
        let request = OutputRequest::global(
            OutputKind::Positions,
            Destination::SingleFile("scan.json".into()),
        );
        let plan = build(vec![image("scan.png")], &[request]).unwrap();
        assert_eq!(plan.units()[0].text, TextRoute::Stdout);
        assert_eq!(plan.units()[0].positions, Some(PathBuf::from("scan.json")));
    }

    #[test]
    fn shared_directory_names_pages_by_input() {
        let dir = tempfile::tempdir().unwrap();
        let request = OutputRequest::global(
            OutputKind::Positions,
            Destination::Directory(dir.path().to_path_buf()),
        );
        let plan = build(vec![document("doc.pdf", 2), image("scan.png")], &[request]).unwrap();
        let files: Vec<_> = plan.units().iter().filter_map(|u| u.positions.clone()).collect();
        assert_eq!(
            files,
            vec![
                dir.path().join("doc-1.json"),
                dir.path().join("doc-2.json"),
                dir.path().join("scan.json"),
            ]
        );
    }

    #[test]
    fn pattern_shared_by_single_page_inputs_collides() {
        let request = OutputRequest::global(
            OutputKind::Text,
            Destination::Pattern("out-{}.txt".into()),
        );
        let err = build(vec![image("a.png"), image("b.png")], &[request]).unwrap_err();
        assert!(matches!(err, TextraError::OutputCollision { .. }), "{err}");
    }

    #[test]
    fn text_and_page_text_cannot_share_a_file() {
        let requests = [
            OutputRequest::global(OutputKind::Text, Destination::SingleFile("x.txt".into())),
            OutputRequest::global(OutputKind::PageText, Destination::SingleFile("x.txt".into())),
        ];
        let err = build(vec![image("a.png")], &requests).unwrap_err();
        assert!(matches!(err, TextraError::OutputCollision { .. }));
    }

    #[test]
    fn missing_parent_directory_fails_before_anything_runs() {
        let request = OutputRequest::global(
            OutputKind::Text,
            Destination::SingleFile("no/such/dir/out.txt".into()),
        );
        let err = build(vec![image("a.png")], &[request]).unwrap_err();
        assert!(err.to_string().contains("must be a directory"));
    }

    #[test]
    fn positions_cannot_go_to_stdout() {
        let request = OutputRequest::global(OutputKind::Positions, Destination::Stdout);
        let err = build(vec![image("a.png")], &[request]).unwrap_err();
        assert!(matches!(err, TextraError::Grammar(_)));
    }

    #[test]
    fn first_invalid_destination_is_reported() {
        let requests = [
            OutputRequest::global(OutputKind::Positions, Destination::Directory("no/such/dir".into())),
            OutputRequest::global(OutputKind::PageText, Destination::SingleFile("pages.txt".into())),
            OutputRequest::global(OutputKind::Text, Destination::Pattern("no-placeholder.txt".into())),
        ];
        for _ in 0..20 {
            let err = build(vec![document("doc_3.pdf", 3)], &requests).unwrap_err();
            assert!(matches!(err, TextraError::InvalidPattern { .. }), "{err}");
        }
        let err = build(vec![document("doc_3.pdf", 3)], &requests[..2]).unwrap_err();
        assert!(matches!(err, TextraError::MustContainPattern { units: 3, .. }), "{err}");
    }

    #[test]
    fn duplicate_requests_are_rejected() {
        let requests = [
            OutputRequest::per_input(OutputKind::Text, 0, Destination::SingleFile("a.txt".into())),
            OutputRequest::per_input(OutputKind::Text, 0, Destination::SingleFile("b.txt".into())),
        ];
        let err = RequestOverlay::build(&requests, 1).unwrap_err();
        assert!(matches!(err, TextraError::Grammar(_)));
    }
}
