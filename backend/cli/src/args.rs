//! Command-line grammar.
//!
//! clap tokenizes the command line; scoping is then recovered from argument
//! positions (`ArgMatches::indices_of`): an output flag belongs to the last
//! input file before it, and flags after the last input file are global.

use std::path::{Path, PathBuf};

use clap::error::{ContextKind, ErrorKind};
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use tracing::{debug, warn};

use textra_core::{Destination, OutputKind, OutputRequest, Result, TextraError, PLACEHOLDER};

const USAGE: &str = "textra [-v|--version] [-l|--locale CODE] [-s|--silent] \
(FILE [-o|--outputText DEST] [-p|--outputPositions DEST] [-t|--outputPageText DEST])... [DEST]";

const DESTINATIONS: &str = "\
Destinations:
  -          standard output (text only)
  DIR        an existing directory; one file per page, named after the input
  NAME-{}.x  a pattern; {} is replaced with the page number
  FILE       a single file; text of every page is combined

Output flags following a FILE apply to that file only. Flags after the last
FILE apply to all inputs. Without any output flag, the last of two or more
arguments is the DEST that receives the text. With no destination at all, text
is printed.";

#[derive(Parser, Debug)]
#[command(
    name = "textra",
    version,
    about = "Extract text from images, PDF documents and audio files",
    override_usage = USAGE,
    after_help = DESTINATIONS,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    #[arg(short = 'h', long = "help", action = ArgAction::Help, hide = true)]
    help: Option<bool>,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Recognition language, e.g. en-US or de
    #[arg(short = 'l', long = "locale", value_name = "CODE", action = ArgAction::Append)]
    locale: Vec<String>,

    /// Do not echo written file names
    #[arg(short = 's', long = "silent", action = ArgAction::Count)]
    silent: u8,

    /// Write recognized text to DEST
    #[arg(short = 'o', long = "outputText", value_name = "DEST", action = ArgAction::Append)]
    output_text: Vec<String>,

    /// Write positions of recognized text as JSON to DEST
    #[arg(short = 'p', long = "outputPositions", value_name = "DEST", action = ArgAction::Append)]
    output_positions: Vec<String>,

    /// Write the text of each page to DEST
    #[arg(short = 't', long = "outputPageText", value_name = "DEST", action = ArgAction::Append)]
    output_page_text: Vec<String>,

    /// Input files, optionally followed by a destination
    #[arg(value_name = "FILE", action = ArgAction::Append)]
    files: Vec<String>,
}

/// A fully scoped command line, ready for input resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub locale: Option<String>,
    pub silent: bool,
    pub inputs: Vec<PathBuf>,
    pub requests: Vec<OutputRequest>,
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(ParsedArgs),
    /// Help or version text, printed to stdout.
    Info(String),
    /// No arguments at all.
    Usage,
}

pub fn usage_hint() -> String {
    format!("usage: {USAGE}\nRun `textra --help` for details.")
}

/// Parse arguments, excluding the program name.
pub fn parse<I, T>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    if args.is_empty() {
        return Ok(Invocation::Usage);
    }

    let matches = match Cli::command().try_get_matches_from(
        std::iter::once("textra".to_string()).chain(args.iter().cloned()),
    ) {
        Ok(matches) => matches,
        Err(e) => return from_clap_error(e),
    };
    let cli = Cli::from_arg_matches(&matches).map_err(|e| TextraError::grammar(e.to_string()))?;

    let parsed = scope(&cli, &matches)?;
    debug!(?parsed, "Parsed command line");
    Ok(Invocation::Run(parsed))
}

fn from_clap_error(e: clap::Error) -> Result<Invocation> {
    let arg = e
        .get(ContextKind::InvalidArg)
        .map(|v| v.to_string())
        .unwrap_or_default();
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            Ok(Invocation::Info(e.render().to_string()))
        }
        ErrorKind::UnknownArgument => Err(TextraError::grammar(format!("invalid argument '{arg}'"))),
        ErrorKind::InvalidValue | ErrorKind::NoEquals => Err(TextraError::grammar(format!(
            "{arg} needs a value; list input files before their output flags"
        ))),
        _ => {
            let rendered = e.render().to_string();
            let message = rendered.lines().next().unwrap_or_default();
            Err(TextraError::grammar(
                message.strip_prefix("error: ").unwrap_or(message).to_string(),
            ))
        }
    }
}

fn indices(matches: &ArgMatches, id: &str) -> Vec<usize> {
    matches
        .indices_of(id)
        .map(|indices| indices.collect())
        .unwrap_or_default()
}

fn scope(cli: &Cli, matches: &ArgMatches) -> Result<ParsedArgs> {
    let file_indices = indices(matches, "files");
    let first_file = file_indices.first().copied();

    if cli.locale.len() > 1 {
        return Err(TextraError::grammar("-l may only be given once"));
    }
    if let (Some(&locale_at), Some(first)) = (indices(matches, "locale").first(), first_file) {
        if locale_at > first {
            return Err(TextraError::grammar("-l must come before the first input file"));
        }
    }

    let flagged: Vec<(OutputKind, usize, &String)> = [
        (OutputKind::Text, "output_text", &cli.output_text),
        (OutputKind::Positions, "output_positions", &cli.output_positions),
        (OutputKind::PageText, "output_page_text", &cli.output_page_text),
    ]
    .into_iter()
    .flat_map(|(kind, id, values)| {
        indices(matches, id)
            .into_iter()
            .zip(values)
            .map(move |(at, value)| (kind, at, value))
    })
    .collect();

    let mut inputs: Vec<PathBuf> = cli.files.iter().map(PathBuf::from).collect();
    let mut requests = Vec::new();

    if flagged.is_empty() {
        // Legacy form: with two or more positionals the last one is the
        // destination. It may not name an existing input file.
        if cli.files.len() >= 2 {
            if let Some(dest) = cli.files.last() {
                if textra_media::classify(Path::new(dest)).is_ok() {
                    return Err(TextraError::MustBeDirectory {
                        path: PathBuf::from(dest),
                        reason: "it names an existing input file".to_string(),
                    });
                }
                inputs.pop();
                requests.push(OutputRequest::positional(Destination::classify(dest)));
            }
        }
    } else if let Some(dest) = ignored_destination(&cli.files, &file_indices, &flagged) {
        warn!(dest, "Output flags given, ignoring trailing destination");
        inputs.pop();
    }

    for (kind, at, value) in flagged {
        let preceding = file_indices[..inputs.len()]
            .iter()
            .filter(|&&file_at| file_at < at)
            .count();
        if preceding == 0 {
            return Err(TextraError::grammar(format!(
                "{} needs input files before it",
                kind.flag()
            )));
        }
        let destination = Destination::classify(value);
        requests.push(if preceding == inputs.len() {
            OutputRequest::global(kind, destination)
        } else {
            OutputRequest::per_input(kind, preceding - 1, destination)
        });
    }

    requests.sort_by_key(|r| r.kind);

    Ok(ParsedArgs {
        locale: cli.locale.first().cloned(),
        silent: cli.silent > 0,
        inputs,
        requests,
    })
}

/// A trailing positional after every output flag that cannot be an input
/// (it holds a placeholder or is not a usable file). Flags win over it.
fn ignored_destination<'a>(
    files: &'a [String],
    file_indices: &[usize],
    flagged: &[(OutputKind, usize, &String)],
) -> Option<&'a str> {
    if files.len() < 2 {
        return None;
    }
    let last = files.last()?;
    let last_at = *file_indices.last()?;
    let after_flags = flagged.iter().all(|&(_, at, _)| at < last_at);
    let not_an_input =
        last.contains(PLACEHOLDER) || textra_media::classify(Path::new(last)).is_err();
    (after_flags && not_an_input).then_some(last.as_str())
}
