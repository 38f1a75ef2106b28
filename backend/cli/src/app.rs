//! One textra run: resolve inputs, plan outputs, recognize, write.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use textra_core::{Recognizer, Result};
use textra_executor::{DispatchOptions, Executor, OutputWriter};

use crate::args::ParsedArgs;

/// Run a parsed command line and return the files written.
///
/// Every validation step finishes before the first recognition call, and
/// nothing is written unless every unit was recognized.
pub async fn run<W: Write>(
    args: ParsedArgs,
    recognizer: Arc<dyn Recognizer>,
    workers: Option<usize>,
    stdout: W,
) -> Result<Vec<PathBuf>> {
    let inputs = textra_media::resolve_all(&args.inputs, recognizer.as_ref()).await?;
    let plan = textra_planner::build(inputs, &args.requests)?;
    info!(
        inputs = plan.inputs().len(),
        units = plan.len(),
        files = plan.output_files().len(),
        "Plan validated"
    );

    let mut options = DispatchOptions {
        locale: args.locale,
        ..DispatchOptions::default()
    };
    if let Some(workers) = workers {
        options.workers = workers;
    }

    let results = Executor::new(recognizer, options).dispatch(&plan).await?;
    OutputWriter::new(stdout).write(&plan, &results).await
}
