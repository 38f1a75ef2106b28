use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use textra_core::{RecognitionRequest, RecognitionResult, Recognizer, Result, TextraError};
use textra_planner::ExecutionPlan;

/// Settings shared by every recognition call in a run.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Maximum number of units recognized at once.
    pub workers: usize,
    pub locale: Option<String>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(4, |n| n.get()),
            locale: None,
        }
    }
}

/// Runs the recognizer over every unit of a plan on a bounded pool.
pub struct Executor {
    recognizer: Arc<dyn Recognizer>,
    options: DispatchOptions,
}

impl Executor {
    pub fn new(recognizer: Arc<dyn Recognizer>, options: DispatchOptions) -> Self {
        Self {
            recognizer,
            options,
        }
    }

    /// Recognize every unit and return the results in ordinal order.
    ///
    /// The first failing unit aborts all queued and in-flight work.
    pub async fn dispatch(&self, plan: &ExecutionPlan) -> Result<Vec<RecognitionResult>> {
        let workers = self.options.workers.max(1);
        info!(
            backend = self.recognizer.name(),
            units = plan.len(),
            workers,
            locale = ?self.options.locale,
            "Dispatching recognition"
        );

        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut slots: Vec<Option<RecognitionResult>> = vec![None; plan.len()];
        let mut join_set = JoinSet::new();

        for planned in plan.units() {
            let unit = planned.unit;
            let input = plan.input_of(&unit);
            let request = RecognitionRequest {
                path: input.path.clone(),
                kind: input.kind,
                page_index: unit.page_index,
                locale: self.options.locale.clone(),
            };
            let recognizer = Arc::clone(&self.recognizer);
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        debug!(
                            input = %request.path.display(),
                            page = request.page_index,
                            ordinal = unit.ordinal,
                            "Recognizing unit"
                        );
                        recognizer.recognize(&request).await
                    }
                    Err(e) => Err(e.into()),
                };
                (unit, request.path, outcome)
            });
        }

        let mut done = 0;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((unit, _, Ok(recognized))) => {
                    done += 1;
                    debug!(ordinal = unit.ordinal, done, total = plan.len(), "Unit recognized");
                    slots[unit.ordinal] = Some(RecognitionResult::new(unit, recognized));
                }
                Ok((unit, path, Err(e))) => {
                    warn!(
                        input = %path.display(),
                        page = unit.page_index,
                        error = %e,
                        "Recognition failed, cancelling remaining units"
                    );
                    join_set.abort_all();
                    return Err(TextraError::Recognition {
                        input: path,
                        page: unit.page_index,
                        message: format!("{e:#}"),
                    });
                }
                Err(e) => {
                    // The empty slot is reported below with its unit.
                    error!(error = %e, "Recognition task panicked");
                }
            }
        }

        info!(
            units = plan.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Recognition finished"
        );

        slots
            .into_iter()
            .zip(plan.units())
            .map(|(slot, planned)| {
                slot.ok_or_else(|| TextraError::Recognition {
                    input: plan.input_of(&planned.unit).path.clone(),
                    page: planned.unit.page_index,
                    message: "recognition task panicked".to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use textra_core::{InputKind, InputSpec, MockRecognizer, OutputRequest};

    fn image(name: &str) -> InputSpec {
        InputSpec {
            path: PathBuf::from(name),
            kind: InputKind::Image,
            unit_count: 1,
        }
    }

    fn plan(inputs: Vec<InputSpec>) -> ExecutionPlan {
        let requests: [OutputRequest; 0] = [];
        textra_planner::build(inputs, &requests).unwrap()
    }

    fn options(workers: usize) -> DispatchOptions {
        DispatchOptions {
            workers,
            locale: Some("fr-FR".to_string()),
        }
    }

    #[tokio::test]
    async fn results_follow_ordinals_not_completion() {
        let mock = MockRecognizer::new()
            .with_text("a.png", "a")
            .with_text("b.png", "b")
            .with_delay("a.png", Duration::from_millis(80));
        let executor = Executor::new(Arc::new(mock), options(4));

        let results = executor
            .dispatch(&plan(vec![image("a.png"), image("b.png")]))
            .await
            .unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
        assert_eq!(results[1].unit.ordinal, 1);
    }

    #[tokio::test]
    async fn document_pages_are_recognized_individually() {
        let doc = InputSpec {
            path: PathBuf::from("doc_3.pdf"),
            kind: InputKind::Document,
            unit_count: 3,
        };
        let executor = Executor::new(Arc::new(MockRecognizer::new()), options(2));
        let results = executor.dispatch(&plan(vec![doc])).await.unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.text.clone()).collect();
        assert_eq!(texts, vec!["doc_3 page 1", "doc_3 page 2", "doc_3 page 3"]);
    }

    #[tokio::test]
    async fn locale_reaches_every_call() {
        let mock = Arc::new(MockRecognizer::new());
        let executor = Executor::new(mock.clone(), options(1));
        executor
            .dispatch(&plan(vec![image("a.png"), image("b.png"), image("c.png")]))
            .await
            .unwrap();
        assert_eq!(mock.locales(), vec![Some("fr-FR".to_string()); 3]);
    }

    #[tokio::test]
    async fn first_failure_aborts_the_run() {
        let mock = MockRecognizer::new()
            .failing_on("b.png", 1)
            .with_delay("c.png", Duration::from_secs(30));
        let executor = Executor::new(Arc::new(mock), options(4));

        let started = Instant::now();
        let err = executor
            .dispatch(&plan(vec![image("a.png"), image("b.png"), image("c.png")]))
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(10));
        match err {
            TextraError::Recognition { input, page, message } => {
                assert_eq!(input, PathBuf::from("b.png"));
                assert_eq!(page, 1);
                assert!(message.contains("mock failure"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn zero_workers_still_makes_progress() {
        let executor = Executor::new(Arc::new(MockRecognizer::new()), options(0));
        let results = executor.dispatch(&plan(vec![image("a.png")])).await.unwrap();
        assert_eq!(results.len(), 1);
    }
}
