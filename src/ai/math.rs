use crate::ai::client::GenerationBackend;
use crate::ai::parser::parse_math_response;
use crate::ai::prompts::build_math_prompt;
use crate::error::{GenerationError, Result};
use crate::files::Attachment;
use crate::logger;
use crate::models::MathProblem;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct MathRequest {
    pub problem_text: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone)]
pub struct MathOutcome {
    pub problems: Vec<MathProblem>,
    /// Sources that produced a placeholder; a failed typed problem counts as one
    pub failed_files: usize,
}

impl MathOutcome {
    pub fn solved(&self) -> impl Iterator<Item = &MathProblem> {
        self.problems.iter().filter(|p| !p.is_placeholder())
    }
}

pub struct MathSolver {
    backend: Arc<dyn GenerationBackend>,
}

impl MathSolver {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Solve typed-in problems and/or every problem found in the attached documents.
    ///
    /// Documents are handled one at a time. When one fails, a placeholder
    /// problem carrying the error takes its place and the next document is
    /// still processed. Ids are prefixed with their source (`t-`, `f1-`, ...)
    /// once more than one source is given.
    pub async fn solve(&self, request: MathRequest) -> Result<MathOutcome> {
        let MathRequest {
            problem_text,
            attachments,
        } = request;
        let problem_text = problem_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        if problem_text.is_none() && attachments.is_empty() {
            return Err(GenerationError::MissingInput);
        }

        let mut problems = Vec::new();
        let mut failed_files = 0;
        let prefix_ids = usize::from(problem_text.is_some()) + attachments.len() > 1;

        if let Some(text) = problem_text {
            logger::log(&format!("Solving typed problem via {}", self.backend.name()));
            match self.solve_text(text).await {
                Ok(solved) => {
                    for mut problem in solved {
                        if prefix_ids {
                            problem.id = format!("t-{}", problem.id);
                        }
                        problems.push(problem);
                    }
                }
                // Nothing else to solve, so the caller gets the error itself
                Err(e) if attachments.is_empty() => return Err(e),
                Err(e) => {
                    logger::log(&format!("Failed to solve typed problem: {}", e));
                    failed_files += 1;
                    problems.push(MathProblem::typed_placeholder(&e.to_string()));
                }
            }
        }

        for (index, attachment) in attachments.into_iter().enumerate() {
            let name = attachment.name();
            logger::log(&format!("Processing file {}: {}", index + 1, name));

            match self.solve_file(attachment).await {
                Ok(solved) => {
                    for mut problem in solved {
                        if prefix_ids {
                            problem.id = format!("f{}-{}", index + 1, problem.id);
                        }
                        problems.push(problem);
                    }
                }
                Err(e) => {
                    logger::log(&format!("Failed to process {}: {}", name, e));
                    failed_files += 1;
                    problems.push(MathProblem::placeholder(index, &name, &e.to_string()));
                }
            }
        }

        Ok(MathOutcome {
            problems,
            failed_files,
        })
    }

    async fn solve_text(&self, text: &str) -> Result<Vec<MathProblem>> {
        let raw = self.backend.generate_text(&build_math_prompt(Some(text))).await?;
        logger::log(&format!("Raw AI response: {}", raw));

        let problems = parse_math_response(&raw)?;
        if problems.is_empty() {
            return Err(GenerationError::Backend(
                "No math problems were found in the typed problem".to_string(),
            ));
        }
        Ok(problems)
    }

    async fn solve_file(&self, attachment: Attachment) -> Result<Vec<MathProblem>> {
        let file = attachment.load()?;
        let raw = self
            .backend
            .generate_from_file(&build_math_prompt(None), &file)
            .await?;
        logger::log(&format!("Raw AI response for {}: {}", file.name, raw));

        let problems = parse_math_response(&raw)?;
        if problems.is_empty() {
            return Err(GenerationError::Backend(format!(
                "No math problems were found in {}",
                file.name
            )));
        }
        Ok(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::mock::MockBackend;
    use crate::models::UploadedFile;

    const ONE_PROBLEM: &str = "```json\n[{\"id\":\"q1\",\"question\":\"2+2=?\",\"solution\":\"4\",\"difficulty\":\"Easy\",\"topic\":\"Arithmetic\",\"steps\":[{\"step\":1,\"description\":\"Add\",\"equation\":\"2+2\",\"explanation\":\"Sum the values\"}]}]\n```";

    const TWO_PROBLEMS: &str = r#"Here you go: [{"id": "p1", "question": "x+1=3", "solution": "x=2"}, {"id": "p2", "question": "2x=8", "solution": "x=4"}]"#;

    fn image(name: &str) -> Attachment {
        Attachment::from(UploadedFile::new(name, "image/png", vec![0x89, 0x50]))
    }

    #[tokio::test]
    async fn test_missing_input_makes_no_calls() {
        let backend = Arc::new(MockBackend::with_texts(&[ONE_PROBLEM]));
        let solver = MathSolver::new(backend.clone());

        let result = solver.solve(MathRequest::default()).await;
        assert!(matches!(result, Err(GenerationError::MissingInput)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_solve_typed_problem() {
        let backend = Arc::new(MockBackend::with_texts(&[ONE_PROBLEM]));
        let solver = MathSolver::new(backend.clone());

        let outcome = solver
            .solve(MathRequest {
                problem_text: Some("What is 2+2?".to_string()),
                attachments: vec![],
            })
            .await
            .unwrap();

        assert_eq!(outcome.problems.len(), 1);
        assert_eq!(outcome.problems[0].id, "q1");
        assert_eq!(outcome.problems[0].solution, "4");
        assert_eq!(outcome.failed_files, 0);
        assert!(backend.calls()[0].prompt.contains("What is 2+2?"));
    }

    #[tokio::test]
    async fn test_refusal_for_typed_problem_is_malformed() {
        let backend = Arc::new(MockBackend::with_texts(&["Sorry, I cannot help with that."]));
        let solver = MathSolver::new(backend);

        let result = solver
            .solve(MathRequest {
                problem_text: Some("Prove P = NP".to_string()),
                attachments: vec![],
            })
            .await;

        assert!(matches!(result, Err(GenerationError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_failed_file_becomes_placeholder_and_processing_continues() {
        let backend = Arc::new(MockBackend::new(vec![
            Ok(ONE_PROBLEM.to_string()),
            Ok("Sorry, I cannot help with that.".to_string()),
            Err(GenerationError::Backend("connection refused".to_string())),
            Ok(TWO_PROBLEMS.to_string()),
        ]));
        let solver = MathSolver::new(backend.clone());

        let outcome = solver
            .solve(MathRequest {
                problem_text: None,
                attachments: vec![image("a.png"), image("b.png"), image("c.png"), image("d.png")],
            })
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.problems.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["f1-q1", "error-2", "error-3", "f4-p1", "f4-p2"]);
        assert_eq!(outcome.failed_files, 2);
        assert_eq!(outcome.solved().count(), 3);

        let malformed = &outcome.problems[1];
        assert_eq!(malformed.question, "Could not process b.png");
        assert!(malformed.steps[0].explanation.starts_with("Failed to parse AI response"));

        let network = &outcome.problems[2];
        assert!(network.steps[0].explanation.contains("connection refused"));

        let calls = backend.calls();
        assert_eq!(calls.len(), 4);
        let files: Vec<Option<&str>> = calls.iter().map(|c| c.file.as_deref()).collect();
        assert_eq!(files, vec![Some("a.png"), Some("b.png"), Some("c.png"), Some("d.png")]);
    }

    #[tokio::test]
    async fn test_single_file_keeps_model_ids() {
        let backend = Arc::new(MockBackend::with_texts(&[TWO_PROBLEMS]));
        let solver = MathSolver::new(backend);

        let outcome = solver
            .solve(MathRequest {
                problem_text: None,
                attachments: vec![image("worksheet.png")],
            })
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.problems.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_empty_result_for_file_is_a_failure() {
        let backend = Arc::new(MockBackend::with_texts(&["[]"]));
        let solver = MathSolver::new(backend);

        let outcome = solver
            .solve(MathRequest {
                problem_text: None,
                attachments: vec![image("blank.png")],
            })
            .await
            .unwrap();

        assert_eq!(outcome.failed_files, 1);
        assert!(outcome.problems[0].is_placeholder());
        assert!(outcome.problems[0].steps[0].explanation.contains("No math problems"));
    }

    #[tokio::test]
    async fn test_empty_result_for_typed_problem_is_an_error() {
        let backend = Arc::new(MockBackend::with_texts(&["[]"]));
        let solver = MathSolver::new(backend);

        let result = solver
            .solve(MathRequest {
                problem_text: Some("Solve nothing".to_string()),
                attachments: vec![],
            })
            .await;

        assert!(matches!(result, Err(GenerationError::Backend(_))));
    }

    #[tokio::test]
    async fn test_failed_typed_problem_does_not_skip_files() {
        let backend = Arc::new(MockBackend::with_texts(&["Sorry, no.", TWO_PROBLEMS]));
        let solver = MathSolver::new(backend.clone());

        let outcome = solver
            .solve(MathRequest {
                problem_text: Some("Prove P = NP".to_string()),
                attachments: vec![image("worksheet.png")],
            })
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.problems.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["error-t", "f1-p1", "f1-p2"]);
        assert_eq!(outcome.failed_files, 1);
        assert!(outcome.problems[0].is_placeholder());
        assert_eq!(outcome.problems[0].question, "Could not process the typed problem");
        assert_eq!(backend.calls().len(), 2);
        assert_eq!(backend.calls()[1].file.as_deref(), Some("worksheet.png"));
    }

    #[tokio::test]
    async fn test_typed_problem_and_file_get_distinct_ids() {
        let no_ids = r#"[{"question": "x+1=3", "solution": "x=2"}]"#;
        let backend = Arc::new(MockBackend::with_texts(&[no_ids, no_ids]));
        let solver = MathSolver::new(backend);

        let outcome = solver
            .solve(MathRequest {
                problem_text: Some("x+1=3".to_string()),
                attachments: vec![image("worksheet.png")],
            })
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.problems.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["t-problem-1", "f1-problem-1"]);
        assert_eq!(outcome.failed_files, 0);
    }
}
