use crate::ai::client::GenerationBackend;
use crate::ai::parser::{default_estimated_time, parse_exam_response};
use crate::ai::prompts::build_exam_prompt;
use crate::error::{GenerationError, Result};
use crate::files::Attachment;
use crate::logger;
use crate::models::{ExamSettings, GeneratedExam};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ExamRequest {
    pub settings: ExamSettings,
    pub description: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// A document that did not contribute to the exam, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ExamOutcome {
    pub exam: GeneratedExam,
    pub failures: Vec<FileFailure>,
}

pub struct ExamGenerator {
    backend: Arc<dyn GenerationBackend>,
}

impl ExamGenerator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Generate an exam from a description, one or more documents, or both.
    ///
    /// Documents are sent one request at a time. A document that fails is
    /// recorded in `failures` and the rest are still processed; the call only
    /// fails outright when no document produced questions.
    pub async fn generate(&self, request: ExamRequest) -> Result<ExamOutcome> {
        let ExamRequest {
            settings,
            description,
            attachments,
        } = request;
        let description = description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        if description.is_none() && attachments.is_empty() {
            return Err(GenerationError::MissingInput);
        }

        let question_count = settings.question_count.max(1);

        if attachments.is_empty() {
            logger::log(&format!(
                "Generating {} question exam from description via {}",
                question_count,
                self.backend.name()
            ));
            let prompt = build_exam_prompt(&settings, question_count, description, None);
            let raw = self.backend.generate_text(&prompt).await?;
            logger::log(&format!("Raw AI response: {}", raw));
            let exam = parse_exam_response(&raw, &settings)?;
            return Ok(ExamOutcome {
                exam,
                failures: Vec::new(),
            });
        }

        let per_file = question_count.div_ceil(attachments.len());
        let mut partials = Vec::new();
        let mut failures = Vec::new();
        let mut first_error = None;

        for attachment in attachments {
            let name = attachment.name();
            logger::log(&format!("Generating exam questions from {}", name));

            match self
                .generate_for_file(&settings, per_file, description, attachment)
                .await
            {
                Ok(exam) => partials.push(exam),
                Err(e) => {
                    logger::log(&format!("Exam generation failed for {}: {}", name, e));
                    failures.push(FileFailure {
                        file: name,
                        message: e.to_string(),
                    });
                    first_error.get_or_insert(e);
                }
            }
        }

        if partials.is_empty() {
            return Err(first_error.unwrap_or(GenerationError::MissingInput));
        }

        Ok(ExamOutcome {
            exam: merge_exams(partials, &settings),
            failures,
        })
    }

    async fn generate_for_file(
        &self,
        settings: &ExamSettings,
        question_count: usize,
        description: Option<&str>,
        attachment: Attachment,
    ) -> Result<GeneratedExam> {
        let file = attachment.load()?;
        let prompt = build_exam_prompt(settings, question_count, description, Some(&file.name));
        let raw = self.backend.generate_from_file(&prompt, &file).await?;
        logger::log(&format!("Raw AI response for {}: {}", file.name, raw));
        parse_exam_response(&raw, settings)
    }
}

/// Combine per-document exams: metadata from the first, questions from all
/// in order, capped at the requested count and renumbered `q1..qN`.
/// Points and estimated time are recomputed for the merged question list.
pub fn merge_exams(partials: Vec<GeneratedExam>, settings: &ExamSettings) -> GeneratedExam {
    let question_count = settings.question_count.max(1);
    let mut partials = partials.into_iter();
    let Some(mut merged) = partials.next() else {
        return GeneratedExam {
            title: String::new(),
            description: String::new(),
            instructions: String::new(),
            questions: Vec::new(),
            total_points: 0,
            estimated_time: String::new(),
        };
    };

    for exam in partials {
        merged.questions.extend(exam.questions);
    }

    merged.questions.truncate(question_count);
    for (i, question) in merged.questions.iter_mut().enumerate() {
        question.id = format!("q{}", i + 1);
    }
    merged.recompute_total_points();
    merged.estimated_time = default_estimated_time(settings, merged.questions.len());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::mock::MockBackend;
    use crate::models::UploadedFile;
    use std::path::PathBuf;

    const TWO_QUESTIONS: &str = r#"```json
{
  "title": "Cells",
  "description": "Cell biology basics",
  "instructions": "Answer everything",
  "questions": [
    {"id": "a", "type": "short-answer", "question": "What is a cell?", "correctAnswer": "Unit of life", "points": 2},
    {"id": "b", "type": "true-false", "question": "Cells have walls.", "correctAnswer": "False", "points": 1}
  ],
  "totalPoints": 3,
  "estimatedTime": "15 minutes"
}
```"#;

    const ONE_QUESTION: &str = r#"{"title": "Other", "questions": [{"question": "Name an organelle", "points": 5}]}"#;

    fn text_file(name: &str) -> Attachment {
        Attachment::from(UploadedFile::new(name, "text/plain", b"notes".to_vec()))
    }

    fn settings(count: usize) -> ExamSettings {
        ExamSettings {
            question_count: count,
            ..ExamSettings::default()
        }
    }

    #[tokio::test]
    async fn test_missing_input_makes_no_calls() {
        let backend = Arc::new(MockBackend::with_texts(&[TWO_QUESTIONS]));
        let generator = ExamGenerator::new(backend.clone());

        let result = generator
            .generate(ExamRequest {
                description: Some("   ".to_string()),
                ..ExamRequest::default()
            })
            .await;

        assert!(matches!(result, Err(GenerationError::MissingInput)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generate_from_description() {
        let backend = Arc::new(MockBackend::with_texts(&[TWO_QUESTIONS]));
        let generator = ExamGenerator::new(backend.clone());

        let outcome = generator
            .generate(ExamRequest {
                settings: settings(2),
                description: Some("Cell biology for grade 9".to_string()),
                attachments: vec![],
            })
            .await
            .unwrap();

        assert_eq!(outcome.exam.title, "Cells");
        assert_eq!(outcome.exam.questions.len(), 2);
        assert_eq!(outcome.exam.total_points, 3);
        assert!(outcome.failures.is_empty());

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].file.is_none());
        assert!(calls[0].prompt.contains("Cell biology for grade 9"));
    }

    #[tokio::test]
    async fn test_malformed_description_response_is_reported() {
        let backend = Arc::new(MockBackend::with_texts(&["I'm sorry, I can't do that."]));
        let generator = ExamGenerator::new(backend);

        let result = generator
            .generate(ExamRequest {
                description: Some("Algebra".to_string()),
                ..ExamRequest::default()
            })
            .await;

        assert!(matches!(result, Err(GenerationError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_files_are_merged_and_failures_recorded() {
        let backend = Arc::new(MockBackend::new(vec![
            Ok(TWO_QUESTIONS.to_string()),
            Err(GenerationError::Backend("timeout".to_string())),
            Ok(ONE_QUESTION.to_string()),
        ]));
        let generator = ExamGenerator::new(backend.clone());

        let outcome = generator
            .generate(ExamRequest {
                settings: settings(6),
                description: None,
                attachments: vec![text_file("a.txt"), text_file("b.txt"), text_file("c.txt")],
            })
            .await
            .unwrap();

        let ids: Vec<&str> = outcome.exam.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3"]);
        assert_eq!(outcome.exam.title, "Cells");
        assert_eq!(outcome.exam.total_points, 8);
        assert_eq!(outcome.exam.estimated_time, "6 minutes");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].file, "b.txt");
        assert!(outcome.failures[0].message.contains("timeout"));

        let calls = backend.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].prompt.contains("Number of questions: 2"));
        assert_eq!(calls[2].file.as_deref(), Some("c.txt"));
    }

    #[tokio::test]
    async fn test_unreadable_file_does_not_stop_others() {
        let backend = Arc::new(MockBackend::with_texts(&[ONE_QUESTION]));
        let generator = ExamGenerator::new(backend.clone());

        let outcome = generator
            .generate(ExamRequest {
                settings: settings(4),
                description: None,
                attachments: vec![
                    Attachment::from(PathBuf::from("/nonexistent/missing.pdf")),
                    text_file("notes.txt"),
                ],
            })
            .await
            .unwrap();

        assert_eq!(outcome.exam.questions.len(), 1);
        assert_eq!(outcome.failures[0].file, "missing.pdf");
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_all_files_failing_returns_first_error() {
        let backend = Arc::new(MockBackend::with_texts(&["no json here", "still none"]));
        let generator = ExamGenerator::new(backend);

        let result = generator
            .generate(ExamRequest {
                settings: settings(2),
                description: None,
                attachments: vec![text_file("a.txt"), text_file("b.txt")],
            })
            .await;

        match result {
            Err(GenerationError::MalformedResponse { raw, .. }) => assert_eq!(raw, "no json here"),
            other => panic!("expected MalformedResponse, got {:?}", other.map(|o| o.exam)),
        }
    }

    #[test]
    fn test_merge_truncates_to_requested_count() {
        let s = settings(10);
        let first = parse_exam_response(TWO_QUESTIONS, &s).unwrap();
        let second = parse_exam_response(TWO_QUESTIONS, &s).unwrap();

        let merged = merge_exams(vec![first, second], &settings(3));
        assert_eq!(merged.questions.len(), 3);
        assert_eq!(merged.questions[2].id, "q3");
        assert_eq!(merged.total_points, 5);
        assert_eq!(merged.estimated_time, "6 minutes");
    }

    #[test]
    fn test_merge_uses_time_limit_over_first_estimate() {
        let s = settings(4);
        let first = parse_exam_response(TWO_QUESTIONS, &s).unwrap();
        let second = parse_exam_response(TWO_QUESTIONS, &s).unwrap();
        assert_eq!(first.estimated_time, "15 minutes");

        let limited = ExamSettings {
            time_limit_minutes: Some(45),
            ..settings(4)
        };
        let merged = merge_exams(vec![first, second], &limited);
        assert_eq!(merged.questions.len(), 4);
        assert_eq!(merged.estimated_time, "45 minutes");
    }
}
