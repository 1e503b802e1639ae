use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Mixed,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "mixed" => Ok(Difficulty::Mixed),
            other => Err(format!("Unknown difficulty: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
}

impl QuestionType {
    /// Name used on the wire and in prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::TrueFalse => "true-false",
            QuestionType::ShortAnswer => "short-answer",
            QuestionType::Essay => "essay",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "Multiple Choice",
            QuestionType::TrueFalse => "True/False",
            QuestionType::ShortAnswer => "Short Answer",
            QuestionType::Essay => "Essay",
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' ', '/'], "-");
        match normalized.as_str() {
            "multiple-choice" | "mcq" | "multiplechoice" => Ok(QuestionType::MultipleChoice),
            "true-false" | "truefalse" | "boolean" => Ok(QuestionType::TrueFalse),
            "short-answer" | "shortanswer" | "short" => Ok(QuestionType::ShortAnswer),
            "essay" | "long-answer" => Ok(QuestionType::Essay),
            other => Err(format!("Unknown question type: {}", other)),
        }
    }
}

/// User-chosen knobs for exam generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSettings {
    pub subject: String,
    pub difficulty: Difficulty,
    pub question_count: usize,
    pub question_types: Vec<QuestionType>,
    pub time_limit_minutes: Option<u32>,
    pub include_explanations: bool,
    pub additional_instructions: Option<String>,
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self {
            subject: "General".to_string(),
            difficulty: Difficulty::Medium,
            question_count: 10,
            question_types: vec![
                QuestionType::MultipleChoice,
                QuestionType::TrueFalse,
                QuestionType::ShortAnswer,
            ],
            time_limit_minutes: None,
            include_explanations: true,
            additional_instructions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExam {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub questions: Vec<ExamQuestion>,
    pub total_points: u32,
    pub estimated_time: String,
}

impl GeneratedExam {
    pub fn recompute_total_points(&mut self) {
        self.total_points = self.questions.iter().map(|q| q.points).sum();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionStep {
    pub step: u32,
    pub description: String,
    pub equation: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathProblem {
    pub id: String,
    pub question: String,
    pub solution: String,
    pub difficulty: String,
    pub topic: String,
    pub steps: Vec<SolutionStep>,
}

impl MathProblem {
    /// Stand-in record for a file that could not be processed
    pub fn placeholder(file_index: usize, file_name: &str, error: &str) -> Self {
        Self::failed(format!("error-{}", file_index + 1), file_name, error)
    }

    /// Stands in for a typed problem that failed while documents were also given
    pub fn typed_placeholder(error: &str) -> Self {
        Self::failed("error-t".to_string(), "the typed problem", error)
    }

    fn failed(id: String, source: &str, error: &str) -> Self {
        Self {
            id,
            question: format!("Could not process {}", source),
            solution: String::new(),
            difficulty: "Unknown".to_string(),
            topic: "Error".to_string(),
            steps: vec![SolutionStep {
                step: 1,
                description: "Processing failed".to_string(),
                equation: String::new(),
                explanation: error.to_string(),
            }],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.topic == "Error" && self.id.starts_with("error-")
    }
}

/// A document handed to the model alongside a prompt
#[derive(Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_text(&self) -> bool {
        self.mime_type.starts_with("text/")
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
