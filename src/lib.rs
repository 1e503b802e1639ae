pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod files;
pub mod logger;
pub mod models;
pub mod utils;

// Re-exports for convenience
pub use ai::{
    ExamGenerator, ExamOutcome, ExamRequest, GenerationBackend, MathOutcome, MathRequest,
    MathSolver, create_backend, parse_exam_response, parse_math_response,
    repair_unescaped_unit_quotes, sanitize,
};
pub use config::{AppConfig, Provider};
pub use error::{GenerationError, Result};
pub use files::Attachment;
pub use models::{
    Difficulty, ExamQuestion, ExamSettings, GeneratedExam, MathProblem, QuestionType,
    SolutionStep, UploadedFile,
};
