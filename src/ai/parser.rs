use crate::ai::sanitize::{repair_unescaped_unit_quotes, sanitize};
use crate::error::{GenerationError, Result};
use crate::logger;
use crate::models::{
    ExamQuestion, ExamSettings, GeneratedExam, MathProblem, QuestionType, SolutionStep,
};
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_INSTRUCTIONS: &str = "Answer all questions. Show your work where applicable.";
pub const DEFAULT_POINTS: u32 = 1;
pub const DEFAULT_MATH_DIFFICULTY: &str = "Medium";
pub const DEFAULT_MATH_TOPIC: &str = "General";
const MINUTES_PER_QUESTION: usize = 2;

// Every field is optional on the wire. Fallbacks are applied in the
// `into_*` conversions below.

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawExam {
    title: Option<Value>,
    description: Option<Value>,
    instructions: Option<Value>,
    questions: Option<Value>,
    #[serde(alias = "total_points")]
    total_points: Option<Value>,
    #[serde(alias = "estimated_time")]
    estimated_time: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawQuestion {
    id: Option<Value>,
    #[serde(rename = "type", alias = "questionType")]
    question_type: Option<Value>,
    question: Option<Value>,
    options: Option<Value>,
    #[serde(alias = "correct_answer", alias = "answer")]
    correct_answer: Option<Value>,
    points: Option<Value>,
    explanation: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProblem {
    id: Option<Value>,
    question: Option<Value>,
    solution: Option<Value>,
    difficulty: Option<Value>,
    topic: Option<Value>,
    steps: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStep {
    step: Option<Value>,
    description: Option<Value>,
    equation: Option<Value>,
    explanation: Option<Value>,
}

/// Strings pass through, numbers and booleans are stringified, anything else is absent.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text(value: &Option<Value>) -> Option<String> {
    value.as_ref().and_then(value_text)
}

fn non_empty_text(value: &Option<Value>) -> Option<String> {
    text(value).filter(|s| !s.is_empty())
}

fn number(value: &Option<Value>) -> Option<u32> {
    match value.as_ref()? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_list(value: &Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(value_text)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn objects(value: &Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.iter().filter(|v| v.is_object()).cloned().collect(),
        _ => Vec::new(),
    }
}

/// Sanitize, then parse. When strict parsing fails the unit-quote repair is
/// tried exactly once before giving up.
pub fn parse_sanitized(raw: &str) -> Result<Value> {
    let sanitized = sanitize(raw);

    let first_error = match serde_json::from_str::<Value>(&sanitized) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let repaired = repair_unescaped_unit_quotes(&sanitized);
    if repaired != sanitized
        && let Ok(value) = serde_json::from_str::<Value>(&repaired)
    {
        logger::log("Parsed AI response after escaping unit quotes");
        return Ok(value);
    }

    Err(malformed(first_error.to_string(), raw, &sanitized))
}

fn malformed(reason: String, raw: &str, sanitized: &str) -> GenerationError {
    logger::log(&format!(
        "Malformed AI response: {}\nRaw: {}\nCleaned: {}",
        reason, raw, sanitized
    ));
    GenerationError::MalformedResponse {
        reason,
        raw: raw.to_string(),
        sanitized: sanitized.to_string(),
    }
}

fn into_question(raw: RawQuestion, index: usize) -> ExamQuestion {
    let mut options = string_list(&raw.options);
    let question_type = text(&raw.question_type)
        .and_then(|t| t.parse::<QuestionType>().ok())
        .unwrap_or(if options.is_empty() {
            QuestionType::ShortAnswer
        } else {
            QuestionType::MultipleChoice
        });

    if question_type == QuestionType::TrueFalse && options.is_empty() {
        options = vec!["True".to_string(), "False".to_string()];
    }

    ExamQuestion {
        id: non_empty_text(&raw.id).unwrap_or_else(|| format!("q{}", index + 1)),
        question_type,
        question: text(&raw.question).unwrap_or_default(),
        options,
        correct_answer: text(&raw.correct_answer).unwrap_or_default(),
        points: number(&raw.points).unwrap_or(DEFAULT_POINTS),
        explanation: non_empty_text(&raw.explanation),
    }
}

fn estimated_time(value: &Option<Value>, settings: &ExamSettings, question_count: usize) -> String {
    match value {
        Some(Value::Number(n)) => return format!("{} minutes", n),
        Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_string(),
        _ => {}
    }

    default_estimated_time(settings, question_count)
}

/// The time limit when one is set, otherwise two minutes per question
pub(crate) fn default_estimated_time(settings: &ExamSettings, question_count: usize) -> String {
    match settings.time_limit_minutes {
        Some(limit) => format!("{} minutes", limit),
        None => format!("{} minutes", question_count * MINUTES_PER_QUESTION),
    }
}

fn into_exam(raw: RawExam, settings: &ExamSettings) -> GeneratedExam {
    let questions: Vec<ExamQuestion> = objects(&raw.questions)
        .into_iter()
        .filter_map(|v| serde_json::from_value::<RawQuestion>(v).ok())
        .enumerate()
        .map(|(i, q)| into_question(q, i))
        .filter(|q| !q.question.is_empty())
        .collect();

    let summed: u32 = questions.iter().map(|q| q.points).sum();

    GeneratedExam {
        title: non_empty_text(&raw.title)
            .unwrap_or_else(|| format!("{} Practice Exam", settings.subject)),
        description: text(&raw.description).unwrap_or_default(),
        instructions: non_empty_text(&raw.instructions)
            .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
        total_points: number(&raw.total_points).unwrap_or(summed),
        estimated_time: estimated_time(&raw.estimated_time, settings, questions.len()),
        questions,
    }
}

/// Turn a raw model answer into an exam.
///
/// A bare array is accepted as the question list. Question entries that are
/// not objects or have no question text are dropped.
pub fn parse_exam_response(raw: &str, settings: &ExamSettings) -> Result<GeneratedExam> {
    let value = parse_sanitized(raw)?;

    let raw_exam = match value {
        Value::Object(_) => serde_json::from_value::<RawExam>(value)
            .map_err(|e| malformed(e.to_string(), raw, &sanitize(raw)))?,
        Value::Array(_) => RawExam {
            questions: Some(value),
            ..RawExam::default()
        },
        _ => {
            return Err(malformed(
                "expected a JSON object with exam questions".to_string(),
                raw,
                &sanitize(raw),
            ));
        }
    };

    let exam = into_exam(raw_exam, settings);
    if exam.questions.is_empty() {
        return Err(malformed(
            "the response contained no questions".to_string(),
            raw,
            &sanitize(raw),
        ));
    }

    Ok(exam)
}

fn into_step(raw: RawStep, index: usize) -> SolutionStep {
    SolutionStep {
        step: number(&raw.step).unwrap_or(index as u32 + 1),
        description: text(&raw.description).unwrap_or_default(),
        equation: text(&raw.equation).unwrap_or_default(),
        explanation: text(&raw.explanation).unwrap_or_default(),
    }
}

fn into_problem(raw: RawProblem, index: usize) -> MathProblem {
    let steps = objects(&raw.steps)
        .into_iter()
        .filter_map(|v| serde_json::from_value::<RawStep>(v).ok())
        .enumerate()
        .map(|(i, s)| into_step(s, i))
        .collect();

    MathProblem {
        id: non_empty_text(&raw.id).unwrap_or_else(|| format!("problem-{}", index + 1)),
        question: text(&raw.question).unwrap_or_default(),
        solution: text(&raw.solution).unwrap_or_default(),
        difficulty: non_empty_text(&raw.difficulty)
            .unwrap_or_else(|| DEFAULT_MATH_DIFFICULTY.to_string()),
        topic: non_empty_text(&raw.topic).unwrap_or_else(|| DEFAULT_MATH_TOPIC.to_string()),
        steps,
    }
}

/// Turn a raw model answer into math problems.
///
/// Accepts a top-level array, an object wrapping a `problems` array, or a
/// single problem object.
pub fn parse_math_response(raw: &str) -> Result<Vec<MathProblem>> {
    let value = parse_sanitized(raw)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("problems") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                map.insert("problems".to_string(), other);
                vec![Value::Object(map)]
            }
            None => vec![Value::Object(map)],
        },
        _ => {
            return Err(malformed(
                "expected a JSON array of problems".to_string(),
                raw,
                &sanitize(raw),
            ));
        }
    };

    let problems = items
        .into_iter()
        .filter(|v| v.is_object())
        .filter_map(|v| serde_json::from_value::<RawProblem>(v).ok())
        .enumerate()
        .map(|(i, p)| into_problem(p, i))
        .collect();

    Ok(problems)
}
