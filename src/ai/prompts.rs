use crate::models::{ExamSettings, QuestionType};

const EXAM_SHAPE: &str = r#"{
    "title": "short exam title",
    "description": "one or two sentences on what the exam covers",
    "instructions": "instructions for the student",
    "questions": [
        {
            "id": "q1",
            "type": "multiple-choice | true-false | short-answer | essay",
            "question": "question text",
            "options": ["option A", "option B", "option C", "option D"],
            "correctAnswer": "the correct answer",
            "points": integer,
            "explanation": "why the answer is correct"
        }
    ],
    "totalPoints": integer,
    "estimatedTime": "e.g. 30 minutes"
}"#;

const MATH_SHAPE: &str = r#"[
    {
        "id": "problem-1",
        "question": "the problem statement exactly as written",
        "solution": "the final answer",
        "difficulty": "Easy | Medium | Hard",
        "topic": "e.g. Algebra",
        "steps": [
            {
                "step": 1,
                "description": "what this step does",
                "equation": "the math for this step",
                "explanation": "why this step works"
            }
        ]
    }
]"#;

fn question_types_line(types: &[QuestionType]) -> String {
    if types.is_empty() {
        return "any mix of question types".to_string();
    }
    types
        .iter()
        .map(|t| format!("{} ({})", t.label(), t.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prompt asking for a complete exam as JSON.
///
/// `source_name` is set when a document is attached to the same request.
pub fn build_exam_prompt(
    settings: &ExamSettings,
    question_count: usize,
    description: Option<&str>,
    source_name: Option<&str>,
) -> String {
    let mut prompt = format!(
        "Create a practice exam and respond ONLY with valid JSON.\n\n\
Subject: {}\n\
Difficulty: {}\n\
Number of questions: {}\n\
Question types: {}\n",
        settings.subject,
        settings.difficulty,
        question_count,
        question_types_line(&settings.question_types),
    );

    if let Some(limit) = settings.time_limit_minutes {
        prompt.push_str(&format!("Time limit: {} minutes\n", limit));
    }

    if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
        prompt.push_str(&format!("\nWhat the exam should cover:\n{}\n", description));
    }

    if let Some(name) = source_name {
        prompt.push_str(&format!(
            "\nBase the questions on the attached document \"{}\". Match its topics, \
notation and level.\n",
            name
        ));
    }

    if let Some(extra) = settings
        .additional_instructions
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
    {
        prompt.push_str(&format!("\nAdditional instructions: {}\n", extra));
    }

    prompt.push_str(&format!(
        "\nIMPORTANT:\n\n\
- Respond ONLY with this exact JSON structure (no markdown, no extra text):\n{}\n\
- Multiple-choice questions must have exactly 4 options and correctAnswer must match one of them.\n\
- True/false questions use the options [\"True\", \"False\"].\n\
- Short-answer and essay questions use an empty options list.\n\
- Escape any double quote inside a string value, including inch or degree marks after numbers.\n",
        EXAM_SHAPE
    ));

    if settings.include_explanations {
        prompt.push_str("- Every question must include an explanation.\n");
    } else {
        prompt.push_str("- Leave explanation empty.\n");
    }

    prompt
}

/// Prompt asking the model to pull every math problem out of a document
/// (or the given text) and solve each one step by step.
pub fn build_math_prompt(problem_text: Option<&str>) -> String {
    let source = match problem_text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => format!("Solve the following math problem(s):\n{}\n", text),
        None => "Extract every math problem from the attached document and solve each one.\n"
            .to_string(),
    };

    format!(
        "{}\n\
IMPORTANT:\n\n\
- Respond ONLY with a JSON array in this exact structure (no markdown, no extra text):\n{}\n\
- Show every intermediate step; number steps from 1.\n\
- Write equations in plain text or LaTeX without surrounding dollar signs.\n\
- Escape any double quote inside a string value, including inch or degree marks after numbers.\n",
        source, MATH_SHAPE
    )
}
