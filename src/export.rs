use crate::models::{ExamQuestion, GeneratedExam, MathProblem, QuestionType};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Text,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "txt" | "text" => Ok(ExportFormat::Text),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

fn points_label(points: u32) -> String {
    if points == 1 {
        "1 point".to_string()
    } else {
        format!("{} points", points)
    }
}

fn answer_line(question: &ExamQuestion) -> String {
    if question.question_type == QuestionType::MultipleChoice
        && let Some(index) = question
            .options
            .iter()
            .position(|o| o.eq_ignore_ascii_case(question.correct_answer.trim()))
    {
        return format!("{}. {}", option_letter(index), question.options[index]);
    }
    question.correct_answer.clone()
}

pub fn exam_to_markdown(exam: &GeneratedExam, include_answers: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", exam.title);
    if !exam.description.is_empty() {
        let _ = writeln!(out, "{}\n", exam.description);
    }
    let _ = writeln!(
        out,
        "**Total points:** {} | **Estimated time:** {}\n",
        exam.total_points, exam.estimated_time
    );
    let _ = writeln!(out, "_{}_\n", exam.instructions);
    out.push_str("---\n\n");

    for (i, question) in exam.questions.iter().enumerate() {
        let _ = writeln!(
            out,
            "## Question {} ({}, {})\n",
            i + 1,
            question.question_type.label(),
            points_label(question.points)
        );
        let _ = writeln!(out, "{}\n", question.question);

        for (j, option) in question.options.iter().enumerate() {
            let _ = writeln!(out, "- {}. {}", option_letter(j), option);
        }
        if !question.options.is_empty() {
            out.push('\n');
        }
    }

    if include_answers {
        out.push_str("---\n\n# Answer Key\n\n");
        for (i, question) in exam.questions.iter().enumerate() {
            let _ = writeln!(out, "{}. **{}**", i + 1, answer_line(question));
            if let Some(explanation) = &question.explanation {
                let _ = writeln!(out, "   - {}", explanation);
            }
        }
    }

    out
}

pub fn exam_to_text(exam: &GeneratedExam, include_answers: bool) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", exam.title);
    let _ = writeln!(out, "{}", "=".repeat(exam.title.chars().count().max(1)));
    if !exam.description.is_empty() {
        let _ = writeln!(out, "{}", exam.description);
    }
    let _ = writeln!(
        out,
        "Total points: {}    Estimated time: {}",
        exam.total_points, exam.estimated_time
    );
    let _ = writeln!(out, "{}\n", exam.instructions);

    for (i, question) in exam.questions.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} [{}]",
            i + 1,
            question.question,
            points_label(question.points)
        );
        for (j, option) in question.options.iter().enumerate() {
            let _ = writeln!(out, "   {}) {}", option_letter(j), option);
        }
        if matches!(
            question.question_type,
            QuestionType::ShortAnswer | QuestionType::Essay
        ) {
            out.push_str("   Answer: ______________________________\n");
        }
        out.push('\n');
    }

    if include_answers {
        out.push_str("ANSWER KEY\n----------\n");
        for (i, question) in exam.questions.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, answer_line(question));
            if let Some(explanation) = &question.explanation {
                let _ = writeln!(out, "   {}", explanation);
            }
        }
    }

    out
}

pub fn exam_to_format(exam: &GeneratedExam, format: ExportFormat, include_answers: bool) -> String {
    match format {
        ExportFormat::Markdown => exam_to_markdown(exam, include_answers),
        ExportFormat::Text => exam_to_text(exam, include_answers),
    }
}

pub fn math_to_markdown(problems: &[MathProblem]) -> String {
    let mut out = String::from("# Math Solutions\n\n");

    for (i, problem) in problems.iter().enumerate() {
        let _ = writeln!(out, "## Problem {}: {}\n", i + 1, problem.question);
        if problem.is_placeholder() {
            for step in &problem.steps {
                let _ = writeln!(out, "> Error: {}\n", step.explanation);
            }
            continue;
        }

        let _ = writeln!(
            out,
            "*Topic:* {} | *Difficulty:* {}\n",
            problem.topic, problem.difficulty
        );

        for step in &problem.steps {
            let _ = writeln!(out, "{}. **{}**", step.step, step.description);
            if !step.equation.is_empty() {
                let _ = writeln!(out, "   `{}`", step.equation);
            }
            if !step.explanation.is_empty() {
                let _ = writeln!(out, "   {}", step.explanation);
            }
        }
        let _ = writeln!(out, "\n**Solution:** {}\n", problem.solution);
    }

    out
}

pub fn write_export(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}
