use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use learnsphere::ai::{ExamGenerator, ExamRequest, MathRequest, MathSolver, create_backend};
use learnsphere::config::{AppConfig, Provider};
use learnsphere::db;
use learnsphere::error::GenerationError;
use learnsphere::export::{ExportFormat, exam_to_format, math_to_markdown, write_export};
use learnsphere::files::Attachment;
use learnsphere::logger;
use learnsphere::models::{Difficulty, ExamSettings, QuestionType};
use learnsphere::utils::{format_created_date, truncate_string};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "learnsphere",
    version,
    about = "Generate practice exams and step-by-step math solutions with an LLM"
)]
struct Cli {
    /// Model provider: gemini, openrouter or proxy
    #[arg(long, global = true)]
    provider: Option<Provider>,

    #[arg(long, global = true)]
    model: Option<String>,

    /// Base URL of the document backend used by the proxy provider
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Do not store results in the history database
    #[arg(long, global = true)]
    no_save: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a practice exam from a description and/or documents
    Exam(ExamArgs),
    /// Solve math problems typed in or found in documents
    Math(MathArgs),
    /// Browse previously generated results
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Args)]
struct ExamArgs {
    #[arg(short, long)]
    description: Option<String>,

    #[arg(short, long = "file")]
    files: Vec<PathBuf>,

    #[arg(long, default_value = "General")]
    subject: String,

    #[arg(long, default_value = "medium")]
    difficulty: Difficulty,

    #[arg(long, default_value_t = 10)]
    count: usize,

    /// Comma-separated: multiple-choice,true-false,short-answer,essay
    #[arg(long, value_delimiter = ',')]
    types: Vec<QuestionType>,

    /// Time limit in minutes
    #[arg(long)]
    time: Option<u32>,

    #[arg(long)]
    no_explanations: bool,

    #[arg(long)]
    instructions: Option<String>,

    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Append the answer key
    #[arg(long)]
    answers: bool,

    #[arg(long, default_value = "md")]
    format: ExportFormat,
}

#[derive(Args)]
struct MathArgs {
    #[arg(short, long)]
    problem: Option<String>,

    #[arg(short, long = "file")]
    files: Vec<PathBuf>,

    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List saved exams
    Exams,
    /// List saved math solution sets
    Math,
    ShowExam {
        id: u64,
        #[arg(long)]
        answers: bool,
        #[arg(long, default_value = "md")]
        format: ExportFormat,
    },
    ShowMath {
        id: u64,
    },
    DeleteExam {
        id: u64,
    },
    DeleteMath {
        id: u64,
    },
}

fn report_failure(error: &GenerationError) -> ! {
    eprintln!("{}", error);
    if error.is_retryable() {
        eprintln!("Run the same command again to retry.");
    }
    std::process::exit(1);
}

fn emit(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            write_export(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Saved to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

async fn run_exam(config: &AppConfig, args: ExamArgs, save: bool) -> anyhow::Result<()> {
    let defaults = ExamSettings::default();
    let settings = ExamSettings {
        subject: args.subject,
        difficulty: args.difficulty,
        question_count: args.count,
        question_types: if args.types.is_empty() {
            defaults.question_types
        } else {
            args.types
        },
        time_limit_minutes: args.time,
        include_explanations: !args.no_explanations,
        additional_instructions: args.instructions,
    };

    let backend = create_backend(config)?;
    let generator = ExamGenerator::new(backend);
    let request = ExamRequest {
        settings: settings.clone(),
        description: args.description,
        attachments: args.files.into_iter().map(Attachment::from).collect(),
    };

    let outcome = match generator.generate(request).await {
        Ok(outcome) => outcome,
        Err(e) => report_failure(&e),
    };

    for failure in &outcome.failures {
        eprintln!("Skipped {}: {}", failure.file, failure.message);
    }

    emit(
        args.output.as_deref(),
        &exam_to_format(&outcome.exam, args.format, args.answers),
    )?;

    if save {
        let conn = db::init_db(&config.db_path)?;
        let id = db::exam::save_exam(&conn, &settings.subject, &outcome.exam)?;
        eprintln!("Saved as exam #{}", id);
    }

    Ok(())
}

async fn run_math(config: &AppConfig, args: MathArgs, save: bool) -> anyhow::Result<()> {
    let label = if args.files.is_empty() {
        args.problem
            .as_deref()
            .map(|p| truncate_string(p.trim(), 60))
            .unwrap_or_default()
    } else {
        args.files
            .iter()
            .map(|f| Attachment::from(f.clone()).name())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let backend = create_backend(config)?;
    let solver = MathSolver::new(backend);
    let request = MathRequest {
        problem_text: args.problem,
        attachments: args.files.into_iter().map(Attachment::from).collect(),
    };

    let outcome = match solver.solve(request).await {
        Ok(outcome) => outcome,
        Err(e) => report_failure(&e),
    };

    if outcome.failed_files > 0 {
        eprintln!("{} input(s) could not be processed", outcome.failed_files);
    }

    emit(args.output.as_deref(), &math_to_markdown(&outcome.problems))?;

    if save {
        let conn = db::init_db(&config.db_path)?;
        let id = db::math::save_math_set(&conn, &label, &outcome.problems, outcome.failed_files)?;
        eprintln!("Saved as math set #{}", id);
    }

    Ok(())
}

fn run_history(config: &AppConfig, action: HistoryAction) -> anyhow::Result<()> {
    let conn = db::init_db(&config.db_path)?;

    match action {
        HistoryAction::Exams => {
            let exams = db::exam::list_exams(&conn)?;
            if exams.is_empty() {
                println!("No saved exams");
            }
            for exam in exams {
                println!(
                    "#{:<4} {:<16} {:<40} {:>3} questions  {}",
                    exam.id,
                    format_created_date(exam.created_at),
                    truncate_string(&exam.title, 40),
                    exam.question_count,
                    exam.subject
                );
            }
        }
        HistoryAction::Math => {
            let sets = db::math::list_math_sets(&conn)?;
            if sets.is_empty() {
                println!("No saved math sets");
            }
            for set in sets {
                println!(
                    "#{:<4} {:<16} {:<40} {:>3} problems  {} failed",
                    set.id,
                    format_created_date(set.created_at),
                    truncate_string(&set.label, 40),
                    set.problem_count,
                    set.failed_files
                );
            }
        }
        HistoryAction::ShowExam {
            id,
            answers,
            format,
        } => {
            let Some(stored) = db::exam::get_exam(&conn, id)? else {
                bail!("No exam with id {}", id);
            };
            let Some(exam) = stored.exam else {
                bail!("Exam #{} could not be read back", id);
            };
            println!("{}", exam_to_format(&exam, format, answers));
        }
        HistoryAction::ShowMath { id } => {
            let Some(stored) = db::math::get_math_set(&conn, id)? else {
                bail!("No math set with id {}", id);
            };
            let Some(problems) = stored.problems else {
                bail!("Math set #{} could not be read back", id);
            };
            println!("{}", math_to_markdown(&problems));
        }
        HistoryAction::DeleteExam { id } => {
            if !db::exam::delete_exam(&conn, id)? {
                bail!("No exam with id {}", id);
            }
            println!("Deleted exam #{}", id);
        }
        HistoryAction::DeleteMath { id } => {
            if !db::math::delete_math_set(&conn, id)? {
                bail!("No math set with id {}", id);
            }
            println!("Deleted math set #{}", id);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(provider) = cli.provider {
        config.provider = provider;
    }
    if let Some(model) = cli.model {
        config.model = Some(model);
    }
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    logger::init(&config.log_path);
    logger::log(&format!("Starting with {:?}", config));

    let save = !cli.no_save;
    match cli.command {
        Command::Exam(args) => run_exam(&config, args, save).await,
        Command::Math(args) => run_math(&config, args, save).await,
        Command::History { action } => run_history(&config, action),
    }
}
