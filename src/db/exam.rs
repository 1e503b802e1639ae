use crate::db::now;
use crate::models::GeneratedExam;
use rusqlite::{Connection, OptionalExtension, Result};

#[derive(Debug, Clone)]
pub struct ExamSummary {
    pub id: u64,
    pub title: String,
    pub subject: String,
    pub question_count: usize,
    pub created_at: u64,
}

#[derive(Debug, Clone)]
pub struct StoredExam {
    pub summary: ExamSummary,
    /// `None` when the stored payload no longer deserializes
    pub exam: Option<GeneratedExam>,
}

pub fn save_exam(conn: &Connection, subject: &str, exam: &GeneratedExam) -> Result<u64> {
    let payload = serde_json::to_string(exam)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO exams (title, subject, question_count, payload, created_at)
         VALUES (?, ?, ?, ?, ?)",
        rusqlite::params![exam.title, subject, exam.questions.len(), payload, now()],
    )?;

    Ok(conn.last_insert_rowid() as u64)
}

pub fn list_exams(conn: &Connection) -> Result<Vec<ExamSummary>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, subject, question_count, created_at
         FROM exams ORDER BY created_at DESC, id DESC",
    )?;

    let exams = stmt
        .query_map([], |row| {
            Ok(ExamSummary {
                id: row.get(0)?,
                title: row.get(1)?,
                subject: row.get(2)?,
                question_count: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();

    Ok(exams)
}

pub fn get_exam(conn: &Connection, id: u64) -> Result<Option<StoredExam>> {
    conn.query_row(
        "SELECT id, title, subject, question_count, created_at, payload
         FROM exams WHERE id = ?",
        [id],
        |row| {
            let payload: String = row.get(5)?;
            Ok(StoredExam {
                summary: ExamSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    subject: row.get(2)?,
                    question_count: row.get(3)?,
                    created_at: row.get(4)?,
                },
                exam: serde_json::from_str(&payload).ok(),
            })
        },
    )
    .optional()
}

/// Returns whether a row was removed
pub fn delete_exam(conn: &Connection, id: u64) -> Result<bool> {
    let removed = conn.execute("DELETE FROM exams WHERE id = ?", [id])?;
    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_test_db;
    use crate::models::{ExamQuestion, QuestionType};

    fn sample_exam(title: &str) -> GeneratedExam {
        GeneratedExam {
            title: title.to_string(),
            description: "Sample".to_string(),
            instructions: "Answer all".to_string(),
            questions: vec![ExamQuestion {
                id: "q1".to_string(),
                question_type: QuestionType::MultipleChoice,
                question: "Which is prime?".to_string(),
                options: vec!["4".to_string(), "7".to_string()],
                correct_answer: "7".to_string(),
                points: 2,
                explanation: Some("7 has no divisors besides 1 and itself".to_string()),
            }],
            total_points: 2,
            estimated_time: "5 minutes".to_string(),
        }
    }

    #[test]
    fn test_save_and_get_exam() {
        let conn = open_test_db();
        let exam = sample_exam("Number theory");

        let id = save_exam(&conn, "Math", &exam).unwrap();
        assert_eq!(id, 1);

        let stored = get_exam(&conn, id).unwrap().unwrap();
        assert_eq!(stored.summary.title, "Number theory");
        assert_eq!(stored.summary.subject, "Math");
        assert_eq!(stored.summary.question_count, 1);
        assert_eq!(stored.exam, Some(exam));
    }

    #[test]
    fn test_get_nonexistent_exam() {
        let conn = open_test_db();
        assert!(get_exam(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let conn = open_test_db();
        save_exam(&conn, "History", &sample_exam("First")).unwrap();
        save_exam(&conn, "History", &sample_exam("Second")).unwrap();

        let exams = list_exams(&conn).unwrap();
        assert_eq!(exams.len(), 2);
        assert_eq!(exams[0].title, "Second");
        assert_eq!(exams[1].title, "First");
    }

    #[test]
    fn test_corrupt_payload_loads_as_none() {
        let conn = open_test_db();
        conn.execute(
            "INSERT INTO exams (title, subject, question_count, payload, created_at)
             VALUES ('Broken', 'X', 0, 'not json', 0)",
            [],
        )
        .unwrap();

        let stored = get_exam(&conn, 1).unwrap().unwrap();
        assert_eq!(stored.summary.title, "Broken");
        assert!(stored.exam.is_none());
    }

    #[test]
    fn test_delete_exam() {
        let conn = open_test_db();
        let id = save_exam(&conn, "Math", &sample_exam("Gone")).unwrap();

        assert!(delete_exam(&conn, id).unwrap());
        assert!(!delete_exam(&conn, id).unwrap());
        assert!(get_exam(&conn, id).unwrap().is_none());
    }
}
