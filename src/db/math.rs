use crate::db::now;
use crate::models::MathProblem;
use rusqlite::{Connection, OptionalExtension, Result};

#[derive(Debug, Clone)]
pub struct MathSetSummary {
    pub id: u64,
    pub label: String,
    pub problem_count: usize,
    pub failed_files: usize,
    pub created_at: u64,
}

#[derive(Debug, Clone)]
pub struct StoredMathSet {
    pub summary: MathSetSummary,
    pub problems: Option<Vec<MathProblem>>,
}

pub fn save_math_set(
    conn: &Connection,
    label: &str,
    problems: &[MathProblem],
    failed_files: usize,
) -> Result<u64> {
    let payload = serde_json::to_string(problems)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO math_sets (label, problem_count, failed_files, payload, created_at)
         VALUES (?, ?, ?, ?, ?)",
        rusqlite::params![label, problems.len(), failed_files, payload, now()],
    )?;

    Ok(conn.last_insert_rowid() as u64)
}

pub fn list_math_sets(conn: &Connection) -> Result<Vec<MathSetSummary>> {
    let mut stmt = conn.prepare(
        "SELECT id, label, problem_count, failed_files, created_at
         FROM math_sets ORDER BY created_at DESC, id DESC",
    )?;

    let sets = stmt
        .query_map([], |row| {
            Ok(MathSetSummary {
                id: row.get(0)?,
                label: row.get(1)?,
                problem_count: row.get(2)?,
                failed_files: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .filter_map(|r| r.ok())
        .collect();

    Ok(sets)
}

pub fn get_math_set(conn: &Connection, id: u64) -> Result<Option<StoredMathSet>> {
    conn.query_row(
        "SELECT id, label, problem_count, failed_files, created_at, payload
         FROM math_sets WHERE id = ?",
        [id],
        |row| {
            let payload: String = row.get(5)?;
            Ok(StoredMathSet {
                summary: MathSetSummary {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    problem_count: row.get(2)?,
                    failed_files: row.get(3)?,
                    created_at: row.get(4)?,
                },
                problems: serde_json::from_str(&payload).ok(),
            })
        },
    )
    .optional()
}

pub fn delete_math_set(conn: &Connection, id: u64) -> Result<bool> {
    let removed = conn.execute("DELETE FROM math_sets WHERE id = ?", [id])?;
    Ok(removed > 0)
}
