//! Bulk CSV import of books and students
//!
//! Every data row is parsed, validated and inserted on its own. A bad row
//! lands in the [`ImportReport`] with its 1-based row number and the batch
//! carries on. Only an unreadable header aborts the import.
//!
//! Rows are read synchronously between inserts, so callers should hand in
//! a reader over data already in memory rather than a file or socket.

use std::{io::Read, str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use serde::Deserialize;

use super::{catalog::prepare_book, students::prepare_student};
use crate::{
    clock::SharedClock,
    error::{AppError, AppResult},
    models::{Actor, ImportReport, NewBook, NewStudent, StudentStatus},
    repository::CirculationStore,
};

const BOOK_COLUMNS: &[&str] = &["title", "author", "isbn", "quantity"];
const STUDENT_COLUMNS: &[&str] = &["roll_no", "branch"];

#[derive(Debug, Deserialize)]
struct BookRow {
    title: String,
    author: String,
    isbn: String,
    quantity: i32,
    #[serde(default)]
    fine_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StudentRow {
    roll_no: String,
    branch: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Clone)]
pub struct ImportService {
    store: Arc<dyn CirculationStore>,
    clock: SharedClock,
    default_fine_rate: Decimal,
}

impl ImportService {
    pub fn new(store: Arc<dyn CirculationStore>, clock: SharedClock, default_fine_rate: Decimal) -> Self {
        Self {
            store,
            clock,
            default_fine_rate,
        }
    }

    /// Import books (admin only). Columns: title, author, isbn, quantity and
    /// an optional fine_rate falling back to the configured default.
    pub async fn import_books<R: Read + Send>(&self, actor: &Actor, reader: R) -> AppResult<ImportReport> {
        actor.require_admin()?;
        let mut rdr = csv_reader(reader);
        check_columns(&mut rdr, BOOK_COLUMNS)?;

        let mut report = ImportReport::default();
        for (idx, result) in rdr.deserialize::<BookRow>().enumerate() {
            let row = idx + 1;
            let outcome = match result {
                Ok(book_row) => self.import_book(book_row).await,
                Err(e) => Err(AppError::from(e)),
            };
            match outcome {
                Ok(()) => report.imported += 1,
                Err(e) => {
                    tracing::warn!("Book import: row {} skipped: {}", row, e);
                    report.record_failure(row, e.to_string());
                }
            }
        }

        tracing::info!(
            "Book import finished: {} imported, {} failed",
            report.imported,
            report.failures.len()
        );
        Ok(report)
    }

    /// Import students (admin only). Columns: roll_no, branch and optional
    /// name, phone_number and email. Imported accounts are approved.
    pub async fn import_students<R: Read + Send>(&self, actor: &Actor, reader: R) -> AppResult<ImportReport> {
        actor.require_admin()?;
        let mut rdr = csv_reader(reader);
        check_columns(&mut rdr, STUDENT_COLUMNS)?;

        let mut report = ImportReport::default();
        for (idx, result) in rdr.deserialize::<StudentRow>().enumerate() {
            let row = idx + 1;
            let outcome = match result {
                Ok(student_row) => self.import_student(student_row).await,
                Err(e) => Err(AppError::from(e)),
            };
            match outcome {
                Ok(()) => report.imported += 1,
                Err(e) => {
                    tracing::warn!("Student import: row {} skipped: {}", row, e);
                    report.record_failure(row, e.to_string());
                }
            }
        }

        tracing::info!(
            "Student import finished: {} imported, {} failed",
            report.imported,
            report.failures.len()
        );
        Ok(report)
    }

    async fn import_book(&self, row: BookRow) -> AppResult<()> {
        let fine_rate = match row.fine_rate.as_deref().map(str::trim) {
            None | Some("") => self.default_fine_rate,
            Some(raw) => Decimal::from_str(raw)
                .map_err(|e| AppError::Validation(format!("Invalid fine rate '{}': {}", raw, e)))?,
        };
        let book = prepare_book(NewBook {
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            quantity: row.quantity,
            fine_rate,
        })?;
        self.store.insert_book(&book).await?;
        Ok(())
    }

    async fn import_student(&self, row: StudentRow) -> AppResult<()> {
        let student = prepare_student(NewStudent {
            roll_no: row.roll_no,
            branch: row.branch,
            name: row.name,
            phone_number: row.phone_number,
            email: row.email,
        })?;
        self.store
            .insert_student(&student, StudentStatus::Approved, self.clock.now())
            .await?;
        Ok(())
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

fn check_columns<R: Read>(rdr: &mut csv::Reader<R>, required: &[&str]) -> AppResult<()> {
    let headers = rdr.headers()?;
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing CSV column(s): {}",
            missing.join(", ")
        )))
    }
}
