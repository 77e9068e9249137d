//! MySQL implementation of the StudentRepository trait.
//!
//! Students live in the `mahasiswa` table of the WIS database. Lookups go
//! through the connection manager; rows come back as JSON objects and are
//! mapped onto the `Student` entity here.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use wh_core::domain::entities::student::Student;
use wh_core::errors::DomainError;
use wh_core::repositories::{normalize_name, StudentRepository};
use wh_shared::DatabaseName;

use crate::database::manager::ConnectionManager;
use crate::database::pool::{QueryRow, SqlParam};

const STUDENT_COLUMNS: &str =
    "SELECT nrm, nim, namam, tgdaftar, tplahir, kdagama, telpasal as phone FROM mahasiswa";

const BY_NIM: &str = "WHERE nim = ? AND nrm = ?";
const BY_NAME: &str = "WHERE LOWER(namam) = LOWER(?) AND nrm = ?";
const BY_COMPACT_NAME: &str = "WHERE LOWER(REPLACE(namam, ' ', '')) = LOWER(?) AND nrm = ?";
const BY_NRM: &str = "WHERE nrm = ?";

/// MySQL implementation of StudentRepository on the WIS database
pub struct MySqlStudentRepository {
    manager: Arc<ConnectionManager>,
}

impl MySqlStudentRepository {
    /// Create a new MySQL student repository
    ///
    /// # Arguments
    /// * `manager` - Shared connection manager owning the WIS pool
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    async fn find_one(
        &self,
        filter: &str,
        params: &[SqlParam],
    ) -> Result<Option<Student>, DomainError> {
        let sql = format!("{} {} LIMIT 1", STUDENT_COLUMNS, filter);
        let rows = self.manager.execute(DatabaseName::Wis, &sql, params).await?;
        rows.first().map(row_to_student).transpose()
    }
}

/// Convert a result row to a Student entity
fn row_to_student(row: &QueryRow) -> Result<Student, DomainError> {
    let required = |column: &str| {
        text(row, column).ok_or_else(|| DomainError::Internal {
            message: format!("Failed to get {}: column missing or null", column),
        })
    };

    Ok(Student {
        nrm: required("nrm")?,
        nim: required("nim")?,
        namam: required("namam")?,
        tgdaftar: text(row, "tgdaftar"),
        tplahir: text(row, "tplahir"),
        kdagama: text(row, "kdagama"),
        email: text(row, "email"),
        phone: text(row, "phone"),
    })
}

fn text(row: &QueryRow, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl StudentRepository for MySqlStudentRepository {
    async fn find_by_credentials(
        &self,
        namam_nim: &str,
        nrm: &str,
    ) -> Result<Option<Student>, DomainError> {
        let attempts = [
            (BY_NIM, namam_nim.to_string()),
            (BY_NAME, namam_nim.to_string()),
            (BY_COMPACT_NAME, normalize_name(namam_nim)),
        ];

        for (filter, identity) in attempts {
            let params = [SqlParam::Text(identity), SqlParam::from(nrm)];
            if let Some(student) = self.find_one(filter, &params).await? {
                return Ok(Some(student));
            }
        }

        Ok(None)
    }

    async fn find_by_nrm(&self, nrm: &str) -> Result<Option<Student>, DomainError> {
        self.find_one(BY_NRM, &[SqlParam::from(nrm)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> QueryRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_row_to_student() {
        let student = row_to_student(&row(&[
            ("nrm", Value::from("2021-001")),
            ("nim", Value::from("1234567890")),
            ("namam", Value::from("Siti Aminah")),
            ("tgdaftar", Value::from("2021-08-30")),
            ("tplahir", Value::Null),
            ("kdagama", Value::from(1)),
            ("phone", Value::from("08123456789")),
        ]))
        .unwrap();

        assert_eq!(student.nrm, "2021-001");
        assert_eq!(student.tgdaftar.as_deref(), Some("2021-08-30"));
        assert_eq!(student.tplahir, None);
        assert_eq!(student.kdagama.as_deref(), Some("1"));
        assert_eq!(student.email, None);
        assert_eq!(student.phone.as_deref(), Some("08123456789"));
    }

    #[test]
    fn test_row_without_identity_is_rejected() {
        let result = row_to_student(&row(&[("nrm", Value::from("2021-001"))]));
        assert!(matches!(result, Err(DomainError::Internal { .. })));
    }
}
