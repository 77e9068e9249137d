//! In-memory student repository for tests and local development

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::domain::entities::student::Student;
use crate::errors::DomainError;

use super::trait_::{normalize_name, StudentRepository};

/// Student repository backed by a vector
#[derive(Clone, Default)]
pub struct InMemoryStudentRepository {
    students: Arc<RwLock<Vec<Student>>>,
}

impl InMemoryStudentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_students(students: Vec<Student>) -> Self {
        Self {
            students: Arc::new(RwLock::new(students)),
        }
    }

    pub fn insert(&self, student: Student) {
        if let Ok(mut students) = self.students.write() {
            students.push(student);
        }
    }

    /// Remove a student, as if the account had been deactivated
    pub fn remove(&self, nrm: &str) -> bool {
        match self.students.write() {
            Ok(mut students) => {
                let before = students.len();
                students.retain(|s| s.nrm != nrm);
                students.len() != before
            }
            Err(_) => false,
        }
    }

    fn snapshot(&self) -> Result<Vec<Student>, DomainError> {
        self.students
            .read()
            .map(|students| students.clone())
            .map_err(|_| DomainError::Internal {
                message: "student store lock poisoned".to_string(),
            })
    }
}

#[async_trait]
impl StudentRepository for InMemoryStudentRepository {
    async fn find_by_credentials(
        &self,
        namam_nim: &str,
        nrm: &str,
    ) -> Result<Option<Student>, DomainError> {
        let students = self.snapshot()?;
        let same_nrm = || students.iter().filter(|s| s.nrm == nrm);

        let by_nim = same_nrm().find(|s| s.nim == namam_nim);
        let by_name = || same_nrm().find(|s| s.namam.to_lowercase() == namam_nim.to_lowercase());
        let by_compact_name =
            || same_nrm().find(|s| normalize_name(&s.namam) == normalize_name(namam_nim));

        Ok(by_nim.or_else(by_name).or_else(by_compact_name).cloned())
    }

    async fn find_by_nrm(&self, nrm: &str) -> Result<Option<Student>, DomainError> {
        Ok(self.snapshot()?.into_iter().find(|s| s.nrm == nrm))
    }
}
