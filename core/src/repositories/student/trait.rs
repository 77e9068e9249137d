//! Student repository trait defining the lookup interface for student records.
//!
//! Students authenticate with their NRM plus either their NIM or their full
//! name. Implementations live in the infrastructure layer; the domain only
//! depends on this trait.

use async_trait::async_trait;

use crate::domain::entities::student::Student;
use crate::errors::DomainError;

/// Repository trait for Student lookups
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Find a student by NIM or name, always constrained by NRM
    ///
    /// Matching is tried in order, first hit wins:
    /// 1. `nim` equals `namam_nim`
    /// 2. `namam` equals `namam_nim`, ignoring case
    /// 3. `namam` equals `namam_nim` ignoring case and all whitespace
    ///
    /// # Returns
    /// * `Ok(Some(Student))` - Student found
    /// * `Ok(None)` - No student matches
    /// * `Err(DomainError)` - Database or other error occurred
    async fn find_by_credentials(
        &self,
        namam_nim: &str,
        nrm: &str,
    ) -> Result<Option<Student>, DomainError>;

    /// Load the profile for a registration number
    async fn find_by_nrm(&self, nrm: &str) -> Result<Option<Student>, DomainError>;
}

/// Lower-cased name with every whitespace character removed
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
