//! Student entity as stored in the WIS `mahasiswa` table.

use serde::{Deserialize, Serialize};

use super::token::SubjectClaims;

/// Student profile
///
/// `nrm` is the registration number and the stable key; `nim` is the
/// student number and `namam` the full name. The remaining columns are
/// optional in the source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub nrm: String,
    pub nim: String,
    pub namam: String,

    /// Registration date
    #[serde(default)]
    pub tgdaftar: Option<String>,

    /// Place of birth
    #[serde(default)]
    pub tplahir: Option<String>,

    /// Religion code
    #[serde(default)]
    pub kdagama: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,
}

impl Student {
    /// Creates a student with only the identifying fields set
    pub fn new(nrm: impl Into<String>, nim: impl Into<String>, namam: impl Into<String>) -> Self {
        Self {
            nrm: nrm.into(),
            nim: nim.into(),
            namam: namam.into(),
            tgdaftar: None,
            tplahir: None,
            kdagama: None,
            email: None,
            phone: None,
        }
    }

    /// The identity embedded in tokens issued to this student
    pub fn subject(&self) -> SubjectClaims {
        SubjectClaims {
            nrm: self.nrm.clone(),
            nim: self.nim.clone(),
            namam: self.namam.clone(),
        }
    }
}
