pub mod student;

pub use student::{normalize_name, InMemoryStudentRepository, StudentRepository};
