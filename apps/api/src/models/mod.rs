pub mod coaching;
pub mod insights;
pub mod resume;
pub mod user;
