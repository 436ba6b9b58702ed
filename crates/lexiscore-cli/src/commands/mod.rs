pub mod analyze;
pub mod followup;
pub mod grade;
pub mod init;
pub mod validate_bank;
