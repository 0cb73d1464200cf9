pub mod code;
pub mod grade;
pub mod question;
pub mod scoring;
pub mod submission;
