pub mod code;
pub mod content;
pub mod daily;
pub mod submission;
