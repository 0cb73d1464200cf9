pub mod access_code;
pub mod attempt;
pub mod daily_assignment;
pub mod question;
pub mod restriction;
