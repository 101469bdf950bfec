pub mod dashboard;
pub mod forecast;
pub mod insights;
pub mod report;
