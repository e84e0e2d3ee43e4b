pub mod dry_run;
pub mod errors;
pub mod listing;
pub mod report_only;
