pub mod datetime;

pub use datetime::{parse_date, Date, DateTime, DateTimeNano};
