pub mod calendar;
pub mod schedule;
pub mod worker;

pub use calendar::DateClass;
pub use schedule::Schedule;
pub use worker::{DateRange, Worker};
