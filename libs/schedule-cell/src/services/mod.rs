pub mod availability;
pub mod schedule;

pub use schedule::ScheduleService;
