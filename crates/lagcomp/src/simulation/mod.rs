mod tick;

pub use tick::TickSchedule;
