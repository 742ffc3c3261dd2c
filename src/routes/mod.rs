pub mod calendar;
pub mod delivery;
