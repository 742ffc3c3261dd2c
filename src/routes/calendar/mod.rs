mod handler;
mod ics;

pub use handler::{CalendarQuery, delivery_calendar};
pub use ics::{DeliveryIcon, parse_swedish_date, render_calendar};
