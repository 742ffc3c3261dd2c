mod form;
mod handler;

pub use form::DeliveryForm;
pub use handler::lookup_delivery;
