mod delivery;

pub use delivery::DeliveryEstimate;
