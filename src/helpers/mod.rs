pub mod converters;
pub mod formatting;
pub mod health_factor;
