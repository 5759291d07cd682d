pub mod quantize_service;

pub use quantize_service::{BatchOutcome, InspectReport, QuantizeReport, QuantizeService};
