pub mod bars;
pub mod status_indicator;
