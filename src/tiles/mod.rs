pub mod fetch;
pub mod math;
