pub mod bbox;
pub mod position;
pub mod projection;
