pub mod mapper;
pub mod pacer;
pub mod pipeline;
