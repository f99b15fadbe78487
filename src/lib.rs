pub mod batch;
pub mod bond;
pub mod coin;
pub mod curve;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod msgs;
pub mod state;
