pub mod aggregator;
pub mod config;
pub mod emitter;
pub mod fanout;
pub mod landmark;
pub mod osc;
pub mod pose;
pub mod receiver;
pub mod sender;
