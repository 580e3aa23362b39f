//! Adapters - concrete implementations of ports (traits)

mod engine;


pub use engine::HsmEngine;
