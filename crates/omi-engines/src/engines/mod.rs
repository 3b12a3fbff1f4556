mod linear_reservoir;

pub use linear_reservoir::{LinearReservoirEngine, LinearReservoirParameters};

use omi_core::EngineRegistry;

/// Register every engine in this crate under its canonical identifier.
pub fn register_engines(registry: &mut EngineRegistry) {
    registry.register(linear_reservoir::ENGINE_ID, |_args| {
        Ok(Box::new(LinearReservoirEngine::new()) as Box<dyn omi_core::Engine>)
    });
}
