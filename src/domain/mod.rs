// Domain layer - Core data types and pure logic
pub mod alarm;
pub mod device;
pub mod snapshot;
pub mod telemetry;
