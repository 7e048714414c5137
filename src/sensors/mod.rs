//! Sensor drivers.
//!
//! Each driver implements [`SensorPort`](crate::app::ports::SensorPort) and
//! is generic over the `embedded-hal` bus traits, so it can be exercised
//! on the host against register mocks.

pub mod tsl2591;
