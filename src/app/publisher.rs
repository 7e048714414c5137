//! State publisher: sensor reading → Light attribute, once per main cycle.

use log::debug;

use super::ports::{EventSink, ScannerPort, SensorPort, SettingsPort};
use super::server::AttributeServer;

/// Text published when the sensor has nothing usable to report.
pub const NO_READING: &str = "-- lux";

/// Format a sensor result for the Light attribute.
///
/// Non-positive and non-finite readings mean "no signal" and are shown the
/// same way as a sensor error.
pub fn format_reading<E>(reading: Result<f32, E>) -> String {
    match reading {
        Ok(lux) if lux.is_finite() && lux > 0.0 => format!("{lux:.2} lux"),
        _ => NO_READING.to_string(),
    }
}

pub struct StatePublisher<S: SensorPort> {
    sensor: S,
}

impl<S: SensorPort> StatePublisher<S> {
    pub fn new(sensor: S) -> Self {
        Self { sensor }
    }

    /// Read the sensor and format the result.  Does not touch the server,
    /// so the caller can sample without holding the server lock.
    pub fn sample(&mut self) -> String {
        let reading = self.sensor.read_lux();
        if let Err(e) = &reading {
            debug!("Publisher: sensor read failed: {}", e);
        }
        format_reading(reading)
    }

    /// Sample and push to the Light attribute with a notification.
    pub fn publish<P, W, E>(&mut self, server: &mut AttributeServer<P, W, E>)
    where
        P: SettingsPort,
        W: ScannerPort,
        E: EventSink,
    {
        let text = self.sample();
        server.publish_light(&text);
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}
