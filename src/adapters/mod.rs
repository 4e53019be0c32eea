//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter      | Implements         | Connects to                   |
//! |--------------|--------------------|-------------------------------|
//! | `log_sink`   | EventSink          | Serial log output             |
//! | `sim_sensor` | ParticulateDriver  | In-process SDS011 simulation  |
//! | `time`       | Clock              | ESP32 system timer / Instant  |

pub mod log_sink;
pub mod sim_sensor;
pub mod time;
