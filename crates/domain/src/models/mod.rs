//! Domain models for the Agrimaan backend.

pub mod device;
pub mod edge_device;
pub mod field;
pub mod geo;
pub mod iot_alert;
pub mod maintenance_log;
pub mod reading;
pub mod user;
pub mod weather;

pub use device::Device;
pub use edge_device::EdgeDevice;
pub use field::Field;
pub use geo::GeoPoint;
pub use iot_alert::IotAlert;
pub use maintenance_log::MaintenanceLog;
pub use reading::Reading;
pub use user::User;
pub use weather::{CurrentWeather, HistoricalWeather, WeatherAlert, WeatherForecast};
