//! Repository implementations for database operations.

pub mod device;
pub mod edge_device;
pub mod field;
pub mod iot_alert;
pub mod maintenance_log;
pub mod reading;
pub mod user;
pub mod weather;

pub use device::{DeviceFilter, DeviceRepository};
pub use edge_device::EdgeDeviceRepository;
pub use field::FieldRepository;
pub use iot_alert::{AlertFilter, IotAlertRepository};
pub use maintenance_log::{MaintenanceFilter, MaintenanceLogRepository};
pub use reading::{ReadingQuery, ReadingRepository};
pub use user::{NewUser, UserRepository};
pub use weather::WeatherRepository;
