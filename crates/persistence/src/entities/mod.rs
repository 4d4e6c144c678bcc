//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod device;
pub mod edge_device;
pub mod field;
pub mod iot_alert;
pub mod maintenance_log;
pub mod reading;
pub mod user;
pub mod weather;

pub use device::{DeviceEntity, NearbyDeviceEntity};
pub use edge_device::EdgeDeviceEntity;
pub use field::FieldEntity;
pub use iot_alert::IotAlertEntity;
pub use maintenance_log::MaintenanceLogEntity;
pub use reading::ReadingEntity;
pub use user::UserEntity;
pub use weather::{
    CurrentWeatherEntity, HistoricalWeatherEntity, WeatherAlertEntity, WeatherForecastEntity,
};
