//! Device entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::device::{ConnectionType, DeviceStatus, DeviceType, PowerSource};
use domain::models::GeoPoint;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the devices table.
///
/// Enumerations are stored as text and parsed on conversion; the location
/// column is read back as separate latitude/longitude via ST_Y and ST_X.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceEntity {
    pub id: Uuid,
    pub device_id: String,
    pub name: String,
    pub device_type: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    pub owner_id: Uuid,
    pub field_id: Option<Uuid>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub installation_date: Option<DateTime<Utc>>,
    pub last_maintenance: Option<DateTime<Utc>>,
    pub next_maintenance: Option<DateTime<Utc>>,
    pub battery_level: Option<f64>,
    pub power_source: String,
    pub connection_type: String,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub status: String,
    pub last_connected: Option<DateTime<Utc>>,
    pub configuration: serde_json::Value,
    pub calibration_data: serde_json::Value,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeviceEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> domain::models::Device {
        domain::models::Device {
            id: self.id,
            device_id: self.device_id,
            name: self.name,
            device_type: self.device_type.parse().unwrap_or(DeviceType::Other),
            manufacturer: self.manufacturer,
            model: self.model,
            firmware_version: self.firmware_version,
            owner_id: self.owner_id,
            field_id: self.field_id,
            location: GeoPoint {
                latitude: self.latitude,
                longitude: self.longitude,
                altitude: self.altitude,
                accuracy: self.accuracy,
            },
            installation_date: self.installation_date,
            last_maintenance: self.last_maintenance,
            next_maintenance: self.next_maintenance,
            battery_level: self.battery_level,
            power_source: self.power_source.parse().unwrap_or(PowerSource::Battery),
            connection_type: self.connection_type.parse().unwrap_or(ConnectionType::Other),
            ip_address: self.ip_address,
            mac_address: self.mac_address,
            status: self.status.parse().unwrap_or(DeviceStatus::Error),
            last_connected: self.last_connected,
            configuration: self.configuration,
            calibration_data: self.calibration_data,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<DeviceEntity> for domain::models::Device {
    fn from(entity: DeviceEntity) -> Self {
        entity.into_domain()
    }
}

/// A device row with its distance from a query point.
#[derive(Debug, Clone, FromRow)]
pub struct NearbyDeviceEntity {
    #[sqlx(flatten)]
    pub device: DeviceEntity,
    pub distance_meters: f64,
}

impl From<NearbyDeviceEntity> for domain::models::device::NearbyDevice {
    fn from(entity: NearbyDeviceEntity) -> Self {
        Self {
            device: entity.device.into_domain(),
            distance_meters: entity.distance_meters,
        }
    }
}
