//! Edge gateway entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::edge_device::{
    DeployedModel, EdgeConnectionType, EdgeDeviceStatus, EdgeDeviceType, ProcessingCapabilities,
};
use domain::models::GeoPoint;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the edge_devices table.
///
/// `connected_devices` is aggregated from edge_device_connections in the
/// select list rather than stored on the row.
#[derive(Debug, Clone, FromRow)]
pub struct EdgeDeviceEntity {
    pub id: Uuid,
    pub device_id: String,
    pub name: String,
    pub device_type: String,
    pub owner_id: Uuid,
    pub field_id: Option<Uuid>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub connected_devices: Vec<Uuid>,
    pub processing_capabilities: Json<ProcessingCapabilities>,
    pub operating_system: Option<String>,
    pub firmware_version: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub connection_type: String,
    pub status: String,
    pub last_connected: Option<DateTime<Utc>>,
    pub deployed_models: Json<Vec<DeployedModel>>,
    pub configuration: serde_json::Value,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EdgeDeviceEntity> for domain::models::EdgeDevice {
    fn from(entity: EdgeDeviceEntity) -> Self {
        let location = match (entity.latitude, entity.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
                altitude: entity.altitude,
                accuracy: entity.accuracy,
            }),
            _ => None,
        };

        Self {
            id: entity.id,
            device_id: entity.device_id,
            name: entity.name,
            device_type: entity.device_type.parse().unwrap_or(EdgeDeviceType::Other),
            owner_id: entity.owner_id,
            field_id: entity.field_id,
            location,
            connected_devices: entity.connected_devices,
            processing_capabilities: entity.processing_capabilities.0,
            operating_system: entity.operating_system,
            firmware_version: entity.firmware_version,
            ip_address: entity.ip_address,
            mac_address: entity.mac_address,
            connection_type: entity
                .connection_type
                .parse()
                .unwrap_or(EdgeConnectionType::Other),
            status: entity.status.parse().unwrap_or(EdgeDeviceStatus::Error),
            last_connected: entity.last_connected,
            deployed_models: entity.deployed_models.0,
            configuration: entity.configuration,
            metadata: entity.metadata,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
