//! Edge gateway domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::device::{DEVICE_ID_REGEX, MAC_ADDRESS_REGEX};
use super::geo::GeoPoint;

string_enum! {
    pub enum EdgeDeviceType: "edge device type" {
        Gateway => "gateway",
        EdgeServer => "edge_server",
        FogNode => "fog_node",
        Other => "other",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum EdgeConnectionType: "edge connection type" {
        #[default]
        Ethernet => "ethernet",
        Wifi => "wifi",
        Cellular => "cellular",
        Satellite => "satellite",
        Other => "other",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum EdgeDeviceStatus: "edge device status" {
        #[default]
        Active => "active",
        Inactive => "inactive",
        Maintenance => "maintenance",
        Error => "error",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

/// A model artifact running on the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeployedModel {
    #[validate(length(min = 1, max = 100, message = "Model name must be 1-100 characters"))]
    pub model_name: String,
    #[validate(length(min = 1, max = 50, message = "Model version must be 1-50 characters"))]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// A gateway or aggregator fronting a set of devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDevice {
    pub id: Uuid,
    pub device_id: String,
    pub name: String,
    pub device_type: EdgeDeviceType,
    pub owner_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub connected_devices: Vec<Uuid>,
    pub processing_capabilities: ProcessingCapabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    pub connection_type: EdgeConnectionType,
    pub status: EdgeDeviceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_connected: Option<DateTime<Utc>>,
    pub deployed_models: Vec<DeployedModel>,
    pub configuration: serde_json::Value,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EdgeDevice {
    pub fn is_accessible_by(&self, user_id: Uuid, is_admin: bool) -> bool {
        is_admin || self.owner_id == user_id
    }
}

/// Request payload for registering a gateway.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEdgeDeviceRequest {
    #[validate(length(min = 1, max = 100, message = "Device ID must be 1-100 characters"))]
    #[validate(regex(path = "*DEVICE_ID_REGEX", message = "Device ID contains invalid characters"))]
    pub device_id: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub device_type: EdgeDeviceType,

    pub field_id: Option<Uuid>,

    #[validate(nested)]
    pub location: Option<GeoPoint>,

    #[serde(default)]
    pub processing_capabilities: ProcessingCapabilities,

    #[validate(length(max = 100, message = "Operating system must be at most 100 characters"))]
    pub operating_system: Option<String>,

    #[validate(length(max = 50, message = "Firmware version must be at most 50 characters"))]
    pub firmware_version: Option<String>,

    #[validate(ip(message = "Invalid IP address"))]
    pub ip_address: Option<String>,

    #[validate(regex(path = "*MAC_ADDRESS_REGEX", message = "Invalid MAC address"))]
    pub mac_address: Option<String>,

    #[serde(default)]
    pub connection_type: EdgeConnectionType,

    #[serde(default)]
    pub status: EdgeDeviceStatus,

    #[serde(default)]
    #[validate(nested)]
    pub deployed_models: Vec<DeployedModel>,

    pub configuration: Option<serde_json::Value>,

    pub metadata: Option<serde_json::Value>,
}

/// Request payload for updating a gateway (partial update).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEdgeDeviceRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    pub field_id: Option<Uuid>,

    #[validate(nested)]
    pub location: Option<GeoPoint>,

    pub processing_capabilities: Option<ProcessingCapabilities>,

    #[validate(length(max = 100, message = "Operating system must be at most 100 characters"))]
    pub operating_system: Option<String>,

    #[validate(length(max = 50, message = "Firmware version must be at most 50 characters"))]
    pub firmware_version: Option<String>,

    #[validate(ip(message = "Invalid IP address"))]
    pub ip_address: Option<String>,

    #[validate(regex(path = "*MAC_ADDRESS_REGEX", message = "Invalid MAC address"))]
    pub mac_address: Option<String>,

    pub connection_type: Option<EdgeConnectionType>,

    pub status: Option<EdgeDeviceStatus>,

    pub last_connected: Option<DateTime<Utc>>,

    /// Replaces the whole list when present; entries are checked with
    /// [`UpdateEdgeDeviceRequest::validate_models`].
    pub deployed_models: Option<Vec<DeployedModel>>,

    pub configuration: Option<serde_json::Value>,

    pub metadata: Option<serde_json::Value>,
}

impl UpdateEdgeDeviceRequest {
    pub fn validate_models(&self) -> Result<(), validator::ValidationErrors> {
        for model in self.deployed_models.iter().flatten() {
            model.validate()?;
        }
        Ok(())
    }
}

/// Replaces the set of devices fronted by a gateway.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetConnectedDevicesRequest {
    #[validate(length(max = 500, message = "A gateway can front at most 500 devices"))]
    pub device_ids: Vec<Uuid>,
}

/// Response for listing gateways.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEdgeDevicesResponse {
    pub edge_devices: Vec<EdgeDevice>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let json = r#"{"deviceId": "GW-01", "name": "Barn gateway", "deviceType": "gateway"}"#;
        let req: CreateEdgeDeviceRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.connection_type, EdgeConnectionType::Ethernet);
        assert_eq!(req.status, EdgeDeviceStatus::Active);
        assert_eq!(req.processing_capabilities, ProcessingCapabilities::default());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_deployed_model_validated() {
        let json = r#"{
            "deviceId": "GW-02", "name": "Fog", "deviceType": "fog_node",
            "deployedModels": [{"modelName": "", "version": "1.0", "lastUpdated": "2024-03-01T00:00:00Z"}]
        }"#;
        let req: CreateEdgeDeviceRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_validates_models() {
        let req = UpdateEdgeDeviceRequest {
            deployed_models: Some(vec![DeployedModel {
                model_name: "pest-detector".into(),
                version: String::new(),
                purpose: None,
                last_updated: Utc::now(),
            }]),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        assert!(req.validate_models().is_err());
    }

    #[test]
    fn test_edge_types_do_not_accept_sensor_types() {
        assert!("soil_moisture_sensor".parse::<EdgeDeviceType>().is_err());
        assert_eq!(
            "edge_server".parse::<EdgeDeviceType>().unwrap(),
            EdgeDeviceType::EdgeServer
        );
    }

    #[test]
    fn test_set_connected_devices() {
        let json = r#"{"deviceIds": ["550e8400-e29b-41d4-a716-446655440000"]}"#;
        let req: SetConnectedDevicesRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.device_ids.len(), 1);
        assert!(req.validate().is_ok());
    }
}
