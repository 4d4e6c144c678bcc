//! IoT device domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::geo::GeoPoint;

string_enum! {
    /// Kind of sensor or actuator.
    pub enum DeviceType: "device type" {
        SoilMoistureSensor => "soil_moisture_sensor",
        TemperatureSensor => "temperature_sensor",
        HumiditySensor => "humidity_sensor",
        RainfallSensor => "rainfall_sensor",
        LightSensor => "light_sensor",
        WindSensor => "wind_sensor",
        SoilNutrientSensor => "soil_nutrient_sensor",
        WaterLevelSensor => "water_level_sensor",
        Camera => "camera",
        Drone => "drone",
        WeatherStation => "weather_station",
        IrrigationController => "irrigation_controller",
        Other => "other",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum PowerSource: "power source" {
        #[default]
        Battery => "battery",
        Solar => "solar",
        Wired => "wired",
        Hybrid => "hybrid",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum ConnectionType: "connection type" {
        #[default]
        Wifi => "wifi",
        Cellular => "cellular",
        Lora => "lora",
        Bluetooth => "bluetooth",
        Zigbee => "zigbee",
        Satellite => "satellite",
        Other => "other",
    }
}

string_enum! {
    /// Lifecycle status of a device.
    #[derive(Default)]
    pub enum DeviceStatus: "device status" {
        #[default]
        Active => "active",
        Inactive => "inactive",
        Maintenance => "maintenance",
        Error => "error",
        Offline => "offline",
    }
}

lazy_static::lazy_static! {
    /// Hardware identifiers: alphanumeric start, then alphanumerics and `._:-`.
    pub static ref DEVICE_ID_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._:-]*$").unwrap();

    pub static ref MAC_ADDRESS_REGEX: regex::Regex =
        regex::Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}$").unwrap();
}

/// A registered IoT device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: Uuid,
    pub device_id: String,
    pub name: String,
    pub device_type: DeviceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    pub owner_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<Uuid>,
    pub location: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_maintenance: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_maintenance: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,
    pub power_source: PowerSource,
    pub connection_type: ConnectionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    pub status: DeviceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_connected: Option<DateTime<Utc>>,
    pub configuration: serde_json::Value,
    pub calibration_data: serde_json::Value,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// Owner or admin may read and modify the device.
    pub fn is_accessible_by(&self, user_id: Uuid, is_admin: bool) -> bool {
        is_admin || self.owner_id == user_id
    }
}

/// Request payload for registering a device.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceRequest {
    #[validate(length(min = 1, max = 100, message = "Device ID must be 1-100 characters"))]
    #[validate(regex(path = "*DEVICE_ID_REGEX", message = "Device ID contains invalid characters"))]
    pub device_id: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub device_type: DeviceType,

    #[validate(length(max = 100, message = "Manufacturer must be at most 100 characters"))]
    pub manufacturer: Option<String>,

    #[validate(length(max = 100, message = "Model must be at most 100 characters"))]
    pub model: Option<String>,

    #[validate(length(max = 50, message = "Firmware version must be at most 50 characters"))]
    pub firmware_version: Option<String>,

    pub field_id: Option<Uuid>,

    #[validate(nested)]
    pub location: GeoPoint,

    pub installation_date: Option<DateTime<Utc>>,

    pub next_maintenance: Option<DateTime<Utc>>,

    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_level: Option<f64>,

    #[serde(default)]
    pub power_source: PowerSource,

    #[serde(default)]
    pub connection_type: ConnectionType,

    #[validate(ip(message = "Invalid IP address"))]
    pub ip_address: Option<String>,

    #[validate(regex(path = "*MAC_ADDRESS_REGEX", message = "Invalid MAC address"))]
    pub mac_address: Option<String>,

    #[serde(default)]
    pub status: DeviceStatus,

    pub configuration: Option<serde_json::Value>,

    pub calibration_data: Option<serde_json::Value>,

    pub metadata: Option<serde_json::Value>,
}

/// Request payload for updating a device (partial update).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 100, message = "Manufacturer must be at most 100 characters"))]
    pub manufacturer: Option<String>,

    #[validate(length(max = 100, message = "Model must be at most 100 characters"))]
    pub model: Option<String>,

    #[validate(length(max = 50, message = "Firmware version must be at most 50 characters"))]
    pub firmware_version: Option<String>,

    pub field_id: Option<Uuid>,

    #[validate(nested)]
    pub location: Option<GeoPoint>,

    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_level: Option<f64>,

    pub power_source: Option<PowerSource>,

    pub connection_type: Option<ConnectionType>,

    #[validate(ip(message = "Invalid IP address"))]
    pub ip_address: Option<String>,

    #[validate(regex(path = "*MAC_ADDRESS_REGEX", message = "Invalid MAC address"))]
    pub mac_address: Option<String>,

    pub installation_date: Option<DateTime<Utc>>,

    pub next_maintenance: Option<DateTime<Utc>>,

    pub configuration: Option<serde_json::Value>,

    pub calibration_data: Option<serde_json::Value>,

    pub metadata: Option<serde_json::Value>,
}

/// Request payload for the status-only update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeviceStatusRequest {
    pub status: DeviceStatus,
}

/// Query parameters for listing devices.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDevicesQuery {
    pub field_id: Option<Uuid>,
    pub device_type: Option<DeviceType>,
    pub status: Option<DeviceStatus>,
}

/// Query parameters for the radius search.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NearbyDevicesQuery {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(range(
        min = 1.0,
        max = 100000.0,
        message = "Radius must be between 1 and 100000 meters"
    ))]
    pub radius_meters: f64,
}

/// A device together with its distance from the query point.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyDevice {
    #[serde(flatten)]
    pub device: Device,
    pub distance_meters: f64,
}

/// Response for listing devices.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDevicesResponse {
    pub devices: Vec<Device>,
    pub total: usize,
}
