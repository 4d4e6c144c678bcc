//! Device maintenance history. Entries are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::pagination::PageInfo;
use uuid::Uuid;
use validator::Validate;

use super::device::DeviceStatus;

string_enum! {
    pub enum MaintenanceType: "maintenance type" {
        Routine => "routine",
        Repair => "repair",
        Calibration => "calibration",
        BatteryReplacement => "battery_replacement",
        FirmwareUpdate => "firmware_update",
        Other => "other",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceAction {
    #[validate(length(min = 1, max = 500, message = "Action must be 1-500 characters"))]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReplacedPart {
    #[validate(length(min = 1, max = 200, message = "Part must be 1-200 characters"))]
    pub part: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceCost {
    #[validate(custom(function = "shared::validation::validate_non_negative"))]
    pub amount: f64,
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[validate(length(min = 1, max = 200, message = "Attachment name must be 1-200 characters"))]
    pub name: String,
    #[validate(url(message = "Attachment fileUrl must be a valid URL"))]
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

/// One service visit on a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceLog {
    pub id: Uuid,
    pub device_id: Uuid,
    pub maintenance_type: MaintenanceType,
    pub performed_by: Uuid,
    pub performed_at: DateTime<Utc>,
    pub description: String,
    pub actions: Vec<MaintenanceAction>,
    pub parts_replaced: Vec<ReplacedPart>,
    pub before_status: DeviceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_status: Option<DeviceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_maintenance_due: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<MaintenanceCost>,
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request payload for recording maintenance. The device comes from the path
/// and the performer from the authenticated user.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaintenanceLogRequest {
    pub maintenance_type: MaintenanceType,

    pub performed_at: Option<DateTime<Utc>>,

    #[validate(length(min = 1, max = 2000, message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    #[validate(nested)]
    pub actions: Vec<MaintenanceAction>,

    #[serde(default)]
    #[validate(nested)]
    pub parts_replaced: Vec<ReplacedPart>,

    /// Defaults to the device's current status.
    pub before_status: Option<DeviceStatus>,

    /// When present the device is moved to this status.
    pub after_status: Option<DeviceStatus>,

    pub next_maintenance_due: Option<DateTime<Utc>>,

    #[validate(nested)]
    pub cost: Option<MaintenanceCost>,

    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<Attachment>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

/// Query parameters for a device's maintenance history.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMaintenanceQuery {
    pub maintenance_type: Option<MaintenanceType>,
    pub performed_by: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Response for maintenance history, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMaintenanceResponse {
    pub logs: Vec<MaintenanceLog>,
    pub pagination: PageInfo,
}
