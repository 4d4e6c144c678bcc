//! IoT alert domain model and its status workflow.
//!
//! Alerts are recorded by callers (devices, integrations or people); nothing
//! in this service evaluates thresholds. Once recorded an alert moves
//! `active → acknowledged → resolved`, may be resolved straight from
//! `active`, or may be dismissed `active → false_alarm`. Resolved and
//! false-alarm alerts are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::pagination::PageInfo;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

string_enum! {
    pub enum AlertType: "alert type" {
        LowBattery => "low_battery",
        DeviceOffline => "device_offline",
        SensorMalfunction => "sensor_malfunction",
        CalibrationNeeded => "calibration_needed",
        ThresholdExceeded => "threshold_exceeded",
        ThresholdBelow => "threshold_below",
        ConnectionLost => "connection_lost",
        FirmwareUpdate => "firmware_update",
        SecurityAlert => "security_alert",
        Other => "other",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum AlertSeverity: "severity" {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

string_enum! {
    #[derive(Default)]
    pub enum AlertStatus: "alert status" {
        #[default]
        Active => "active",
        Acknowledged => "acknowledged",
        Resolved => "resolved",
        FalseAlarm => "false_alarm",
    }
}

string_enum! {
    pub enum NotificationChannel: "notification channel" {
        Email => "email",
        Sms => "sms",
        Push => "push",
        InApp => "in_app",
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertTransitionError {
    #[error("Alert is already acknowledged")]
    AlreadyAcknowledged,

    #[error("Alert is already resolved")]
    AlreadyResolved,

    #[error("Alert is marked as a false alarm")]
    FalseAlarm,

    #[error("Alert cannot move from {from} to {to}")]
    NotAllowed { from: AlertStatus, to: AlertStatus },
}

impl AlertStatus {
    /// States from which `target` may be entered.
    pub fn sources_for(target: AlertStatus) -> &'static [AlertStatus] {
        match target {
            AlertStatus::Active => &[],
            AlertStatus::Acknowledged => &[AlertStatus::Active],
            AlertStatus::Resolved => &[AlertStatus::Active, AlertStatus::Acknowledged],
            AlertStatus::FalseAlarm => &[AlertStatus::Active],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertStatus::Resolved | AlertStatus::FalseAlarm)
    }

    /// Checks a transition, explaining why it is refused.
    pub fn check_transition(&self, target: AlertStatus) -> Result<(), AlertTransitionError> {
        if AlertStatus::sources_for(target).contains(self) {
            return Ok(());
        }
        Err(match (self, target) {
            (AlertStatus::Resolved, _) => AlertTransitionError::AlreadyResolved,
            (AlertStatus::FalseAlarm, _) => AlertTransitionError::FalseAlarm,
            (AlertStatus::Acknowledged, AlertStatus::Acknowledged) => {
                AlertTransitionError::AlreadyAcknowledged
            }
            (from, to) => AlertTransitionError::NotAllowed { from: *from, to },
        })
    }
}

/// A recorded alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IotAlert {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_id: Option<Uuid>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<serde_json::Value>,
    pub status: AlertStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
    pub notification_sent: bool,
    pub notification_channels: Vec<NotificationChannel>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for recording an alert.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub device_id: Option<Uuid>,

    pub field_id: Option<Uuid>,

    pub crop_id: Option<Uuid>,

    pub alert_type: AlertType,

    #[serde(default)]
    pub severity: AlertSeverity,

    #[validate(length(min = 1, max = 1000, message = "Message must be 1-1000 characters"))]
    pub message: String,

    pub timestamp: Option<DateTime<Utc>>,

    pub value: Option<serde_json::Value>,

    pub threshold: Option<serde_json::Value>,

    #[serde(default)]
    pub notification_channels: Vec<NotificationChannel>,

    pub metadata: Option<serde_json::Value>,
}

/// Request payload for resolving an alert.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveAlertRequest {
    #[validate(length(min = 1, max = 2000, message = "Resolution notes are required"))]
    pub resolution_notes: String,
}

/// Query parameters for listing alerts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAlertsQuery {
    pub device_id: Option<Uuid>,
    pub field_id: Option<Uuid>,
    pub alert_type: Option<AlertType>,
    pub severity: Option<AlertSeverity>,
    pub status: Option<AlertStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Response for listing alerts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAlertsResponse {
    pub alerts: Vec<IotAlert>,
    pub pagination: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledge_only_from_active() {
        assert!(AlertStatus::Active
            .check_transition(AlertStatus::Acknowledged)
            .is_ok());
        assert_eq!(
            AlertStatus::Acknowledged.check_transition(AlertStatus::Acknowledged),
            Err(AlertTransitionError::AlreadyAcknowledged)
        );
        assert_eq!(
            AlertStatus::Resolved.check_transition(AlertStatus::Acknowledged),
            Err(AlertTransitionError::AlreadyResolved)
        );
    }

    #[test]
    fn test_resolve_from_active_or_acknowledged() {
        assert!(AlertStatus::Active
            .check_transition(AlertStatus::Resolved)
            .is_ok());
        assert!(AlertStatus::Acknowledged
            .check_transition(AlertStatus::Resolved)
            .is_ok());
        assert_eq!(
            AlertStatus::Resolved.check_transition(AlertStatus::Resolved),
            Err(AlertTransitionError::AlreadyResolved)
        );
        assert_eq!(
            AlertStatus::FalseAlarm.check_transition(AlertStatus::Resolved),
            Err(AlertTransitionError::FalseAlarm)
        );
    }

    #[test]
    fn test_false_alarm_only_from_active() {
        assert!(AlertStatus::Active
            .check_transition(AlertStatus::FalseAlarm)
            .is_ok());
        assert_eq!(
            AlertStatus::Acknowledged.check_transition(AlertStatus::FalseAlarm),
            Err(AlertTransitionError::NotAllowed {
                from: AlertStatus::Acknowledged,
                to: AlertStatus::FalseAlarm
            })
        );
    }

    #[test]
    fn test_nothing_returns_to_active() {
        for status in AlertStatus::ALL {
            assert!(status.check_transition(AlertStatus::Active).is_err());
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(AlertStatus::Resolved.is_terminal());
        assert!(AlertStatus::FalseAlarm.is_terminal());
        assert!(!AlertStatus::Acknowledged.is_terminal());
    }

    #[test]
    fn test_create_request_defaults() {
        let json = r#"{
            "deviceId": "550e8400-e29b-41d4-a716-446655440000",
            "alertType": "low_battery",
            "message": "Battery at 8%"
        }"#;
        let req: CreateAlertRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.severity, AlertSeverity::Medium);
        assert!(req.notification_channels.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_request_requires_message() {
        let json = r#"{"alertType": "other", "message": ""}"#;
        let req: CreateAlertRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_resolve_request_requires_notes() {
        let req = ResolveAlertRequest {
            resolution_notes: String::new(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("resolution_notes"));
    }

    #[test]
    fn test_channels_wire_names() {
        let json = serde_json::to_string(&vec![NotificationChannel::InApp]).unwrap();
        assert_eq!(json, r#"["in_app"]"#);
    }
}
