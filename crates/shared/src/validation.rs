//! Common validation utilities.
//!
//! Each function matches the `validator` custom-function shape so it can be
//! referenced from `#[validate(custom(function = "..."))]` attributes.

use validator::ValidationError;

fn range_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(range_error(
            "latitude_range",
            "Latitude must be between -90 and 90",
        ))
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(range_error(
            "longitude_range",
            "Longitude must be between -180 and 180",
        ))
    }
}

/// Validates that positional accuracy is non-negative.
pub fn validate_accuracy(accuracy: f64) -> Result<(), ValidationError> {
    if accuracy >= 0.0 {
        Ok(())
    } else {
        Err(range_error(
            "accuracy_range",
            "Accuracy must be non-negative",
        ))
    }
}

/// Validates a percentage (0 to 100). Used for battery, humidity, cloud cover.
pub fn validate_percentage(value: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(range_error(
            "percentage_range",
            "Value must be between 0 and 100",
        ))
    }
}

/// Validates that battery level is within valid range (0 to 100).
pub fn validate_battery_level(level: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&level) {
        Ok(())
    } else {
        Err(range_error(
            "battery_range",
            "Battery level must be between 0 and 100",
        ))
    }
}

/// Validates a compass direction in degrees (0 to 360).
pub fn validate_direction(degrees: f64) -> Result<(), ValidationError> {
    if (0.0..=360.0).contains(&degrees) {
        Ok(())
    } else {
        Err(range_error(
            "direction_range",
            "Direction must be between 0 and 360 degrees",
        ))
    }
}

/// Validates that a measured quantity is non-negative and finite.
pub fn validate_non_negative(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(range_error("non_negative", "Value must be non-negative"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(28.6139).is_ok());
        assert!(validate_latitude(90.0001).is_err());
        assert!(validate_latitude(-91.0).is_err());
    }

    #[test]
    fn test_validate_latitude_error_message() {
        let err = validate_latitude(100.0).unwrap_err();
        assert_eq!(err.code, "latitude_range");
        assert_eq!(
            err.message.unwrap().to_string(),
            "Latitude must be between -90 and 90"
        );
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(77.209).is_ok());
        assert!(validate_longitude(180.5).is_err());
        assert!(validate_longitude(-200.0).is_err());
    }

    #[test]
    fn test_validate_accuracy() {
        assert!(validate_accuracy(0.0).is_ok());
        assert!(validate_accuracy(15.5).is_ok());
        assert!(validate_accuracy(-0.1).is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage(0.0).is_ok());
        assert!(validate_percentage(55.5).is_ok());
        assert!(validate_percentage(100.0).is_ok());
        assert!(validate_percentage(100.1).is_err());
        assert!(validate_percentage(-1.0).is_err());
    }

    #[test]
    fn test_validate_battery_level() {
        assert!(validate_battery_level(0.0).is_ok());
        assert!(validate_battery_level(100.0).is_ok());
        let err = validate_battery_level(101.0).unwrap_err();
        assert_eq!(err.code, "battery_range");
    }

    #[test]
    fn test_validate_direction() {
        assert!(validate_direction(0.0).is_ok());
        assert!(validate_direction(270.0).is_ok());
        assert!(validate_direction(360.0).is_ok());
        assert!(validate_direction(361.0).is_err());
        assert!(validate_direction(-10.0).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative(0.0).is_ok());
        assert!(validate_non_negative(12.4).is_ok());
        assert!(validate_non_negative(-0.5).is_err());
        assert!(validate_non_negative(f64::NAN).is_err());
        assert!(validate_non_negative(f64::INFINITY).is_err());
    }
}
