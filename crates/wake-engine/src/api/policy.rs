use serde::{Deserialize, Serialize};

use crate::api::error::MovementError;

/// How invalid input is treated.
///
/// `Strict` fails fast with a [`MovementError`]. `Lenient` coerces numeric
/// input to a safe value (or skips the frame for missing references) and
/// logs a warning. There is no global toggle: every strategy and manager is
/// handed its policy at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    Strict,
    Lenient,
}

impl Default for Policy {
    /// Fail fast in debug builds, degrade gracefully in release builds.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Policy::Strict
        } else {
            Policy::Lenient
        }
    }
}

impl Policy {
    pub fn is_strict(self) -> bool {
        self == Policy::Strict
    }

    /// Validate a quantity that must be `>= 0`.
    /// Lenient: negative → `abs`, non-finite → `0`.
    pub fn non_negative(self, field: &'static str, value: f32) -> Result<f32, MovementError> {
        if !value.is_finite() {
            return self.recover(MovementError::NonFinite { field, value }, 0.0);
        }
        if value < 0.0 {
            return self.recover(MovementError::NegativeValue { field, value }, value.abs());
        }
        Ok(value)
    }

    /// Validate a quantity that may be signed but must be finite.
    pub fn finite(self, field: &'static str, value: f32) -> Result<f32, MovementError> {
        if value.is_finite() {
            Ok(value)
        } else {
            self.recover(MovementError::NonFinite { field, value }, 0.0)
        }
    }

    /// Validate a `[min, max]` pair; lenient mode swaps an inverted range.
    pub fn range(self, field: &'static str, min: f32, max: f32) -> Result<(f32, f32), MovementError> {
        let min = self.non_negative(field, min)?;
        let max = self.non_negative(field, max)?;
        if min > max {
            return self.recover(MovementError::InvalidRange { field, min, max }, (max, min));
        }
        Ok((min, max))
    }

    pub fn delta_time(self, dt: f32) -> Result<f32, MovementError> {
        self.non_negative("delta_time", dt)
    }

    /// Strict: return `err`. Lenient: log it and continue with `fallback`.
    pub fn recover<T>(self, err: MovementError, fallback: T) -> Result<T, MovementError> {
        match self {
            Policy::Strict => Err(err),
            Policy::Lenient => {
                log::warn!("{err}; continuing leniently");
                Ok(fallback)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_takes_absolute_value() {
        assert_eq!(Policy::Lenient.non_negative("speed", -4.5), Ok(4.5));
        assert_eq!(Policy::Lenient.non_negative("speed", f32::NAN), Ok(0.0));
    }

    #[test]
    fn strict_rejects_negative() {
        let err = Policy::Strict.non_negative("speed", -1.0).unwrap_err();
        assert_eq!(err, MovementError::NegativeValue { field: "speed", value: -1.0 });
        assert!(Policy::Strict.finite("angle", f32::INFINITY).is_err());
    }

    #[test]
    fn inverted_range() {
        assert_eq!(Policy::Lenient.range("duration", 3.0, 1.0), Ok((1.0, 3.0)));
        assert!(Policy::Strict.range("duration", 3.0, 1.0).is_err());
        assert_eq!(Policy::Strict.range("duration", 1.0, 1.0), Ok((1.0, 1.0)));
    }

    #[test]
    fn deserializes_snake_case() {
        let p: Policy = serde_json::from_str("\"lenient\"").unwrap();
        assert_eq!(p, Policy::Lenient);
    }
}
