use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::{Parameter, ParameterType, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// A continuous parameter with a linear `min..=max` mapping, e.g. a pitch offset in semitones.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatParameter {
    id: FourCC,
    name: &'static str,
    min: f32,
    max: f32,
    default: f32,
    unit: &'static str,
}

impl FloatParameter {
    pub fn new(id: FourCC, name: &'static str, range: RangeInclusive<f32>, default: f32) -> Self {
        let (min, max) = range.into_inner();
        assert!(min < max, "Invalid parameter range");
        assert!((min..=max).contains(&default), "Invalid parameter default value");
        Self {
            id,
            name,
            min,
            max,
            default,
            unit: "",
        }
    }

    /// Unit which gets appended to string displays.
    pub fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    pub fn default_value(&self) -> f32 {
        self.default
    }

    pub fn clamp_value(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn normalize_value(&self, value: f32) -> f32 {
        (self.clamp_value(value) - self.min) / (self.max - self.min)
    }

    pub fn denormalize_value(&self, normalized: f32) -> f32 {
        self.min + normalized.clamp(0.0, 1.0) * (self.max - self.min)
    }

    /// Parse a plain value with an optional unit suffix. Out of range values are clamped.
    fn parse_value(&self, string: &str) -> Option<f32> {
        let value = string
            .trim()
            .trim_end_matches(self.unit)
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|value| !value.is_nan())?;
        Some(self.clamp_value(value))
    }
}

impl Parameter for FloatParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Float {
            range: self.min..=self.max,
            default: self.default,
        }
    }

    fn default_normalized_value(&self) -> f32 {
        self.normalize_value(self.default)
    }

    fn normalized_value_to_string(&self, normalized: f32, include_unit: bool) -> String {
        let value = self.denormalize_value(normalized);
        if include_unit && !self.unit.is_empty() {
            format!("{value:.2} {}", self.unit)
        } else {
            format!("{value:.2}")
        }
    }

    fn string_to_normalized_value(&self, string: String) -> Option<f32> {
        self.parse_value(&string)
            .map(|value| self.normalize_value(value))
    }
}

// -------------------------------------------------------------------------------------------------

/// Current value of a [`FloatParameter`], kept within the parameter's range.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatParameterValue {
    description: FloatParameter,
    value: f32,
}

impl FloatParameterValue {
    pub fn from_description(description: FloatParameter) -> Self {
        let value = description.default_value();
        Self { description, value }
    }

    pub fn description(&self) -> &FloatParameter {
        &self.description
    }

    #[inline(always)]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Set a new value, clamped into the parameter's range. Returns false and keeps the
    /// current value for NaNs.
    pub fn set_value_clamped(&mut self, value: f32) -> bool {
        if value.is_nan() {
            log::warn!(
                "Ignoring NaN value for float parameter '{}'",
                self.description.id()
            );
            return false;
        }
        self.value = self.description.clamp_value(value);
        true
    }

    /// Apply a raw `f32` or normalized value update. Returns false when the update got
    /// rejected, in which case the current value is kept.
    pub fn apply_update(&mut self, update: &ParameterValueUpdate) -> bool {
        match update {
            ParameterValueUpdate::Raw(raw) => match raw.downcast_ref::<f32>() {
                Some(value) => self.set_value_clamped(*value),
                None => {
                    log::warn!(
                        "Invalid value type for float parameter '{}'",
                        self.description.id()
                    );
                    false
                }
            },
            ParameterValueUpdate::Normalized(normalized) => {
                let value = self.description.denormalize_value(*normalized);
                self.set_value_clamped(value)
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_parameter() {
        let parameter = FloatParameter::new(FourCC(*b"test"), "Test", -24.0..=24.0, 0.0)
            .with_unit("st");
        assert_eq!(
            parameter.parameter_type(),
            ParameterType::Float {
                range: -24.0..=24.0,
                default: 0.0
            }
        );
        assert_eq!(parameter.default_normalized_value(), 0.5);
        assert_eq!(parameter.normalize_value(24.0), 1.0);
        assert_eq!(parameter.denormalize_value(0.0), -24.0);
        assert_eq!(parameter.normalized_value_to_string(0.75, true), "12.00 st");
        assert_eq!(parameter.normalized_value_to_string(0.75, false), "12.00");
        assert_eq!(
            parameter.string_to_normalized_value(" 12 st".to_string()),
            Some(0.75)
        );
        assert_eq!(
            parameter.string_to_normalized_value("100".to_string()),
            Some(1.0)
        );
        assert_eq!(parameter.string_to_normalized_value("up".to_string()), None);
        assert_eq!(parameter.string_to_normalized_value("NaN".to_string()), None);

        let mut value = FloatParameterValue::from_description(parameter);
        assert!(value.apply_update(&ParameterValueUpdate::Raw(Box::new(-30.0_f32))));
        assert_eq!(value.value(), -24.0);
        assert!(value.apply_update(&ParameterValueUpdate::Normalized(0.75)));
        assert_eq!(value.value(), 12.0);

        // rejected updates keep the current value
        assert!(!value.apply_update(&ParameterValueUpdate::Raw(Box::new(f32::NAN))));
        assert_eq!(value.value(), 12.0);
        assert!(!value.apply_update(&ParameterValueUpdate::Raw(Box::new("wrong"))));
        assert_eq!(value.value(), 12.0);
        assert!(!value.apply_update(&ParameterValueUpdate::Normalized(f32::NAN)));
        assert_eq!(value.value(), 12.0);
    }
}
