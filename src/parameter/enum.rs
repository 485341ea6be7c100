use std::{fmt::Debug, str::FromStr};

use four_cc::FourCC;
use strum::IntoEnumIterator;

use super::{Parameter, ParameterType, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// An enum parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumParameter {
    id: FourCC,
    name: &'static str,
    values: Vec<String>,
    default_index: usize,
}

impl EnumParameter {
    pub fn new<E: IntoEnumIterator + ToString + PartialEq>(
        id: FourCC,
        name: &'static str,
        default: E,
    ) -> Self {
        let values = E::iter().map(|v| v.to_string()).collect::<Vec<_>>();
        let default_index = E::iter().position(|r| r == default).unwrap_or(0);
        Self {
            id,
            name,
            values,
            default_index,
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn default_value(&self) -> &String {
        &self.values[self.default_index]
    }

    pub fn normalize_value(&self, value: &str) -> f32 {
        if self.values.len() < 2 {
            return 0.0;
        }
        if let Some(index) = self.values.iter().position(|v| v == value) {
            return index as f32 / (self.values.len() - 1) as f32;
        }
        0.0
    }

    pub fn denormalize_value(&self, normalized: f32) -> &String {
        assert!((0.0..=1.0).contains(&normalized));
        let index = (normalized * (self.values.len() - 1) as f32).round() as usize;
        &self.values[index]
    }

    /// Create a raw parameter value update, which can be passed to an effect.
    pub fn value_update<E: Send + Sync + 'static>(
        &self,
        value: E,
    ) -> (FourCC, ParameterValueUpdate) {
        (self.id, ParameterValueUpdate::Raw(Box::new(value)))
    }
}

impl Parameter for EnumParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Enum {
            values: self.values.clone(),
            default_index: self.default_index,
        }
    }

    fn default_normalized_value(&self) -> f32 {
        self.normalize_value(self.default_value())
    }

    fn normalized_value_to_string(&self, normalized: f32, _include_unit: bool) -> String {
        self.denormalize_value(normalized.clamp(0.0, 1.0)).clone()
    }

    fn string_to_normalized_value(&self, string: String) -> Option<f32> {
        let string = string.trim();
        if self.values.iter().any(|v| v == string) {
            Some(self.normalize_value(string))
        } else {
            None
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Holds an enum parameter value and its description.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumParameterValue<T: Sized + Clone> {
    /// The current value of the parameter.
    value: T,
    /// The parameter's description and constraints.
    description: EnumParameter,
}

impl<T: Sized + FromStr + Clone + 'static> EnumParameterValue<T>
where
    <T as FromStr>::Err: Debug,
{
    pub fn from_description(description: EnumParameter) -> Self {
        let value = T::from_str(description.default_value())
            .expect("Enum parameter default must be a valid enum value");
        Self { value, description }
    }

    #[inline(always)]
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn set_value(&mut self, value: T) {
        self.value = value;
    }

    pub fn description(&self) -> &EnumParameter {
        &self.description
    }

    /// Apply a raw `T`, raw `String` or normalized value update. Returns false when the update
    /// got rejected, in which case the current value is kept.
    pub fn apply_update(&mut self, update: &ParameterValueUpdate) -> bool {
        let value = match update {
            ParameterValueUpdate::Raw(raw) => {
                if let Some(value) = raw.downcast_ref::<T>() {
                    Some(value.clone())
                } else if let Some(value_str) = raw.downcast_ref::<String>() {
                    let value = T::from_str(value_str).ok();
                    if value.is_none() {
                        log::warn!(
                            "Invalid string value for enum parameter '{}'",
                            self.description.id()
                        );
                    }
                    value
                } else {
                    log::warn!(
                        "Invalid value type for enum parameter '{}'",
                        self.description.id()
                    );
                    None
                }
            }
            ParameterValueUpdate::Normalized(normalized) => {
                if normalized.is_nan() {
                    log::warn!(
                        "Ignoring NaN value for enum parameter '{}'",
                        self.description.id()
                    );
                    None
                } else {
                    let value_str = self
                        .description
                        .denormalize_value(normalized.clamp(0.0, 1.0));
                    T::from_str(value_str).ok()
                }
            }
        };
        match value {
            Some(value) => {
                self.set_value(value);
                true
            }
            None => false,
        }
    }
}

impl<T: Sized + FromStr + Clone + 'static> From<EnumParameter> for EnumParameterValue<T>
where
    <T as FromStr>::Err: Debug,
{
    fn from(description: EnumParameter) -> Self {
        Self::from_description(description)
    }
}

// -------------------------------------------------------------------------------------------------
