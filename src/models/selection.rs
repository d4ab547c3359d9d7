use serde::{Deserialize, Serialize};

use super::{BalloonColor, Plan};
use crate::errors::AppError;

pub const MAX_BALLOON_COLORS: usize = 3;
pub const MAX_HANGING_PHOTOS: u32 = 9;
pub const MAX_LED_NAME_CHARS: usize = 20;
pub const MAX_AGE_LIGHT_CHARS: usize = 3;
pub const MAX_CUSTOM_TEXT_CHARS: usize = 20;

/// An add-on as it appears on a booking: the catalog price is copied in at
/// selection time so the stored record prices the same way forever.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddOnSelection {
    pub addon_id: String,
    pub name: String,
    pub unit_price: i64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<String>,
}

impl AddOnSelection {
    /// `None` when the line does not fit in an `i64`.
    pub fn line_total(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnhancedFeatureSelection {
    #[serde(default)]
    pub hanging_photo_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_light_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_light_value: Option<String>,
}

impl EnhancedFeatureSelection {
    /// Trims text fields and drops the ones left empty.
    pub fn normalized(self) -> Self {
        Self {
            hanging_photo_count: self.hanging_photo_count,
            led_light_name: non_empty(self.led_light_name),
            age_light_value: non_empty(self.age_light_value),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.hanging_photo_count > MAX_HANGING_PHOTOS {
            return Err(AppError::invalid(format!(
                "at most {MAX_HANGING_PHOTOS} hanging photos can be added"
            )));
        }
        if let Some(name) = &self.led_light_name {
            if name.chars().count() > MAX_LED_NAME_CHARS {
                return Err(AppError::invalid(format!(
                    "LED light name must be at most {MAX_LED_NAME_CHARS} characters"
                )));
            }
        }
        if let Some(age) = &self.age_light_value {
            if age.chars().count() > MAX_AGE_LIGHT_CHARS {
                return Err(AppError::invalid(format!(
                    "age light value must be at most {MAX_AGE_LIGHT_CHARS} characters"
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChosenColor {
    pub id: String,
    pub name: String,
    pub hex: String,
}

/// Ordered set of up to three distinct balloon colors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct BalloonColorSelection(Vec<ChosenColor>);

impl BalloonColorSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, color: &BalloonColor, plan: Plan) -> Result<(), AppError> {
        if self.contains(&color.id) {
            return Err(AppError::invalid(format!(
                "balloon color '{}' is already selected",
                color.id
            )));
        }
        if self.0.len() >= MAX_BALLOON_COLORS {
            return Err(AppError::invalid(format!(
                "at most {MAX_BALLOON_COLORS} balloon colors can be selected"
            )));
        }
        if !color.is_available_for(plan) {
            return Err(AppError::invalid(format!(
                "balloon color '{}' is not available on the {plan} plan",
                color.id
            )));
        }
        self.0.push(ChosenColor {
            id: color.id.clone(),
            name: color.name.clone(),
            hex: color.hex.clone(),
        });
        Ok(())
    }

    pub fn remove(&mut self, color_id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c.id != color_id);
        self.0.len() != before
    }

    pub fn contains(&self, color_id: &str) -> bool {
        self.0.iter().any(|c| c.id == color_id)
    }

    pub fn colors(&self) -> &[ChosenColor] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Structural checks for a selection read back from storage.
    pub fn check_shape(&self) -> Result<(), AppError> {
        if self.0.len() > MAX_BALLOON_COLORS {
            return Err(AppError::invalid("too many balloon colors"));
        }
        for (i, c) in self.0.iter().enumerate() {
            if self.0[..i].iter().any(|o| o.id == c.id) {
                return Err(AppError::invalid(format!("duplicate balloon color '{}'", c.id)));
            }
        }
        Ok(())
    }
}
