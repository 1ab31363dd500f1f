//! Breed Model

use super::BreedId;
use crate::error::{AppError, AppResult, ErrorCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Breed entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breed {
    pub id: BreedId,
    pub name: String,
    /// Free-form size class ("small", "giant", ...)
    pub size_class: Option<String>,
    pub min_groom_price: Option<Decimal>,
    pub max_groom_price: Option<Decimal>,
    pub hourly_price: Option<Decimal>,
    pub notes: Option<String>,
}

impl Breed {
    /// Check the scalar fields before they are sent anywhere
    pub fn validate_fields(&self) -> AppResult<()> {
        validate_breed_fields(
            &self.name,
            self.min_groom_price,
            self.max_groom_price,
            self.hourly_price,
        )
    }

    /// Patch that overwrites every scalar column with this breed's values
    pub fn to_full_update(&self) -> BreedUpdate {
        BreedUpdate {
            name: Some(self.name.clone()),
            size_class: Some(self.size_class.clone()),
            min_groom_price: Some(self.min_groom_price),
            max_groom_price: Some(self.max_groom_price),
            hourly_price: Some(self.hourly_price),
            notes: Some(self.notes.clone()),
        }
    }

    /// Creation payload carrying the scalar fields of this breed under a new name
    pub fn to_create(&self, name: impl Into<String>) -> BreedCreate {
        BreedCreate {
            name: name.into(),
            size_class: self.size_class.clone(),
            min_groom_price: self.min_groom_price,
            max_groom_price: self.max_groom_price,
            hourly_price: self.hourly_price,
            notes: self.notes.clone(),
        }
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, update: BreedUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(size_class) = update.size_class {
            self.size_class = size_class;
        }
        if let Some(price) = update.min_groom_price {
            self.min_groom_price = price;
        }
        if let Some(price) = update.max_groom_price {
            self.max_groom_price = price;
        }
        if let Some(price) = update.hourly_price {
            self.hourly_price = price;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
    }
}

/// Create breed payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BreedCreate {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub size_class: Option<String>,
    pub min_groom_price: Option<Decimal>,
    pub max_groom_price: Option<Decimal>,
    pub hourly_price: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl BreedCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_class: None,
            min_groom_price: None,
            max_groom_price: None,
            hourly_price: None,
            notes: None,
        }
    }

    /// Run the derived validators and the price checks
    pub fn check(&self) -> AppResult<()> {
        validate_breed_fields(
            &self.name,
            self.min_groom_price,
            self.max_groom_price,
            self.hourly_price,
        )?;
        self.validate()?;
        Ok(())
    }
}

/// Update breed payload
///
/// Outer `None` leaves a column untouched; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreedUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_class: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_groom_price: Option<Option<Decimal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_groom_price: Option<Option<Decimal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_price: Option<Option<Decimal>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl BreedUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layer a later edit on top of this one; fields set in `other` win
    pub fn merge(&mut self, other: BreedUpdate) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.size_class.is_some() {
            self.size_class = other.size_class;
        }
        if other.min_groom_price.is_some() {
            self.min_groom_price = other.min_groom_price;
        }
        if other.max_groom_price.is_some() {
            self.max_groom_price = other.max_groom_price;
        }
        if other.hourly_price.is_some() {
            self.hourly_price = other.hourly_price;
        }
        if other.notes.is_some() {
            self.notes = other.notes;
        }
    }
}

/// Shared scalar checks for breeds
pub fn validate_breed_fields(
    name: &str,
    min_groom_price: Option<Decimal>,
    max_groom_price: Option<Decimal>,
    hourly_price: Option<Decimal>,
) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::new(ErrorCode::BreedNameRequired).with_detail("field", "name"));
    }
    for (field, price) in [
        ("min_groom_price", min_groom_price),
        ("max_groom_price", max_groom_price),
        ("hourly_price", hourly_price),
    ] {
        if let Some(p) = price
            && p.is_sign_negative()
            && !p.is_zero()
        {
            return Err(AppError::new(ErrorCode::BreedInvalidPrice).with_detail("field", field));
        }
    }
    if let (Some(min), Some(max)) = (min_groom_price, max_groom_price)
        && min > max
    {
        return Err(AppError::new(ErrorCode::BreedPriceRange)
            .with_detail("min_groom_price", min.to_string())
            .with_detail("max_groom_price", max.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn breed() -> Breed {
        Breed {
            id: 1,
            name: "Poodle".to_string(),
            size_class: Some("medium".to_string()),
            min_groom_price: Some(Decimal::new(4000, 2)),
            max_groom_price: Some(Decimal::new(8000, 2)),
            hourly_price: None,
            notes: None,
        }
    }

    #[test]
    fn test_validate_fields_ok() {
        assert!(breed().validate_fields().is_ok());
    }

    #[test]
    fn test_validate_blank_name() {
        let mut b = breed();
        b.name = "   ".to_string();
        assert_eq!(
            b.validate_fields().unwrap_err().code,
            ErrorCode::BreedNameRequired
        );
    }

    #[test]
    fn test_validate_negative_price() {
        let mut b = breed();
        b.hourly_price = Some(Decimal::new(-1, 0));
        assert_eq!(
            b.validate_fields().unwrap_err().code,
            ErrorCode::BreedInvalidPrice
        );
    }

    #[test]
    fn test_validate_price_range() {
        let mut b = breed();
        b.min_groom_price = Some(Decimal::new(9000, 2));
        assert_eq!(
            b.validate_fields().unwrap_err().code,
            ErrorCode::BreedPriceRange
        );
    }

    #[test]
    fn test_create_check_runs_length_validator() {
        let create = BreedCreate::new("x".repeat(200));
        assert_eq!(create.check().unwrap_err().code, ErrorCode::ValidationFailed);
        assert!(BreedCreate::new("Beagle").check().is_ok());
    }

    #[test]
    fn test_update_serializes_only_set_fields() {
        let update = BreedUpdate {
            notes: Some(None),
            hourly_price: Some(Some(Decimal::new(55, 0))),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["notes"], serde_json::Value::Null);
        assert_eq!(json["hourly_price"], serde_json::json!(55.0));
        assert!(json.get("name").is_none());
    }

    #[test]
    fn test_merge_updates() {
        let mut draft = BreedUpdate {
            notes: Some(Some("nervous".to_string())),
            hourly_price: Some(Some(Decimal::new(50, 0))),
            ..Default::default()
        };
        draft.merge(BreedUpdate {
            hourly_price: Some(None),
            ..Default::default()
        });
        assert_eq!(draft.notes, Some(Some("nervous".to_string())));
        assert_eq!(draft.hourly_price, Some(None));
    }

    #[test]
    fn test_apply_update() {
        let mut b = breed();
        b.apply(BreedUpdate {
            name: Some("Standard Poodle".to_string()),
            size_class: Some(None),
            ..Default::default()
        });
        assert_eq!(b.name, "Standard Poodle");
        assert_eq!(b.size_class, None);
        assert_eq!(b.min_groom_price, Some(Decimal::new(4000, 2)));
    }
}
