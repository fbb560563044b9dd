// src/common/validation.rs

use rust_decimal::Decimal;
use validator::{Validate, ValidationError, ValidationErrors};

/// Precision and scale of a `NUMERIC` column a value is written to.
#[derive(Debug, Clone, Copy)]
pub struct NumericColumn {
    pub precision: u32,
    pub scale: u32,
}

/// `NUMERIC(14, 2)`: prices, budgets and every booking or payment amount.
pub const MONEY: NumericColumn = NumericColumn { precision: 14, scale: 2 };
/// `NUMERIC(12, 2)`: unit area.
pub const AREA: NumericColumn = NumericColumn { precision: 12, scale: 2 };
/// `NUMERIC(5, 2)`: commission percentage.
pub const RATE: NumericColumn = NumericColumn { precision: 5, scale: 2 };

impl NumericColumn {
    /// Largest magnitude the column can hold, exclusive.
    pub fn limit(&self) -> Decimal {
        Decimal::from(10u64.pow(self.precision - self.scale))
    }

    pub fn check(&self, val: &Decimal) -> Result<(), ValidationError> {
        if val.normalize().scale() > self.scale {
            let mut err = ValidationError::new("precision");
            err.message = Some(format!("At most {} decimal places are allowed.", self.scale).into());
            return Err(err);
        }
        if val.abs() >= self.limit() {
            let mut err = ValidationError::new("range");
            err.message = Some(format!("The value must be less than {}.", self.limit()).into());
            return Err(err);
        }
        Ok(())
    }
}

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("The value cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("The value must be greater than zero.".into());
        return Err(err);
    }
    Ok(())
}

/// Runs the derived rules plus any cross-field checks, reporting all
/// failures in one `ValidationErrors`.
pub fn validate_with<T, F>(payload: &T, extra: F) -> Result<(), ValidationErrors>
where
    T: Validate,
    F: FnOnce(&mut ValidationErrors),
{
    let mut errors = match payload.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(e) => e,
    };

    extra(&mut errors);

    if errors.field_errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Records the outcome of a numeric check on an optional field: first that
/// the value fits `column`, then `rule`. At most one error per field.
pub fn check_amount(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&Decimal>,
    column: NumericColumn,
    rule: fn(&Decimal) -> Result<(), ValidationError>,
) {
    if let Some(v) = value {
        if let Err(e) = column.check(v).and_then(|()| rule(v)) {
            errors.add(field, e);
        }
    }
}

/// Records a `required` failure for a missing optional field.
pub fn check_required<T>(errors: &mut ValidationErrors, field: &'static str, value: Option<&T>) {
    if value.is_none() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required.".into());
        errors.add(field, err);
    }
}
