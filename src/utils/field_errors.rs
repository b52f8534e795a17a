//! Recolector de errores por campo
//!
//! Las reglas de unicidad y de integridad se evalúan todas antes de escribir;
//! los conflictos se acumulan aquí y se devuelven juntos como un solo
//! `AppError::Validation`.

use serde_json::Value;
use validator::Validate;

use crate::utils::errors::{flatten_validation_errors, AppError, AppResult, FieldError};

#[derive(Debug, Default)]
pub struct FieldErrorCollector {
    errors: Vec<FieldError>,
}

impl FieldErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arranca con los errores de las reglas declarativas del DTO
    pub fn from_validation<T: Validate>(payload: &T) -> Self {
        let errors = match payload.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => flatten_validation_errors(&errors),
        };
        Self { errors }
    }

    pub fn add(
        &mut self,
        field: impl Into<String>,
        code: &str,
        message: impl Into<String>,
        value: Option<Value>,
    ) {
        self.errors.push(FieldError::new(field, code, message, value));
    }

    pub fn add_duplicate(&mut self, field: &str, value: &str) {
        self.add(
            field,
            "duplicate",
            format!("The value '{}' is already in use for {}", value, field),
            Some(Value::String(value.to_string())),
        );
    }

    pub fn add_missing_reference(&mut self, field: impl Into<String>, entity: &str, id: i32) {
        self.add(
            field,
            "not_found",
            format!("{} with id {} does not exist", entity, id),
            Some(Value::from(id)),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error_on(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}
