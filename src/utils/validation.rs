//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! que `validator` invoca desde los DTOs.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

lazy_static! {
    /// Códigos de nodos, trayectos y rutas: mayúsculas, dígitos, guion y guion bajo
    pub static ref CODE_REGEX: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9_-]*$").unwrap();
}

/// Normaliza un código antes de validarlo: sin espacios alrededor y en mayúsculas
pub fn normalize_code(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de coordenadas GPS
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &lat);
        error.add_param("range".into(), &"-90.0 to 90.0".to_string());
        return Err(error);
    }

    if !(-180.0..=180.0).contains(&lng) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &lng);
        error.add_param("range".into(), &"-180.0 to 180.0".to_string());
        return Err(error);
    }

    Ok(())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

pub fn validate_positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(*value)
}

pub fn validate_non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(*value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_code_regex() {
        assert!(CODE_REGEX.is_match("ORIG"));
        assert!(CODE_REGEX.is_match("MEX-GDL_01"));
        assert!(!CODE_REGEX.is_match("orig"));
        assert!(!CODE_REGEX.is_match("-LEADING"));
        assert!(!CODE_REGEX.is_match("WITH SPACE"));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  dest "), "DEST");
        assert!(CODE_REGEX.is_match(&normalize_code("mex-01")));
    }

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("Terminal Norte").is_ok());
        assert!(validate_not_empty("   ").is_err());
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(19.43, -99.13).is_ok());
        assert!(validate_coordinates(91.0, -75.0).is_err());
        assert!(validate_coordinates(45.0, -181.0).is_err());
    }

    #[test]
    fn test_validate_decimals() {
        let zero = Decimal::ZERO;
        let distance = Decimal::from_str("12.5").unwrap();
        assert!(validate_positive_decimal(&distance).is_ok());
        assert!(validate_positive_decimal(&zero).is_err());
        assert!(validate_non_negative_decimal(&zero).is_ok());
        assert!(validate_non_negative_decimal(&-distance).is_err());
    }
}
