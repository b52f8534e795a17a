//! Reglas de negocio de las opciones de pathway que no dependen de la base

use rust_decimal::{Decimal, RoundingStrategy};

use crate::utils::errors::FieldError;

/// Resuelve `passThroughTimeMin` según `isPassThrough`.
///
/// Pass-through sin tiempo es un error; sin pass-through el tiempo se descarta.
pub fn normalize_pass_through(
    is_pass_through: bool,
    pass_through_time_min: Option<i32>,
) -> Result<Option<i32>, FieldError> {
    match (is_pass_through, pass_through_time_min) {
        (true, Some(minutes)) => Ok(Some(minutes)),
        (true, None) => Err(FieldError::new(
            "passThroughTimeMin",
            "required",
            "passThroughTimeMin is required when isPassThrough is true",
            None,
        )),
        (false, _) => Ok(None),
    }
}

/// Velocidad promedio en km/h con dos decimales
pub fn derive_avg_speed(distance_km: Decimal, typical_time_min: i32) -> Decimal {
    if typical_time_min <= 0 {
        return Decimal::ZERO;
    }
    (distance_km * Decimal::from(60) / Decimal::from(typical_time_min))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_pass_through_requires_time() {
        let error = normalize_pass_through(true, None).unwrap_err();
        assert_eq!(error.field, "passThroughTimeMin");
        assert_eq!(error.code, "required");
        assert_eq!(normalize_pass_through(true, Some(5)).unwrap(), Some(5));
    }

    #[test]
    fn test_time_is_discarded_without_pass_through() {
        assert_eq!(normalize_pass_through(false, Some(5)).unwrap(), None);
        assert_eq!(normalize_pass_through(false, None).unwrap(), None);
    }

    #[test]
    fn test_derive_avg_speed() {
        assert_eq!(
            derive_avg_speed(Decimal::from(120), 90),
            Decimal::from_str("80").unwrap()
        );
        assert_eq!(
            derive_avg_speed(Decimal::from(100), 70),
            Decimal::from_str("85.71").unwrap()
        );
        assert_eq!(derive_avg_speed(Decimal::from(100), 0), Decimal::ZERO);
    }
}
