//! Composición de rutas
//!
//! Convierte la selección ordenada de (pathway, opción) en los tramos que se
//! persisten. Cada selección produce un tramo primario y un tramo derivado
//! por cada caseta de la opción, colocado justo después de su tramo padre.
//! Las posiciones persistidas son densas 1..M sobre todos los tramos.

use crate::models::pathway::Pathway;
use crate::models::pathway_option::{PathwayOption, Toll};
use crate::models::route::{NewRouteLeg, RouteLeg};
use crate::utils::errors::{AppError, AppResult, FieldError};

/// Selección ya cargada desde la base de datos
#[derive(Debug, Clone)]
pub struct ResolvedSelection {
    pub pathway: Pathway,
    pub option: PathwayOption,
    /// En orden de inserción
    pub tolls: Vec<Toll>,
}

/// Paradas físicas de una selección: origen, casetas y destino
pub fn stops_for_selection(selection: &ResolvedSelection) -> Vec<i32> {
    let mut stops = Vec::with_capacity(selection.tolls.len() + 2);
    stops.push(selection.pathway.origin_node_id);
    stops.extend(selection.tolls.iter().map(|toll| toll.node_id));
    stops.push(selection.pathway.destination_node_id);
    stops
}

/// Genera los tramos de la ruta a partir de la selección completa.
///
/// Falla sin generar nada si alguna opción es pass-through sin tiempo.
pub fn plan_route_legs(route_id: i32, selections: &[ResolvedSelection]) -> AppResult<Vec<NewRouteLeg>> {
    let invalid: Vec<FieldError> = selections
        .iter()
        .enumerate()
        .filter(|(_, s)| s.option.is_pass_through && s.option.pass_through_time_min.is_none())
        .map(|(index, s)| {
            FieldError::new(
                format!("legs[{}].pathwayOptionId", index),
                "pass_through_time_required",
                "Pass-through options require passThroughTimeMin",
                Some(s.option.id.into()),
            )
        })
        .collect();
    if !invalid.is_empty() {
        return Err(AppError::Validation(invalid));
    }

    let mut legs = Vec::new();
    let mut position = 0;
    let mut next_position = || {
        position += 1;
        position
    };

    for selection in selections {
        let pathway = &selection.pathway;
        legs.push(NewRouteLeg {
            route_id,
            position: next_position(),
            origin_node_id: pathway.origin_node_id,
            destination_node_id: pathway.destination_node_id,
            pathway_id: pathway.id,
            pathway_option_id: selection.option.id,
            is_derived: Some(false),
            active: Some(true),
        });

        let stops = stops_for_selection(selection);
        // stops[k] -> stops[k + 1] para cada caseta; el último tramo (caseta -> destino) no se deriva
        for hop in stops.windows(2).take(selection.tolls.len()) {
            legs.push(NewRouteLeg {
                route_id,
                position: next_position(),
                origin_node_id: hop[0],
                destination_node_id: hop[1],
                pathway_id: pathway.id,
                pathway_option_id: selection.option.id,
                is_derived: Some(true),
                active: Some(true),
            });
        }
    }

    Ok(legs)
}

/// Número de secuencia visible para cada tramo: el índice 1-based de su
/// selección. Los derivados heredan el de su tramo padre.
pub fn sequence_numbers(legs: &[RouteLeg]) -> Vec<i32> {
    let mut sequence = 0;
    legs.iter()
        .map(|leg| {
            if !leg.is_derived {
                sequence += 1;
            }
            sequence.max(1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn pathway(id: i32, origin: i32, destination: i32) -> Pathway {
        let now = Utc::now();
        Pathway {
            id,
            origin_node_id: origin,
            destination_node_id: destination,
            name: format!("Pathway {}", id),
            code: format!("P{}", id),
            description: None,
            is_empty_trip: false,
            is_sellable: true,
            active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn option(id: i32, pathway_id: i32) -> PathwayOption {
        let now = Utc::now();
        PathwayOption {
            id,
            pathway_id,
            name: "Autopista".to_string(),
            description: None,
            distance_km: Decimal::new(120, 0),
            typical_time_min: 90,
            avg_speed_kmh: Decimal::new(80, 0),
            is_default: true,
            is_pass_through: false,
            pass_through_time_min: None,
            active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn toll(id: i32, option_id: i32, node_id: i32) -> Toll {
        Toll {
            id,
            pathway_option_id: option_id,
            node_id,
            pass_time_min: 2,
            distance: Decimal::new(40, 0),
            created_at: Utc::now(),
        }
    }

    fn selection(pathway_id: i32, origin: i32, destination: i32, tolls: Vec<Toll>) -> ResolvedSelection {
        ResolvedSelection {
            pathway: pathway(pathway_id, origin, destination),
            option: option(pathway_id * 10, pathway_id),
            tolls,
        }
    }

    #[test]
    fn test_stops_include_tolls_in_order() {
        let s = selection(1, 100, 200, vec![toll(1, 10, 150), toll(2, 10, 170)]);
        assert_eq!(stops_for_selection(&s), vec![100, 150, 170, 200]);
    }

    #[test]
    fn test_positions_are_dense_without_tolls() {
        let selections = vec![
            selection(1, 100, 200, vec![]),
            selection(2, 200, 300, vec![]),
            selection(3, 300, 400, vec![]),
        ];

        let legs = plan_route_legs(7, &selections).unwrap();

        let positions: Vec<i32> = legs.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert!(legs.iter().all(|l| !l.is_derived() && l.route_id == 7));
        assert_eq!(legs[1].pathway_id, 2);
        assert_eq!(legs[1].pathway_option_id, 20);
    }

    #[test]
    fn test_derived_legs_follow_their_parent() {
        let selections = vec![
            selection(1, 100, 200, vec![toll(1, 10, 150), toll(2, 10, 170)]),
            selection(2, 200, 300, vec![]),
        ];

        let legs = plan_route_legs(1, &selections).unwrap();

        assert_eq!(legs.len(), 4);
        assert_eq!(
            legs.iter().map(|l| l.position).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(!legs[0].is_derived());
        assert_eq!((legs[1].origin_node_id, legs[1].destination_node_id), (100, 150));
        assert_eq!((legs[2].origin_node_id, legs[2].destination_node_id), (150, 170));
        assert!(legs[1].is_derived() && legs[2].is_derived());
        assert_eq!(legs[2].pathway_id, 1);
        assert!(!legs[3].is_derived());
        assert_eq!(legs[3].pathway_id, 2);
    }

    #[test]
    fn test_pass_through_without_time_is_rejected() {
        let mut broken = selection(2, 200, 300, vec![]);
        broken.option.is_pass_through = true;
        let selections = vec![selection(1, 100, 200, vec![]), broken];

        match plan_route_legs(1, &selections) {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "legs[1].pathwayOptionId");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_selection_yields_no_legs() {
        assert!(plan_route_legs(1, &[]).unwrap().is_empty());
    }
}
