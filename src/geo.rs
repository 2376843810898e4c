use serde::Serialize;

use crate::models::nap::NapBox;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitud: f64,
    pub longitud: f64,
}

/// Great-circle distance in meters.
pub fn haversine_m(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.latitud.to_radians();
    let phi2 = b.latitud.to_radians();
    let d_phi = (b.latitud - a.latitud).to_radians();
    let d_lambda = (b.longitud - a.longitud).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Closest box with known coordinates, and its distance.
pub fn nearest_nap(point: Coordinates, boxes: &[NapBox]) -> Option<(&NapBox, f64)> {
    boxes
        .iter()
        .filter_map(|nap| {
            let (Some(latitud), Some(longitud)) = (nap.latitud, nap.longitud) else {
                return None;
            };
            Some((nap, haversine_m(point, Coordinates { latitud, longitud })))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feasibility {
    pub es_factible: bool,
    pub distancia_metros: f64,
}

/// Distance is rounded to whole meters before comparing with the limit.
pub fn assess(distance_m: f64, max_distance_m: f64) -> Feasibility {
    let distancia_metros = distance_m.round();
    Feasibility { es_factible: distancia_metros <= max_distance_m, distancia_metros }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nap(id: i64, lat: Option<f64>, lon: Option<f64>) -> NapBox {
        NapBox { id, nombre_caja: format!("NAP-{id}"), latitud: lat, longitud: lon }
    }

    #[test]
    fn haversine_matches_known_distance() {
        // One degree of latitude is roughly 111.2 km.
        let d = haversine_m(
            Coordinates { latitud: 10.0, longitud: -66.0 },
            Coordinates { latitud: 11.0, longitud: -66.0 },
        );
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
        assert_eq!(haversine_m(Coordinates { latitud: 1.0, longitud: 2.0 }, Coordinates { latitud: 1.0, longitud: 2.0 }), 0.0);
    }

    #[test]
    fn nearest_skips_boxes_without_coordinates() {
        let client = Coordinates { latitud: 10.5, longitud: -66.9 };
        let boxes = vec![
            nap(1, None, Some(-66.9)),
            nap(2, Some(10.51), Some(-66.9)),
            nap(3, Some(10.501), Some(-66.9)),
        ];
        let (closest, distance) = nearest_nap(client, &boxes).unwrap();
        assert_eq!(closest.id, 3);
        assert!(distance < 200.0);

        assert!(nearest_nap(client, &[nap(9, None, None)]).is_none());
    }

    #[test]
    fn feasibility_uses_rounded_distance() {
        assert!(assess(400.4, 400.0).es_factible);
        assert!(!assess(400.6, 400.0).es_factible);
        assert_eq!(assess(123.45, 400.0).distancia_metros, 123.0);
    }
}
