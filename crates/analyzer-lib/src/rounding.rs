//! Display rounding for report figures
//!
//! Values are kept exact in memory and rounded only when serialized, so sums
//! computed from report structs do not accumulate rounding error.

use serde::Serializer;

/// Round `value` to `places` decimal places
///
/// Values too large to scale are returned unchanged.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Serialize with 2 decimal places (totals, averages, percentages)
pub fn two_places<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 2))
}

/// Serialize with 4 decimal places (per-request costs)
pub fn four_places<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.23456, 4), 1.2346);
        assert_eq!(round_to(0.0, 2), 0.0);
        assert_eq!(round_to(199.999, 2), 200.0);
    }

    #[test]
    fn test_huge_values_survive_rounding() {
        assert_eq!(round_to(1e307, 2), 1e307);
        assert_eq!(round_to(f64::MAX, 4), f64::MAX);

        #[derive(serde::Serialize)]
        struct Row {
            #[serde(serialize_with = "two_places")]
            avg: f64,
        }
        let json = serde_json::to_value(Row { avg: 1e307 }).unwrap();
        assert_eq!(json["avg"], 1e307);
    }

    #[test]
    fn test_serialize_helpers() {
        #[derive(serde::Serialize)]
        struct Row {
            #[serde(serialize_with = "two_places")]
            total: f64,
            #[serde(serialize_with = "four_places")]
            per_request: f64,
        }

        let json = serde_json::to_value(Row {
            total: 12.3456,
            per_request: 0.000123456,
        })
        .unwrap();
        assert_eq!(json["total"], 12.35);
        assert_eq!(json["per_request"], 0.0001);
    }
}
