use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serializer};

use crate::serialization::{
    deserialize_curve_hex, deserialize_scalar_hex, serialize_curve_hex, serialize_scalar_hex,
};

/// Serde helpers for encoding curve points as compressed hex strings.
pub mod curve {
    use super::*;

    pub fn serialize<C, S>(value: &C, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        C: CurveGroup,
        S: Serializer,
    {
        let hex = serialize_curve_hex(value).map_err(SerError::custom)?;
        serializer.serialize_str(&hex)
    }

    pub fn deserialize<'de, C, D>(deserializer: D) -> std::result::Result<C, D::Error>
    where
        C: CurveGroup,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        deserialize_curve_hex(&s).map_err(DeError::custom)
    }
}

/// Serde helpers for encoding scalars as big-endian hex integers.
pub mod scalar {
    use super::*;

    pub fn serialize<F, S>(value: &F, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        F: PrimeField,
        S: Serializer,
    {
        serializer.serialize_str(&serialize_scalar_hex(value))
    }

    pub fn deserialize<'de, F, D>(deserializer: D) -> std::result::Result<F, D::Error>
    where
        F: PrimeField,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        deserialize_scalar_hex(&s).map_err(DeError::custom)
    }
}

#[cfg(test)]
mod tests {
    use ark_ec::PrimeGroup;
    use ark_ff::UniformRand;
    use ark_secp256k1::{Fr, Projective};
    use serde::{Deserialize, Serialize};

    use crate::test_utils::serde::{assert_round_trip_eq, assert_round_trip_json};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::curve")]
        point: Projective,
        #[serde(with = "super::scalar")]
        scalar: Fr,
    }

    #[test]
    fn wrapper_round_trips() {
        let mut rng = ark_std::test_rng();
        let value = Wrapper {
            point: Projective::generator() * Fr::rand(&mut rng),
            scalar: Fr::rand(&mut rng),
        };
        assert_round_trip_eq(&value);
        assert_round_trip_json(&value);
    }

    #[test]
    fn invalid_point_is_a_deserialization_error() {
        let json = serde_json::json!({ "point": "02ff", "scalar": "01" });
        assert!(serde_json::from_value::<Wrapper>(json).is_err());
    }
}
