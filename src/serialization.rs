//! Hex codecs for curve points and scalars crossing the library boundary.
//!
//! Points use the compressed arkworks encoding. Scalars use big-endian integer
//! bytes and are reduced modulo the group order on the way in.

use anyhow::{anyhow, Result};
use ark_ec::CurveGroup;
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::CanonicalSerialize;

/// Canonically serializes any arkworks type into a compressed byte vector.
pub fn canonical_serialize_bytes<T>(value: &T) -> Result<Vec<u8>>
where
    T: CanonicalSerialize,
{
    let mut buf = Vec::new();
    value
        .serialize_compressed(&mut buf)
        .map_err(|err| anyhow!("canonical serialize failed: {err}"))?;
    Ok(buf)
}

/// Canonically serializes any arkworks type into a lowercase hex string without a prefix.
pub fn canonical_serialize_hex<T>(value: &T) -> Result<String>
where
    T: CanonicalSerialize,
{
    let buf = canonical_serialize_bytes(value)?;
    Ok(hex::encode(buf))
}

/// Serializes a curve point to compressed lowercase hex.
pub fn serialize_curve_hex<C>(value: &C) -> Result<String>
where
    C: CurveGroup,
{
    canonical_serialize_hex(value).map_err(|err| anyhow!("failed to serialize curve point: {err}"))
}

/// Deserializes a curve point from compressed hex, validating curve and subgroup membership.
pub fn deserialize_curve_hex<C>(value: &str) -> Result<C>
where
    C: CurveGroup,
{
    let bytes = decode_hex_bytes(value)?;
    C::deserialize_compressed(&mut &bytes[..])
        .map_err(|err| anyhow!("curve deserialization failed: {err}"))
}

/// Encodes a scalar as a big-endian integer in lowercase hex.
pub fn serialize_scalar_hex<F>(value: &F) -> String
where
    F: PrimeField,
{
    hex::encode(value.into_bigint().to_bytes_be())
}

/// Decodes a big-endian hex integer and reduces it modulo the field order.
pub fn deserialize_scalar_hex<F>(value: &str) -> Result<F>
where
    F: PrimeField,
{
    let bytes = decode_hex_bytes(value)?;
    Ok(F::from_be_bytes_mod_order(&bytes))
}

fn decode_hex_bytes(value: &str) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("hex string is empty"));
    }
    let without_prefix = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if without_prefix.is_empty() {
        return Err(anyhow!("hex string is empty"));
    }
    let mut owned = String::new();
    let input = if without_prefix.len() % 2 == 1 {
        owned.reserve(without_prefix.len() + 1);
        owned.push('0');
        owned.push_str(without_prefix);
        owned.as_str()
    } else {
        without_prefix
    };
    hex::decode(input).map_err(|err| anyhow!("failed to decode hex: {err}"))
}
