// Payload encoding shared by the HTTP bodies and the GATT characteristic
// values: UTF-8 JSON in both directions.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::models::Validate;

/// Serialize a payload into the bytes written to the device.
pub fn encode<T: Serialize + ?Sized>(what: &'static str, value: &T) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(value).map_err(|e| Error::decode(what, e, &[]))
}

/// Decode and validate a payload read from the device.
///
/// Firmware pads fixed-size characteristic buffers with NULs; trailing
/// NUL and whitespace bytes are ignored. An empty payload is malformed.
pub fn decode<T>(what: &'static str, raw: &[u8]) -> Result<T, Error>
where
    T: DeserializeOwned + Validate,
{
    let trimmed = trim_padding(raw);
    if trimmed.is_empty() {
        return Err(Error::decode(what, "empty payload", raw));
    }

    let value: T = serde_json::from_slice(trimmed).map_err(|e| Error::decode(what, e, raw))?;
    value.validate().map_err(|e| Error::decode(what, e, raw))?;
    Ok(value)
}

fn trim_padding(raw: &[u8]) -> &[u8] {
    let end = raw
        .iter()
        .rposition(|b| *b != 0 && !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    raw.get(..end).unwrap_or_default()
}
