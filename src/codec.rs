/// Binary encoding and decoding of the fixed LYWSD02 characteristic layouts
///
/// Byte order and signedness are part of the wire contract with the device
/// and must not change:
/// - sensor data: `int16_le temperature_centidegrees | uint8 humidity_percent`
/// - battery: `uint8 battery_percent`
/// - time sync: `uint32_le epoch_seconds | int8 tz_offset_hours`
use crate::error::CodecError;
use crate::models::ClimateReading;

/// Minimum length of the sensor characteristic payload
const SENSOR_PAYLOAD_MIN: usize = 3;

/// Exact length of the encoded time-sync payload
pub const TIME_SYNC_LEN: usize = 5;

/// Decode the sensor characteristic payload into temperature and humidity.
///
/// The first two bytes form a little-endian signed 16-bit temperature in
/// hundredths of a degree Celsius, the third byte is the humidity percent.
/// Trailing bytes are ignored.
///
/// # Arguments
/// * `raw` - Raw bytes read from the sensor data characteristic
///
/// # Returns
/// The decoded reading, or `InsufficientData` when fewer than three bytes
/// were supplied. No partial decode is attempted.
pub fn decode_sensor_data(raw: &[u8]) -> Result<ClimateReading, CodecError> {
    if raw.len() < SENSOR_PAYLOAD_MIN {
        return Err(CodecError::InsufficientData {
            needed: SENSOR_PAYLOAD_MIN,
            got: raw.len(),
        });
    }

    let centidegrees = i16::from_le_bytes([raw[0], raw[1]]);
    Ok(ClimateReading {
        temperature: f32::from(centidegrees) / 100.0,
        humidity: raw[2],
    })
}

/// Decode the battery characteristic payload.
///
/// The first byte is the battery charge percent; trailing bytes are ignored.
/// Fails with `InsufficientData` on empty input.
pub fn decode_battery(raw: &[u8]) -> Result<u8, CodecError> {
    raw.first()
        .copied()
        .ok_or(CodecError::InsufficientData { needed: 1, got: 0 })
}

/// Encode the time-sync payload for the device clock characteristic.
///
/// Produces exactly five bytes: little-endian unsigned epoch seconds
/// followed by one signed byte for the timezone offset in whole hours.
/// All inputs are representable, so there is no failure path.
pub fn encode_time_sync(epoch_seconds: u32, tz_offset_hours: i8) -> [u8; TIME_SYNC_LEN] {
    let mut payload = [0u8; TIME_SYNC_LEN];
    payload[..4].copy_from_slice(&epoch_seconds.to_le_bytes());
    payload[4] = tz_offset_hours as u8;
    payload
}
