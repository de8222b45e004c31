//! GATT characteristic UUIDs exposed by SoakStation controllers.

/// Vendor service carrying the control protocol.
pub const UUID_SERVICE: &str = "bccb0001-ca66-11e5-88a4-0002a5d5c51b";

/// Characteristic accepting outbound command chunks (write without response).
pub const UUID_WRITE: &str = "bccb0002-ca66-11e5-88a4-0002a5d5c51b";

/// Characteristic delivering inbound notification chunks.
pub const UUID_READ: &str = "bccb0003-ca66-11e5-88a4-0002a5d5c51b";

/// Standard GAP device name.
pub const UUID_DEVICE_NAME: &str = "00002a00-0000-1000-8000-00805f9b34fb";

/// Standard device information: model number string.
pub const UUID_MODEL_NUMBER: &str = "00002a24-0000-1000-8000-00805f9b34fb";

/// Standard device information: manufacturer name string.
pub const UUID_MANUFACTURER: &str = "00002a29-0000-1000-8000-00805f9b34fb";

/// Returns a human-readable name for a known characteristic UUID.
pub fn characteristic_name(uuid: &str) -> &'static str {
    match uuid {
        UUID_SERVICE => "SERVICE",
        UUID_WRITE => "WRITE",
        UUID_READ => "NOTIFY",
        UUID_DEVICE_NAME => "DEVICE_NAME",
        UUID_MODEL_NUMBER => "MODEL_NUMBER",
        UUID_MANUFACTURER => "MANUFACTURER",
        _ => "UNKNOWN",
    }
}
