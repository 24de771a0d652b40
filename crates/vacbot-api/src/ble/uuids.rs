//! GATT service and characteristic UUIDs of the robot control profile.

use uuid::Uuid;

/// Build a 128-bit UUID from the 5-field encoding used in firmware
/// headers (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
pub const fn uuid_from_fields(a: u32, b: u16, c: u16, d: u16, e: u64) -> Uuid {
    let hi: u64 = (a as u64) << 32 | (b as u64) << 16 | c as u64;
    let lo: u64 = (d as u64) << 48 | e;
    Uuid::from_u128(((hi as u128) << 64) | lo as u128)
}

/// Robot control service.
pub const ROBOT_SERVICE_UUID: Uuid =
    uuid_from_fields(0x6e400001, 0x7a3b, 0x4c1e, 0x9f21, 0x5ac0_b0a7_c1e0);

/// Status (read).
pub const STATUS_CHAR_UUID: Uuid =
    uuid_from_fields(0x6e400002, 0x7a3b, 0x4c1e, 0x9f21, 0x5ac0_b0a7_c1e0);

/// Command (write with response).
pub const COMMAND_CHAR_UUID: Uuid =
    uuid_from_fields(0x6e400003, 0x7a3b, 0x4c1e, 0x9f21, 0x5ac0_b0a7_c1e0);

/// Schedule (read / write with response).
pub const SCHEDULE_CHAR_UUID: Uuid =
    uuid_from_fields(0x6e400004, 0x7a3b, 0x4c1e, 0x9f21, 0x5ac0_b0a7_c1e0);

/// Map (read).
pub const MAP_CHAR_UUID: Uuid =
    uuid_from_fields(0x6e400005, 0x7a3b, 0x4c1e, 0x9f21, 0x5ac0_b0a7_c1e0);
