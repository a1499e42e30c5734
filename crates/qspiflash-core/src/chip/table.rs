//! Known QSPI flash devices
//!
//! Entries are matched in order on the exact three JEDEC ID bytes, so when
//! two parts share an ID the first one listed wins.

use super::features::Features;
use super::types::{FlashDevice, JedecId, StatusLayout};

const KIB: u32 = 1024;
const MIB: u32 = 1024 * 1024;

/// GigaDevice GD25Q16C, 2 MiB
pub const GD25Q16C: FlashDevice =
    FlashDevice::new("GD25Q16C", JedecId::new(0xC8, 0x40, 0x15), 2 * MIB)
        .with_timing(5000, 104)
        .with_quad_enable(0x02, StatusLayout::Combined)
        .with_features(Features::QUAD);

/// GigaDevice GD25Q32C, 4 MiB
pub const GD25Q32C: FlashDevice =
    FlashDevice::new("GD25Q32C", JedecId::new(0xC8, 0x40, 0x16), 4 * MIB)
        .with_timing(5000, 104)
        .with_quad_enable(0x02, StatusLayout::Split)
        .with_features(Features::QUAD);

/// GigaDevice GD25Q64C, 8 MiB
pub const GD25Q64C: FlashDevice =
    FlashDevice::new("GD25Q64C", JedecId::new(0xC8, 0x40, 0x17), 8 * MIB)
        .with_timing(5000, 104)
        .with_quad_enable(0x02, StatusLayout::Split)
        .with_features(Features::QUAD);

/// Cypress/Spansion S25FL116K, 2 MiB
pub const S25FL116K: FlashDevice =
    FlashDevice::new("S25FL116K", JedecId::new(0x01, 0x40, 0x15), 2 * MIB)
        .with_timing(10000, 108)
        .with_quad_enable(0x02, StatusLayout::Combined)
        .with_features(Features::FAST_READ.union(Features::QSPI));

/// Cypress/Spansion S25FL216K, 2 MiB
///
/// Answers with the same JEDEC ID as the S25FL116K and is therefore only
/// reachable through a custom table.
pub const S25FL216K: FlashDevice =
    FlashDevice::new("S25FL216K", JedecId::new(0x01, 0x40, 0x15), 2 * MIB)
        .with_timing(10000, 65)
        .with_features(Features::FAST_READ);

/// Winbond W25Q16FW, 2 MiB
pub const W25Q16FW: FlashDevice =
    FlashDevice::new("W25Q16FW", JedecId::new(0xEF, 0x60, 0x15), 2 * MIB)
        .with_timing(5000, 133)
        .with_quad_enable(0x02, StatusLayout::Combined)
        .with_features(Features::QUAD);

/// Winbond W25Q16JV-IQ, 2 MiB
pub const W25Q16JV_IQ: FlashDevice =
    FlashDevice::new("W25Q16JV-IQ", JedecId::new(0xEF, 0x40, 0x15), 2 * MIB)
        .with_timing(5000, 133)
        .with_quad_enable(0x02, StatusLayout::Combined)
        .with_features(Features::QUAD);

/// Winbond W25Q32BV, 4 MiB
pub const W25Q32BV: FlashDevice =
    FlashDevice::new("W25Q32BV", JedecId::new(0xEF, 0x40, 0x16), 4 * MIB)
        .with_timing(10000, 104)
        .with_quad_enable(0x02, StatusLayout::Combined)
        .with_features(Features::FAST_READ.union(Features::QSPI));

/// Winbond W25Q32JV-IM, 4 MiB
pub const W25Q32JV_IM: FlashDevice =
    FlashDevice::new("W25Q32JV-IM", JedecId::new(0xEF, 0x70, 0x16), 4 * MIB)
        .with_timing(5000, 133)
        .with_quad_enable(0x02, StatusLayout::Combined)
        .with_features(Features::QUAD);

/// Winbond W25Q64JV-IQ, 8 MiB
pub const W25Q64JV_IQ: FlashDevice =
    FlashDevice::new("W25Q64JV-IQ", JedecId::new(0xEF, 0x40, 0x17), 8 * MIB)
        .with_timing(5000, 133)
        .with_quad_enable(0x02, StatusLayout::Combined)
        .with_features(Features::QUAD);

/// Winbond W25Q128JV-SQ, 16 MiB
pub const W25Q128JV_SQ: FlashDevice =
    FlashDevice::new("W25Q128JV-SQ", JedecId::new(0xEF, 0x40, 0x18), 16 * MIB)
        .with_timing(5000, 133)
        .with_quad_enable(0x02, StatusLayout::Combined)
        .with_features(Features::QUAD);

/// Macronix MX25R6435F, 8 MiB
///
/// Powers up in low-power mode, limited to 8 MHz.
pub const MX25R6435F: FlashDevice =
    FlashDevice::new("MX25R6435F", JedecId::new(0xC2, 0x28, 0x17), 8 * MIB)
        .with_timing(5000, 8)
        .with_quad_enable(0x40, StatusLayout::SingleByte)
        .with_features(Features::QUAD);

/// Adesto AT25DF081A, 1 MiB
pub const AT25DF081A: FlashDevice =
    FlashDevice::new("AT25DF081A", JedecId::new(0x1F, 0x45, 0x02), MIB)
        .with_timing(10000, 85)
        .with_features(Features::FAST_READ.union(Features::SECTOR_PROTECTION));

/// Adesto AT25SF041, 512 KiB
pub const AT25SF041: FlashDevice =
    FlashDevice::new("AT25SF041", JedecId::new(0x1F, 0x84, 0x01), 512 * KIB)
        .with_timing(10000, 104)
        .with_quad_enable(0x02, StatusLayout::Combined)
        .with_features(Features::FAST_READ.union(Features::QSPI));

/// Every built-in device, in match order
#[cfg(feature = "builtin-devices")]
pub static KNOWN_DEVICES: [FlashDevice; 14] = [
    GD25Q16C,
    GD25Q32C,
    GD25Q64C,
    S25FL116K,
    S25FL216K,
    W25Q16FW,
    W25Q16JV_IQ,
    W25Q32BV,
    W25Q32JV_IM,
    W25Q64JV_IQ,
    W25Q128JV_SQ,
    MX25R6435F,
    AT25DF081A,
    AT25SF041,
];

/// Find the first device in `devices` whose JEDEC ID matches exactly
pub fn find_by_jedec(devices: &[FlashDevice], id: JedecId) -> Option<&FlashDevice> {
    devices.iter().find(|d| d.matches_jedec_id(id))
}

/// Find a built-in device by JEDEC ID
#[cfg(feature = "builtin-devices")]
pub fn find_known(id: JedecId) -> Option<&'static FlashDevice> {
    find_by_jedec(&KNOWN_DEVICES, id)
}
