//! 8-bit XOR checksum.
//!
//! Seed `0x00`; each byte of header and payload, in order, is folded in with
//! XOR. No finalization step, no lookup tables.

/// Running checksum state.
///
/// `Crc` is a thin wrapper around a single `u8` so callers can fold bytes in
/// one at a time (as the [`super::parser::Parser`] does, byte by byte) or all
/// at once via [`Crc::of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Crc(u8);

impl Crc {
    /// Seed value per spec: `0x00`.
    pub const SEED: u8 = 0x00;

    /// New checksum at the seed value.
    #[must_use]
    pub const fn new() -> Self {
        Self(Self::SEED)
    }

    /// Fold one byte into the running checksum.
    #[must_use]
    pub const fn update(self, byte: u8) -> Self {
        Self(self.0 ^ byte)
    }

    /// Current checksum value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Fold an entire slice in at once, in order.
    #[must_use]
    pub fn of(bytes: &[u8]) -> u8 {
        bytes.iter().fold(Self::new(), |crc, &b| crc.update(b)).value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_zero() {
        assert_eq!(Crc::new().value(), 0x00);
    }

    #[test]
    fn update_is_xor_fold() {
        let crc = Crc::new().update(0x01).update(0x02).update(0x01).update(0x00);
        assert_eq!(crc.value(), 0x01 ^ 0x02 ^ 0x01 ^ 0x00);
    }

    #[test]
    fn of_matches_incremental_update() {
        let bytes = [0x12, 0x34, 0x56, 0x78];
        let incremental = bytes.iter().fold(Crc::new(), |c, &b| c.update(b)).value();
        assert_eq!(Crc::of(&bytes), incremental);
    }

    #[test]
    fn xor_is_its_own_inverse() {
        let crc = Crc::new().update(0xAA);
        assert_eq!(crc.update(0xAA).value(), Crc::SEED);
    }
}
