use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between the NTP epoch (1900) and the UNIX epoch.
const NTP_UNIX_EPOCH_DIFF: u64 = 2_208_988_800;

/// Current wall clock as an NTP timestamp `(seconds, fraction)`.
#[must_use]
pub fn ntp_now() -> (u32, u32) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    let secs = now.as_secs() + NTP_UNIX_EPOCH_DIFF;
    let frac = (u64::from(now.subsec_nanos()) << 32) / 1_000_000_000;
    #[allow(clippy::cast_possible_truncation)]
    (secs as u32, frac as u32)
}

/// Middle 32 bits of an NTP timestamp, as used by LSR and DLSR.
#[must_use]
pub fn ntp_compact(secs: u32, frac: u32) -> u32 {
    ((secs & 0xFFFF) << 16) | (frac >> 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_takes_middle_bits() {
        assert_eq!(ntp_compact(0x1234_5678, 0x9ABC_DEF0), 0x5678_9ABC);
    }

    #[test]
    fn now_is_after_2020() {
        let (secs, _) = ntp_now();
        // 2020-01-01 in NTP seconds.
        assert!(secs > 3_786_825_600);
    }
}
