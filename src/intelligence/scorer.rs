use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::models::{WalletStat, WhaleHistoryEntry};

// ---------------------------------------------------------------------------
// Success rate
// ---------------------------------------------------------------------------

/// Fewer windowed entries than this yields the neutral rate.
pub const MIN_WINDOW_ENTRIES: usize = 3;

/// Not enough evidence.
pub const NEUTRAL_SUCCESS_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Buys outnumber sells in the window.
pub const FAVOURABLE_SUCCESS_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 1);

/// Sells match or outnumber buys in the window.
pub const UNFAVOURABLE_SUCCESS_RATE: Decimal = Decimal::from_parts(3, 0, 0, false, 1);

/// Binary success-rate heuristic over the history entries touching `address`
/// within `[now - window_hours, now]`.
///
/// Downstream thresholds are calibrated to the three constants above, so the
/// mapping is intentionally not a continuous function of the buy/sell ratio.
pub fn success_rate<'a, I>(
    entries: I,
    address: &str,
    window_hours: i64,
    now: DateTime<Utc>,
) -> Decimal
where
    I: IntoIterator<Item = &'a WhaleHistoryEntry>,
{
    let window_start = now - Duration::hours(window_hours);

    let mut windowed = 0usize;
    let mut buys = 0usize;
    let mut sells = 0usize;

    for entry in entries {
        if !entry.touches(address) || entry.timestamp < window_start || entry.timestamp > now {
            continue;
        }
        windowed += 1;
        if entry.is_buy {
            buys += 1;
        }
        if entry.is_sell {
            sells += 1;
        }
    }

    if windowed < MIN_WINDOW_ENTRIES {
        return NEUTRAL_SUCCESS_RATE;
    }

    if buys > sells {
        FAVOURABLE_SUCCESS_RATE
    } else {
        UNFAVOURABLE_SUCCESS_RATE
    }
}

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

/// Volume at which the volume component saturates (USD).
const VOLUME_SATURATION: i64 = 1_000_000;

/// Transaction count at which the frequency component saturates.
const FREQUENCY_SATURATION: i64 = 50;

/// Activity within this many hours earns the full recency component.
const RECENCY_WINDOW_HOURS: i64 = 24;

/// Weighted composite of success rate (0.4), volume (0.3), frequency (0.2)
/// and recency (0.1). Every component is clamped to [0, 1] before weighting,
/// so the result stays in [0, 1].
pub fn confidence(stat: &WalletStat, success_rate: Decimal, now: DateTime<Utc>) -> Decimal {
    let success_score = clamp_unit(success_rate);
    let volume_score = clamp_unit(stat.total_volume / Decimal::from(VOLUME_SATURATION));
    let frequency_score =
        clamp_unit(Decimal::from(stat.transaction_count) / Decimal::from(FREQUENCY_SATURATION));
    let recency_score = if now - stat.last_activity <= Duration::hours(RECENCY_WINDOW_HOURS) {
        Decimal::ONE
    } else {
        Decimal::new(5, 1)
    };

    success_score * Decimal::new(4, 1)
        + volume_score * Decimal::new(3, 1)
        + frequency_score * Decimal::new(2, 1)
        + recency_score * Decimal::new(1, 1)
}

fn clamp_unit(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const WHALE: &str = "0xwhale";

    fn entry(is_buy: bool, is_sell: bool, hours_ago: i64, now: DateTime<Utc>) -> WhaleHistoryEntry {
        WhaleHistoryEntry {
            tx_hash: format!("0x{hours_ago}{is_buy}{is_sell}"),
            from: WHALE.into(),
            to: "0xrouter".into(),
            usd_value: Decimal::from(500_000),
            is_buy,
            is_sell,
            timestamp: now - Duration::hours(hours_ago),
        }
    }

    fn stat(volume: i64, count: u64, hours_since_active: i64, now: DateTime<Utc>) -> WalletStat {
        let mut s = WalletStat::new(WHALE, now - Duration::hours(hours_since_active));
        s.total_volume = Decimal::from(volume);
        s.transaction_count = count;
        s
    }

    #[test]
    fn test_success_rate_neutral_below_three_entries() {
        let now = Utc::now();
        let entries = vec![entry(true, false, 1, now), entry(true, false, 2, now)];
        assert_eq!(success_rate(&entries, WHALE, 24, now), Decimal::new(5, 1));
    }

    #[test]
    fn test_success_rate_favourable_when_buys_exceed_sells() {
        let now = Utc::now();
        let entries = vec![
            entry(true, false, 1, now),
            entry(true, false, 2, now),
            entry(false, true, 3, now),
        ];
        assert_eq!(success_rate(&entries, WHALE, 24, now), Decimal::new(8, 1));
    }

    #[test]
    fn test_success_rate_unfavourable_on_tie() {
        let now = Utc::now();
        // Mirrored classification: every swap is both a buy and a sell.
        let entries = vec![
            entry(true, true, 1, now),
            entry(true, true, 2, now),
            entry(true, true, 3, now),
        ];
        assert_eq!(success_rate(&entries, WHALE, 24, now), Decimal::new(3, 1));
    }

    #[test]
    fn test_success_rate_ignores_entries_outside_window() {
        let now = Utc::now();
        let entries = vec![
            entry(true, false, 1, now),
            entry(true, false, 30, now),
            entry(true, false, 40, now),
        ];
        // Only one entry is inside the 24h window
        assert_eq!(success_rate(&entries, WHALE, 24, now), NEUTRAL_SUCCESS_RATE);
    }

    #[test]
    fn test_success_rate_ignores_other_addresses() {
        let now = Utc::now();
        let mut other = entry(true, false, 1, now);
        other.from = "0xsomeoneelse".into();
        other.to = "0xrouter".into();
        let entries = vec![other.clone(), other.clone(), other];
        assert_eq!(success_rate(&entries, WHALE, 24, now), NEUTRAL_SUCCESS_RATE);
    }

    #[test]
    fn test_confidence_weights() {
        let now = Utc::now();
        // volume 500k → 0.5, count 25 → 0.5, recent → 1.0
        let s = stat(500_000, 25, 1, now);
        let c = confidence(&s, Decimal::new(8, 1), now);
        // 0.8*0.4 + 0.5*0.3 + 0.5*0.2 + 1.0*0.1 = 0.32 + 0.15 + 0.10 + 0.10
        assert_eq!(c, Decimal::new(67, 2));
    }

    #[test]
    fn test_confidence_stale_wallet_gets_half_recency() {
        let now = Utc::now();
        let s = stat(0, 0, 48, now);
        let c = confidence(&s, Decimal::ZERO, now);
        assert_eq!(c, Decimal::new(5, 2));
    }

    #[test]
    fn test_confidence_is_bounded_for_saturated_inputs() {
        let now = Utc::now();
        let s = stat(50_000_000, 10_000, 0, now);
        // An out-of-range success rate must not push the score above 1
        let c = confidence(&s, Decimal::from(3), now);
        assert_eq!(c, Decimal::ONE);

        let c = confidence(&s, Decimal::from(-2), now);
        assert!(c >= Decimal::ZERO && c <= Decimal::ONE);
    }
}
