//! Core value types: tick prices, quantities, timestamps, symbols

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::sync::OnceLock;
use std::time::Instant;

/// Price in integer ticks.
///
/// Two sentinel values exist: [`Px::MARKET`] (zero) marks market orders,
/// which bypass the limit-price comparison, and [`Px::INVALID`] marks an
/// absent price. Real prices are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Px(i64);

impl Px {
    /// Sentinel for market orders: no price limit.
    pub const MARKET: Self = Self(0);

    /// Sentinel for "no price".
    pub const INVALID: Self = Self(i64::MAX);

    /// Create a price from a tick count.
    #[must_use]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Price as a tick count.
    #[must_use]
    pub const fn ticks(&self) -> i64 {
        self.0
    }

    /// Whether this is the market-order sentinel.
    #[must_use]
    pub const fn is_market(&self) -> bool {
        self.0 == 0
    }

    /// Price as f64 ticks, for the analytics boundary only.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }
}

impl fmt::Display for Px {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sub for Px {
    type Output = i64;

    fn sub(self, rhs: Self) -> i64 {
        self.0 - rhs.0
    }
}

/// Quantity in lot-granular units. Zero means no remaining size.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Qty(u64);

impl Qty {
    /// Zero quantity.
    pub const ZERO: Self = Self(0);

    /// Create a quantity from raw units.
    #[must_use]
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    /// Quantity as raw units.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Whether the quantity is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtract, clamping at zero.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Quantity as f64 units, for the analytics boundary only.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }
}

impl Add for Qty {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Qty {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Qty {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Qty {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic timestamp in nanoseconds since the first observation in this
/// process. Steady-clock based: never affected by wall-clock adjustments.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Ts(u64);

fn clock_anchor() -> Instant {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    *ANCHOR.get_or_init(Instant::now)
}

impl Ts {
    /// Current monotonic timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(clock_anchor().elapsed().as_nanos() as u64)
    }

    /// Create a timestamp from nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Timestamp as nanoseconds.
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Timestamp as whole seconds, for analytics bucketing.
    #[must_use]
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1e9
    }
}

impl fmt::Display for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// Instrument symbol: fixed 16 bytes, NUL-padded.
///
/// This is the exact representation embedded in feed records, so the type
/// is `Copy` and byte-stable rather than heap-backed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol([u8; 16]);

impl Symbol {
    /// Width of the padded symbol field.
    pub const LEN: usize = 16;

    /// Build a symbol from a string, truncating to 16 bytes.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut bytes = [0u8; Self::LEN];
        let n = name.len().min(Self::LEN);
        bytes[..n].copy_from_slice(&name.as_bytes()[..n]);
        Self(bytes)
    }

    /// Build a symbol from its raw padded bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// The raw padded bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// The symbol text up to the first NUL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(Self::LEN);
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}
