//! Consistency policies selectable at startup.

use std::str::FromStr;

/// How stock is checked when a cart draws it down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// Availability is checked against the item read before the cart
    /// mutation; the later decrement is unconditional, so concurrent carts
    /// can oversell.
    #[default]
    Optimistic,

    /// The worker applies decrements only if enough stock remains at write
    /// time, failing the request otherwise.
    Guarded,
}

/// What happens when one half of a cart/inventory dual write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DualWritePolicy {
    /// Report the error and leave the successful half in place.
    #[default]
    AcceptPartial,

    /// Undo the successful half, then report the error.
    Compensate,
}

impl StockPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockPolicy::Optimistic => "optimistic",
            StockPolicy::Guarded => "guarded",
        }
    }
}

impl DualWritePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DualWritePolicy::AcceptPartial => "accept_partial",
            DualWritePolicy::Compensate => "compensate",
        }
    }
}

impl FromStr for StockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(StockPolicy::Optimistic),
            "guarded" => Ok(StockPolicy::Guarded),
            other => Err(format!("unknown stock policy '{other}'")),
        }
    }
}

impl FromStr for DualWritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept_partial" | "accept-partial" => Ok(DualWritePolicy::AcceptPartial),
            "compensate" => Ok(DualWritePolicy::Compensate),
            other => Err(format!("unknown dual-write policy '{other}'")),
        }
    }
}

impl std::fmt::Display for StockPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for DualWritePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
