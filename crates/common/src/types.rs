use serde::{Deserialize, Serialize};

/// Amount of credit, in whole currency units.
pub type Amount = u64;

/// Identifier of an order.
///
/// Order ids are positions in the order tracker's append-only log, so they are
/// assigned sequentially starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Creates an order id from a raw log position.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the log index this id refers to, or `None` if it does not fit
    /// in a `usize` on this target.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Identifier of a user owning orders and a credit account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_index_matches_raw_value() {
        let id = OrderId::new(7);
        assert_eq!(id.as_u64(), 7);
        assert_eq!(id.index(), Some(7));
    }

    #[test]
    #[cfg(target_pointer_width = "32")]
    fn order_id_index_out_of_range() {
        assert_eq!(OrderId::new(u64::MAX).index(), None);
    }

    #[test]
    fn ids_order_by_raw_value() {
        assert!(OrderId::new(1) < OrderId::new(2));
        assert!(UserId::from(3) > UserId::from(2));
    }

    #[test]
    fn ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&OrderId::new(42)).unwrap(), "42");
        let user: UserId = serde_json::from_str("9").unwrap();
        assert_eq!(user, UserId::new(9));
    }

    #[test]
    fn display_shows_raw_value() {
        assert_eq!(OrderId::new(3).to_string(), "3");
        assert_eq!(UserId::new(11).to_string(), "11");
    }
}
