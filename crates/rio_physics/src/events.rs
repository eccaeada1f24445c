//! Contact reporting

/// Two bodies that are touching right now, by owner id.
///
/// `a` always sorts before `b` so a pair has one canonical form regardless of
/// the order the narrow phase produced it in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    pub a: String,
    pub b: String,
    /// At least one side is a sensor (intersection, no response)
    pub sensor: bool,
}

impl CollisionPair {
    /// Build a pair in canonical order
    pub fn new(first: impl Into<String>, second: impl Into<String>, sensor: bool) -> Self {
        let (first, second) = (first.into(), second.into());
        if first <= second {
            Self { a: first, b: second, sensor }
        } else {
            Self { a: second, b: first, sensor }
        }
    }

    /// Whether either side is `id`
    pub fn involves(&self, id: &str) -> bool {
        self.a == id || self.b == id
    }

    /// The side that is not `id`
    pub fn other(&self, id: &str) -> Option<&str> {
        if self.a == id {
            Some(&self.b)
        } else if self.b == id {
            Some(&self.a)
        } else {
            None
        }
    }
}
