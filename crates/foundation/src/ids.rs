use std::fmt;

/// Identifies one render job on the external renderer.
///
/// The renderer hands out timestamps, so a larger token always belongs to a
/// later render job. Negative wire values mean the trigger failed and never
/// become a token.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderToken(u64);

impl RenderToken {
    pub fn new(n: u64) -> Self {
        RenderToken(n)
    }

    pub fn from_wire(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().map(RenderToken)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_newer_than(self, other: Option<RenderToken>) -> bool {
        other.is_none_or(|o| self > o)
    }
}

impl fmt::Display for RenderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::RenderToken;

    #[test]
    fn negative_wire_value_is_not_a_token() {
        assert_eq!(RenderToken::from_wire(-1), None);
        assert_eq!(RenderToken::from_wire(0), Some(RenderToken::new(0)));
        assert_eq!(RenderToken::from_wire(7), Some(RenderToken::new(7)));
    }

    #[test]
    fn freshness_is_strict() {
        let a = RenderToken::new(5);
        assert!(a.is_newer_than(None));
        assert!(a.is_newer_than(Some(RenderToken::new(4))));
        assert!(!a.is_newer_than(Some(a)));
        assert!(!a.is_newer_than(Some(RenderToken::new(9))));
    }
}
