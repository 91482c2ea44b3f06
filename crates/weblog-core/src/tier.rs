//! Customer tier predicate.

/// Tier code for the highest customer tier.
pub const DEFAULT_TIER_CODE: &str = "01";

/// Accepts an event when its looked-up tier attribute equals the designated
/// code, ignoring ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierFilter {
    code: String,
}

impl TierFilter {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// An absent attribute never matches.
    pub fn accepts(&self, tier_attribute: Option<&str>) -> bool {
        tier_attribute.is_some_and(|tier| tier.eq_ignore_ascii_case(&self.code))
    }
}

impl Default for TierFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TIER_CODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_designated_code_only() {
        let f = TierFilter::default();
        assert!(f.accepts(Some("01")));
        assert!(!f.accepts(Some("02")));
        assert!(!f.accepts(Some("1")));
        assert!(!f.accepts(Some(" 01")));
        assert!(!f.accepts(Some("")));
        assert!(!f.accepts(None));
    }

    #[test]
    fn comparison_ignores_case() {
        let f = TierFilter::new("vip");
        assert!(f.accepts(Some("VIP")));
        assert!(f.accepts(Some("Vip")));
        assert!(!f.accepts(Some("vvip")));
    }
}
