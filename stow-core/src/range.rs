use crate::Value;

/// A window over a result set, `OFFSET location LIMIT length`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub location: u64,
    pub length: u64,
}

impl Range {
    pub const ZERO: Range = Range {
        location: 0,
        length: 0,
    };
    /// Marks a window that was never set.
    pub const INVALID: Range = Range {
        location: u64::MAX,
        length: 0,
    };

    pub const fn new(location: u64, length: u64) -> Self {
        Self { location, length }
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Position just past the window.
    pub fn end(&self) -> u64 {
        self.location.saturating_add(self.length)
    }

    /// The `[offset, limit]` statement arguments.
    pub fn args(&self) -> [Value; 2] {
        [
            Value::UInt64(Some(self.location)),
            Value::UInt64(Some(self.length)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::Range;
    use crate::Value;

    #[test]
    fn window() {
        let range = Range::new(20, 10);
        assert_eq!(range.end(), 30);
        assert!(range.is_valid());
        assert!(!Range::INVALID.is_valid());
        assert_eq!(Range::default(), Range::ZERO);
        assert_eq!(
            range.args(),
            [Value::UInt64(Some(20)), Value::UInt64(Some(10))]
        );
    }
}
