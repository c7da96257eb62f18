/// A 64-bit unsigned value.
///
/// All arithmetic is modular 2^64. There is no signed or floating-point
/// variant — both are out of scope for this VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Value(pub u64);

impl Value {
    pub const ZERO: Value = Value(0);

    #[inline]
    pub fn from_bool(b: bool) -> Value {
        Value(if b { 1 } else { 0 })
    }

    #[inline]
    pub fn is_truthy(self) -> bool {
        self.0 != 0
    }

    #[inline]
    pub fn wrapping_add(self, rhs: Value) -> Value {
        Value(self.0.wrapping_add(rhs.0))
    }

    #[inline]
    pub fn wrapping_sub(self, rhs: Value) -> Value {
        Value(self.0.wrapping_sub(rhs.0))
    }

    #[inline]
    pub fn wrapping_mul(self, rhs: Value) -> Value {
        Value(self.0.wrapping_mul(rhs.0))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Value {
        Value(n)
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Value {
        Value(n as u64)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_arithmetic_wraps_at_2_64() {
        let max = Value(u64::MAX);
        assert_eq!(max.wrapping_add(Value(1)), Value(0));
        assert_eq!(Value(0).wrapping_sub(Value(1)), max);
    }

    #[test]
    fn truthiness_matches_nonzero() {
        assert!(!Value::ZERO.is_truthy());
        assert!(Value(1).is_truthy());
        assert!(Value::from_bool(true).is_truthy());
        assert!(!Value::from_bool(false).is_truthy());
    }
}
