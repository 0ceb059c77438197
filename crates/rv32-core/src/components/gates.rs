/// N-input AND gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct And;

impl And {
    /// `true` when every input is set; `true` for no inputs.
    #[must_use]
    pub fn tick(inputs: &[bool]) -> bool {
        inputs.iter().all(|input| *input)
    }
}

/// N-input OR gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Or;

impl Or {
    /// `true` when any input is set.
    #[must_use]
    pub fn tick(inputs: &[bool]) -> bool {
        inputs.iter().any(|input| *input)
    }
}

/// Inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Not;

impl Not {
    /// `!input`.
    #[must_use]
    pub const fn tick(input: bool) -> bool {
        !input
    }
}

#[cfg(test)]
mod tests {
    use super::{And, Not, Or};

    #[test]
    fn gates_follow_their_truth_tables() {
        assert!(And::tick(&[true, true, true]));
        assert!(!And::tick(&[true, false]));
        assert!(Or::tick(&[false, false, true]));
        assert!(!Or::tick(&[]));
        assert!(Not::tick(false));
    }
}
