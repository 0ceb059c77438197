use super::{And, Not, Or};

/// Decides whether the next PC comes from the branch adder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpControl;

impl JumpControl {
    /// `jump | (branch_zero & zero) | (branch_not_zero & !zero)`.
    #[must_use]
    pub fn tick(branch_zero: bool, branch_not_zero: bool, jump: bool, zero: bool) -> bool {
        Or::tick(&[
            jump,
            And::tick(&[branch_zero, zero]),
            And::tick(&[branch_not_zero, Not::tick(zero)]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::JumpControl;
    use rstest::rstest;

    #[rstest]
    #[case(false, false, false, true, false)]
    #[case(false, false, true, false, true)]
    #[case(true, false, false, true, true)]
    #[case(true, false, false, false, false)]
    #[case(false, true, false, false, true)]
    #[case(false, true, false, true, false)]
    fn take_branch(
        #[case] branch_zero: bool,
        #[case] branch_not_zero: bool,
        #[case] jump: bool,
        #[case] zero: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(
            JumpControl::tick(branch_zero, branch_not_zero, jump, zero),
            expected
        );
    }
}
