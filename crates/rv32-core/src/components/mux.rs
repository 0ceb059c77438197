use crate::{BitVector, Fault};

/// A `choices`-way multiplexer over `width`-bit inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mux {
    choices: usize,
    width: usize,
}

impl Mux {
    /// Declares the mux shape.
    #[must_use]
    pub const fn new(choices: usize, width: usize) -> Self {
        Self { choices, width }
    }

    /// Forwards `inputs[select]`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MuxInputCount`] or [`Fault::MuxWidthMismatch`] when
    /// the inputs do not match the declared shape, and
    /// [`Fault::MuxSelectOutOfRange`] for a select past the last input.
    pub fn tick(&self, inputs: &[BitVector], select: BitVector) -> Result<BitVector, Fault> {
        if inputs.len() != self.choices {
            return Err(Fault::MuxInputCount {
                expected: self.choices,
                found: inputs.len(),
            });
        }
        if let Some((index, input)) = inputs
            .iter()
            .enumerate()
            .find(|(_, input)| input.width() != self.width)
        {
            return Err(Fault::MuxWidthMismatch {
                index,
                expected: self.width,
                found: input.width(),
            });
        }
        usize::try_from(select.to_u64())
            .ok()
            .and_then(|index| inputs.get(index))
            .copied()
            .ok_or(Fault::MuxSelectOutOfRange {
                select: select.to_u64(),
                choices: self.choices,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::Mux;
    use crate::{BitVector, Fault};

    #[test]
    fn select_picks_the_input() {
        let mux = Mux::new(3, 32);
        let inputs = [1, 2, 3].map(BitVector::from_u32);
        let select = BitVector::from_u64(2, 2).unwrap();
        assert_eq!(mux.tick(&inputs, select), Ok(BitVector::from_u32(3)));
    }

    #[test]
    fn out_of_range_select_is_never_clamped() {
        let mux = Mux::new(3, 32);
        let inputs = [1, 2, 3].map(BitVector::from_u32);
        let select = BitVector::from_u64(3, 2).unwrap();
        assert_eq!(
            mux.tick(&inputs, select),
            Err(Fault::MuxSelectOutOfRange {
                select: 3,
                choices: 3
            })
        );
    }

    #[test]
    fn inputs_must_match_the_declared_shape() {
        let mux = Mux::new(2, 32);
        let select = BitVector::from_bool(false);
        assert!(matches!(
            mux.tick(&[BitVector::from_u32(0)], select),
            Err(Fault::MuxInputCount { .. })
        ));
        assert_eq!(
            mux.tick(&[BitVector::from_u32(0), BitVector::from_bool(true)], select),
            Err(Fault::MuxWidthMismatch {
                index: 1,
                expected: 32,
                found: 1
            })
        );
    }
}
