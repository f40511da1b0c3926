/// Rounds `ix` up to the next multiple of `alignment`, which must be a power of 2.
/// DBus only ever asks for 1, 2, 4 or 8.
pub(crate) fn align(ix: usize, alignment: usize) -> usize {
    debug_assert!(
        alignment.is_power_of_two(),
        "{} is not power of 2, cannot be used as alignment",
        alignment
    );
    let mask = alignment - 1;
    (ix + mask) & !mask
}

/// Number of zero bytes needed to bring `ix` up to `alignment`.
pub(crate) fn padding(ix: usize, alignment: usize) -> usize {
    align(ix, alignment) - ix
}

#[cfg(test)]
mod tests {
    use crate::align::{align, padding};

    #[test]
    fn alignment() {
        assert_eq!(align(23, 4), 24);
        assert_eq!(align(32, 8), 32);
        assert_eq!(align(31, 1), 31);
        assert_eq!(align(0, 8), 0);
        assert_eq!(align(9, 2), 10);
    }

    #[test]
    fn padding_after_string() {
        // "Hi": 4 byte length, 2 bytes, nul
        assert_eq!(padding(7, 8), 1);
        assert_eq!(padding(27, 8), 5);
        assert_eq!(padding(16, 4), 0);
    }
}
