//! Binary-coded decimal conversion.

/// Decompose a byte into its decimal digits `[hundreds, tens, ones]`.
///
/// Every digit is in the range 0-9.
#[inline]
#[rustfmt::skip]
pub fn to_decimal_digits(value: u8) -> [u8; 3] {
    [
        value / 100,
        value / 10  % 10,
        value       % 10,
    ]
}
