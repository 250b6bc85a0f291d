//! Target representations a caller may request when reading column data.

/// The representation to marshal a value into.
///
/// Mirrors the C-type codes of a call-level interface. Variants without a
/// dedicated conversion rule fall back to the text rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    /// Narrow character text.
    Char,
    /// Wide character text (marshalled identically to [`TargetType::Char`]).
    WChar,
    /// Single-byte boolean.
    Bit,
    /// 32-bit signed integer.
    Long,
    /// 64-bit signed integer.
    BigInt,
    /// 64-bit floating point.
    Double,
    /// Raw bytes; no dedicated rule, renders as text.
    Binary,
    /// Date; no dedicated rule, renders as text.
    Date,
    /// Time of day; no dedicated rule, renders as text.
    Time,
    /// Timestamp; no dedicated rule, renders as text.
    Timestamp,
}

impl TargetType {
    /// Whether this representation is marshalled through the text path.
    #[must_use]
    pub fn is_textual(&self) -> bool {
        !matches!(
            self,
            Self::Bit | Self::Long | Self::BigInt | Self::Double
        )
    }
}
