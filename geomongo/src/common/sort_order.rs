/// Specifies the direction for sorting features.
///
/// The native query form of a sort uses `1` for ascending and `-1` for
/// descending, see [SortOrder::native].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A)
    Descending,
}

impl SortOrder {
    /// Returns the native sort direction.
    pub fn native(&self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }

    /// Parses a native sort direction; any negative number is descending.
    pub fn from_native(direction: i64) -> SortOrder {
        if direction < 0 {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }
}
