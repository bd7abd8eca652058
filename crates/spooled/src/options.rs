use std::path::PathBuf;

/// Configuration for a [`SpooledBuffer`](crate::SpooledBuffer).
///
/// # Examples
///
/// ```rust
/// use spooled::{SpoolOptions, SpooledBytes};
///
/// let options = SpoolOptions {
///     max_size: Some(64 * 1024),
///     ..Default::default()
/// };
/// let buffer = SpooledBytes::with_options(options);
/// assert!(!buffer.is_rolled_over());
/// ```
///
/// # Default
///
/// Unbounded and memory-only, rolling over into the platform temp directory
/// if [`rollover`](crate::SpooledBuffer::rollover) is called explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpoolOptions {
    /// Content length, in bytes, above which a write moves the buffer to a
    /// temporary file.
    ///
    /// A buffer holding exactly `max_size` bytes stays in memory; one more
    /// byte triggers the rollover. `None` and `Some(0)` disable automatic
    /// rollover.
    ///
    /// # Default
    ///
    /// `None`
    pub max_size: Option<u64>,

    /// Directory in which the rollover file is created.
    ///
    /// The file is anonymous where the platform allows it and is deleted when
    /// the buffer is closed or dropped.
    ///
    /// # Default
    ///
    /// `None`, meaning [`std::env::temp_dir`].
    pub temp_dir: Option<PathBuf>,
}

impl SpoolOptions {
    /// The effective rollover threshold, if automatic rollover is enabled.
    pub(crate) fn threshold(&self) -> Option<u64> {
        self.max_size.filter(|&max| max > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::SpoolOptions;

    #[test]
    fn zero_max_size_disables_rollover() {
        let options = SpoolOptions {
            max_size: Some(0),
            ..Default::default()
        };
        assert_eq!(options.threshold(), None);
        assert_eq!(SpoolOptions::default().threshold(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializes_with_defaults() {
        let options: SpoolOptions = serde_json::from_str(r#"{"max_size": 1024}"#).unwrap();
        assert_eq!(options.max_size, Some(1024));
        assert_eq!(options.temp_dir, None);
    }
}
