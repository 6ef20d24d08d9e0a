//! Configuration options for TSON serialization.
//!
//! [`TsonSettings`] controls the layout of the output and which record members
//! are written:
//!
//! - `use_indentation`: tab-indented, one child per line (otherwise compact)
//! - `check_member_attributes`: honor the [`Ignored`](crate::Ignored) member marker
//! - `ignore_null_values`: skip members whose value is null (`None`, `()`)
//! - `ignore_default_values`: skip members holding their type's zero/empty value
//!
//! ## Examples
//!
//! ```rust
//! use serde_tson::{to_string_with_settings, TsonSettings};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Data { x: i32, label: Option<String> }
//!
//! let data = Data { x: 1, label: None };
//!
//! let settings = TsonSettings::new().with_ignore_null_values(true);
//! let tson = to_string_with_settings(&data, settings).unwrap();
//! assert_eq!(tson, "{x:1}");
//! ```

/// Settings applied while encoding a value.
///
/// # Examples
///
/// ```rust
/// use serde_tson::TsonSettings;
///
/// // Compact single-line output
/// let settings = TsonSettings::new();
/// assert!(!settings.use_indentation);
///
/// // Tab-indented output
/// let settings = TsonSettings::pretty();
/// assert!(settings.use_indentation);
///
/// // Custom configuration
/// let settings = TsonSettings::new()
///     .with_ignore_null_values(true)
///     .with_ignore_default_values(true);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TsonSettings {
    pub use_indentation: bool,
    pub check_member_attributes: bool,
    pub ignore_null_values: bool,
    pub ignore_default_values: bool,
}

impl Default for TsonSettings {
    fn default() -> Self {
        TsonSettings {
            use_indentation: false,
            check_member_attributes: true,
            ignore_null_values: false,
            ignore_default_values: false,
        }
    }
}

impl TsonSettings {
    /// Creates default settings (compact output, member markers honored,
    /// nothing omitted).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::TsonSettings;
    ///
    /// let settings = TsonSettings::new();
    /// assert!(settings.check_member_attributes);
    /// assert!(!settings.ignore_null_values);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates settings for tab-indented output.
    #[must_use]
    pub fn pretty() -> Self {
        TsonSettings {
            use_indentation: true,
            ..Default::default()
        }
    }

    /// Settings used for the shared record of a record file: nulls and
    /// defaults are left out so they never overwrite instance members.
    #[must_use]
    pub(crate) fn for_shared(self) -> Self {
        TsonSettings {
            ignore_null_values: true,
            ignore_default_values: true,
            ..self
        }
    }

    /// Enables or disables tab-indented output.
    #[must_use]
    pub fn with_indentation(mut self, enabled: bool) -> Self {
        self.use_indentation = enabled;
        self
    }

    /// Enables or disables the [`Ignored`](crate::Ignored) member marker.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tson::{to_string_with_settings, Ignored, TsonSettings};
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct Session { user: String, token: Ignored<String> }
    ///
    /// let s = Session { user: "ann".into(), token: Ignored::new("t0k".into()) };
    ///
    /// let hidden = to_string_with_settings(&s, TsonSettings::new()).unwrap();
    /// assert_eq!(hidden, "{user:\"ann\"}");
    ///
    /// let shown = TsonSettings::new().with_check_member_attributes(false);
    /// let all = to_string_with_settings(&s, shown).unwrap();
    /// assert_eq!(all, "{user:\"ann\",token:\"t0k\"}");
    /// ```
    #[must_use]
    pub fn with_check_member_attributes(mut self, enabled: bool) -> Self {
        self.check_member_attributes = enabled;
        self
    }

    /// Skips record members whose value is null.
    #[must_use]
    pub fn with_ignore_null_values(mut self, enabled: bool) -> Self {
        self.ignore_null_values = enabled;
        self
    }

    /// Skips record members whose value is their type's zero/empty value.
    ///
    /// Zero numbers, `False`, the empty string, `'\0'`, the first enum variant,
    /// the Unix epoch and null all count as default. Composite values never do.
    #[must_use]
    pub fn with_ignore_default_values(mut self, enabled: bool) -> Self {
        self.ignore_default_values = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_settings_keep_layout() {
        let shared = TsonSettings::pretty().for_shared();
        assert!(shared.use_indentation);
        assert!(shared.ignore_null_values);
        assert!(shared.ignore_default_values);
        assert!(shared.check_member_attributes);
    }
}
