//! Label-set payloads carried by tree nodes.
//!
//! A payload is an ordered sequence of distinct label strings. Its canonical
//! text form joins the labels with [`LABEL_DELIMITER`], which is also the form
//! compared by [`crate::check_duplication`].

use std::fmt;

/// Delimiter used to join labels in a payload string.
pub const LABEL_DELIMITER: char = ',';

/// Reserved label identifying the root node in source trees.
pub const ROOT_LABEL: &str = "root";

/// Ordered set of labels attached to a single node.
///
/// # Examples
/// ```
/// use treeperturb_core::LabelSet;
///
/// let mut labels = LabelSet::parse("a,b");
/// labels.push("c");
/// assert!(labels.remove("a"));
/// assert_eq!(labels.to_string(), "b,c");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Creates an empty payload.
    #[must_use]
    pub const fn new() -> Self {
        Self { labels: Vec::new() }
    }

    /// Parses a delimiter-joined payload, trimming whitespace around labels
    /// and dropping empty entries and repeats.
    ///
    /// # Examples
    /// ```
    /// use treeperturb_core::LabelSet;
    ///
    /// let labels = LabelSet::parse(" x, y,,x ");
    /// assert_eq!(labels.iter().collect::<Vec<_>>(), vec!["x", "y"]);
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.split(LABEL_DELIMITER).collect()
    }

    /// Number of labels in the payload.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` when the payload holds no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns `true` when `label` is part of the payload.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|held| held == label)
    }

    /// Appends `label` unless the payload already holds it.
    ///
    /// Returns `true` when the label was added.
    pub fn push(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if label.is_empty() || self.contains(&label) {
            return false;
        }
        self.labels.push(label);
        true
    }

    /// Removes `label`, returning `true` if it was present.
    pub fn remove(&mut self, label: &str) -> bool {
        let Some(position) = self.labels.iter().position(|held| held == label) else {
            return false;
        };
        self.labels.remove(position);
        true
    }

    /// Exchanges the positions of two labels held by this payload.
    ///
    /// Returns `false` and leaves the payload untouched when either label is
    /// missing.
    pub fn swap_positions(&mut self, left: &str, right: &str) -> bool {
        let left_pos = self.labels.iter().position(|held| held == left);
        let right_pos = self.labels.iter().position(|held| held == right);
        match (left_pos, right_pos) {
            (Some(a), Some(b)) => {
                self.labels.swap(a, b);
                true
            }
            _ => false,
        }
    }

    /// Iterates over the labels in payload order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for label in &self.labels {
            if !first {
                write!(f, "{LABEL_DELIMITER}")?;
            }
            f.write_str(label)?;
            first = false;
        }
        Ok(())
    }
}

impl<S: AsRef<str>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for label in iter {
            set.push(label.as_ref().trim());
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::single("a", &["a"])]
    #[case::several("a,b,c", &["a", "b", "c"])]
    #[case::whitespace(" a , b ", &["a", "b"])]
    #[case::repeat("a,a,b", &["a", "b"])]
    #[case::empty_entries(",a,,", &["a"])]
    #[case::empty("", &[])]
    fn parse_yields_distinct_trimmed_labels(#[case] raw: &str, #[case] expected: &[&str]) {
        let labels = LabelSet::parse(raw);
        assert_eq!(labels.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn push_skips_held_labels() {
        let mut labels = LabelSet::parse("x,y");
        assert!(!labels.push("x"));
        assert!(labels.push("z"));
        assert_eq!(labels.to_string(), "x,y,z");
    }

    #[test]
    fn remove_reports_missing_labels() {
        let mut labels = LabelSet::parse("x,y");
        assert!(!labels.remove("q"));
        assert!(labels.remove("x"));
        assert!(!labels.remove("x"));
        assert_eq!(labels.to_string(), "y");
    }

    #[test]
    fn swap_positions_requires_both_labels() {
        let mut labels = LabelSet::parse("x,y,z");
        assert!(labels.swap_positions("x", "z"));
        assert_eq!(labels.to_string(), "z,y,x");
        assert!(!labels.swap_positions("x", "missing"));
        assert_eq!(labels.to_string(), "z,y,x");
    }

    #[test]
    fn display_matches_source_form() {
        assert_eq!(LabelSet::parse("root").to_string(), ROOT_LABEL);
        assert_eq!(LabelSet::new().to_string(), "");
    }
}
