//! Joining fragments into one request and splitting the response back.
//!
//! Many backends strip whitespace around each line, so a bare newline cannot
//! survive as a separator. Fragments are joined with `"\n###\n"` and the
//! response is split on the separator without its newlines.

/// Separator placed between fragments of a joined request
pub const TEXTBLK_BREAK: &str = "\n###\n";

/// Joins and splits fragment batches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCodec {
    separator: String,
}

impl Default for BatchCodec {
    fn default() -> Self {
        Self::new(TEXTBLK_BREAK)
    }
}

impl BatchCodec {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Join fragments with the separator between consecutive entries
    pub fn join<S: AsRef<str>>(&self, fragments: &[S]) -> String {
        let mut joined = String::new();
        for (i, fragment) in fragments.iter().enumerate() {
            if i > 0 {
                joined.push_str(&self.separator);
            }
            joined.push_str(fragment.as_ref());
        }
        joined
    }

    /// Split a backend response into trimmed fragments.
    ///
    /// A separator made only of newlines strips down to nothing, in which case
    /// the response is split on a bare newline.
    pub fn split(&self, text: &str) -> Vec<String> {
        let breaker = self.separator.replace('\n', "");
        let breaker = if breaker.is_empty() { "\n" } else { breaker.as_str() };
        text.split(breaker).map(|part| part.trim().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_join_uses_separator_between_fragments() {
        let codec = BatchCodec::default();
        assert_eq!(codec.join(&["a", "b", "c"]), "a\n###\nb\n###\nc");
        assert_eq!(codec.join(&["only"]), "only");
        assert_eq!(codec.join::<&str>(&[]), "");
    }

    #[test]
    fn test_split_restores_trimmed_fragments() {
        let codec = BatchCodec::default();
        let fragments = vec!["  hello ", "world\n", "\tsecond line\nthird"];
        let split = codec.split(&codec.join(&fragments));
        assert_eq!(split, vec!["hello", "world", "second line\nthird"]);
    }

    #[test]
    fn test_split_survives_stripped_newlines() {
        // Backends that eat the newlines around the marker still split correctly
        let codec = BatchCodec::default();
        assert_eq!(codec.split("HELLO###WORLD"), vec!["HELLO", "WORLD"]);
        assert_eq!(codec.split("HELLO ### WORLD"), vec!["HELLO", "WORLD"]);
    }

    #[test]
    fn test_split_keeps_empty_fragments() {
        let codec = BatchCodec::default();
        let fragments = ["a", "", "c"];
        assert_eq!(codec.split(&codec.join(&fragments)), vec!["a", "", "c"]);
    }

    #[test]
    fn test_newline_only_separator_splits_on_newline() {
        let codec = BatchCodec::new("\n\n");
        assert_eq!(codec.split("a\nb"), vec!["a", "b"]);
        // Joined with a double newline, so an empty fragment appears in between
        assert_eq!(codec.split(&codec.join(&["a", "b"])), vec!["a", "", "b"]);
    }

    #[test]
    fn test_mangled_separator_changes_count() {
        let codec = BatchCodec::default();
        assert_eq!(codec.split("a\n# # #\nb").len(), 1);
    }

    #[test]
    fn test_round_trip_table() {
        let codec = BatchCodec::default();
        let cases: &[&[&str]] = &[
            &["single"],
            &["", ""],
            &[" leading", "trailing ", "\nwrapped\n"],
            &["# heading", "## sub", "a#b"],
            &["line one\nline two", "\t"],
        ];
        for fragments in cases {
            let expected: Vec<String> = fragments.iter().map(|f| f.trim().to_string()).collect();
            assert_eq!(codec.split(&codec.join(fragments)), expected, "fragments: {fragments:?}");
        }
    }

    /// Fragments that never contain the `###` marker
    fn fragment_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 #\n\t.,!?]{0,30}".prop_filter("contains marker", |f| !f.contains("###"))
    }

    proptest! {
        #[test]
        fn test_join_then_split_yields_trimmed_fragments(
            fragments in prop::collection::vec(fragment_strategy(), 1..10)
        ) {
            let codec = BatchCodec::default();
            let expected: Vec<String> = fragments.iter().map(|f| f.trim().to_string()).collect();
            prop_assert_eq!(codec.split(&codec.join(&fragments)), expected);
        }
    }
}
