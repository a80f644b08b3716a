//! Storage codec for genre tags.
//!
//! The schema keeps a venue's or artist's genre tags in a single text column,
//! comma-joined. Everything above the storage boundary works with an ordered
//! `Vec<String>`; this module is the only place that knows about the
//! delimiter. The encoding is lossy if a tag itself contains a comma — tags
//! are free text and this is not validated, matching the stored format.

/// Encode an ordered tag list into the single-column form.
pub fn join(tags: &[String]) -> String {
    tags.join(",")
}

/// Decode the single-column form back into the tag list.
///
/// An empty column decodes to an empty list.
pub fn split(stored: &str) -> Vec<String> {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_join_and_split_round_trip() {
        let list = tags(&["Jazz", "Reggae", "Swing", "Classical", "Folk"]);
        let stored = join(&list);
        assert_eq!(stored, "Jazz,Reggae,Swing,Classical,Folk");
        assert_eq!(split(&stored), list);
    }

    #[test]
    fn test_split_preserves_order() {
        assert_eq!(split("Rock n Roll,Blues"), tags(&["Rock n Roll", "Blues"]));
    }

    #[test]
    fn test_empty_column_is_empty_list() {
        assert!(split("").is_empty());
        assert_eq!(join(&[]), "");
    }

    #[test]
    fn test_single_tag() {
        assert_eq!(split("Classical"), tags(&["Classical"]));
        assert_eq!(join(&tags(&["Classical"])), "Classical");
    }

    #[test]
    fn test_tag_containing_delimiter_is_lossy() {
        // Free-text tags are not validated; a comma inside one splits it.
        let stored = join(&tags(&["Rhythm, and Blues"]));
        assert_eq!(split(&stored), tags(&["Rhythm", " and Blues"]));
    }
}
