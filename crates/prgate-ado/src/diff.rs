//! Positional unified-diff synthesis from blob pairs.
//!
//! The service exposes per-file blob content rather than server-side
//! diffs, so the diff view is reconstructed locally. The aligner walks
//! both sides by identical line index; it is deliberately not
//! content-aware. A line inserted at the top of a file therefore renders
//! every subsequent line as a remove/add pair instead of a clean
//! insertion. This trades diff minimality for a total, allocation-cheap
//! function with no edit-distance machinery.

use std::fmt::Write;

/// Synthesize a unified-diff text block for one file.
///
/// Either side may be empty, representing a pure add or delete. The
/// function is total over any two strings: both sides empty yields the
/// two header lines and no hunks.
///
/// At most one hunk header is emitted per file, at the first divergent
/// line, carrying that line's 1-based index and the *full* line counts
/// of each side rather than the changed-span length. Later divergence
/// runs continue under the same header.
///
/// # Examples
///
/// ```
/// use prgate_ado::diff::synthesize;
///
/// let diff = synthesize("/src/a.cs", "a\nb", "x\nb");
/// assert!(diff.starts_with("--- a/src/a.cs\n+++ b/src/a.cs\n"));
/// assert!(diff.contains("@@ -1,2 +1,2 @@"));
/// assert!(diff.contains("-a\n+x\n"));
/// ```
pub fn synthesize(path: &str, original: &str, modified: &str) -> String {
    let mut diff = format!("--- a{path}\n+++ b{path}\n");

    // Splitting "" yields [""], which would render a bogus blank line.
    if original.is_empty() && modified.is_empty() {
        return diff;
    }

    let original_lines: Vec<&str> = original.split('\n').collect();
    let modified_lines: Vec<&str> = modified.split('\n').collect();

    let max_lines = original_lines.len().max(modified_lines.len());
    let mut hunk_open = false;

    for i in 0..max_lines {
        let orig = original_lines.get(i);
        let modi = modified_lines.get(i);

        if orig != modi {
            if !hunk_open {
                hunk_open = true;
                let _ = writeln!(
                    diff,
                    "@@ -{},{} +{},{} @@",
                    i + 1,
                    original_lines.len(),
                    i + 1,
                    modified_lines.len()
                );
            }
            if let Some(line) = orig {
                let _ = writeln!(diff, "-{line}");
            }
            if let Some(line) = modi {
                let _ = writeln!(diff, "+{line}");
            }
        } else if let Some(line) = orig {
            let _ = writeln!(diff, " {line}");
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_always_starts_with_headers() {
        for (orig, modi) in [("", ""), ("a", "b"), ("x\ny", ""), ("", "z")] {
            let diff = synthesize("/f.txt", orig, modi);
            assert!(diff.starts_with("--- a/f.txt\n+++ b/f.txt\n"));
        }
    }

    #[test]
    fn both_empty_yields_headers_only() {
        let diff = synthesize("/f.txt", "", "");
        assert_eq!(diff, "--- a/f.txt\n+++ b/f.txt\n");
        assert!(!diff.contains("@@"));
    }

    #[test]
    fn identical_input_is_all_context() {
        let diff = synthesize("/f.txt", "a\nb", "a\nb");
        assert_eq!(diff, "--- a/f.txt\n+++ b/f.txt\n a\n b\n");
        // Every body line after the two headers is context.
        let body = diff.splitn(3, '\n').nth(2).unwrap();
        assert!(body
            .lines()
            .all(|line| line.starts_with(' ') || line.is_empty()));
    }

    #[test]
    fn single_divergence_emits_one_hunk() {
        let diff = synthesize("/f.txt", "a\nb", "x\nb");
        assert_eq!(
            diff,
            "--- a/f.txt\n+++ b/f.txt\n@@ -1,2 +1,2 @@\n-a\n+x\n b\n"
        );
        assert_eq!(diff.matches("@@").count(), 2);
    }

    #[test]
    fn pure_add_has_only_additions() {
        let diff = synthesize("/new.txt", "", "line1\nline2");
        // "" splits into one empty line, so the first position is a
        // replacement of the empty line.
        assert!(diff.contains("@@ -1,1 +1,2 @@"));
        assert!(diff.contains("+line1"));
        assert!(diff.contains("+line2"));
    }

    #[test]
    fn pure_delete_has_only_removals() {
        let diff = synthesize("/old.txt", "line1\nline2", "");
        assert!(diff.contains("-line1"));
        assert!(diff.contains("-line2"));
        assert!(!diff.contains("+line1"));
    }

    #[test]
    fn one_hunk_header_per_file_even_with_separate_runs() {
        let diff = synthesize("/f.txt", "a\nb\nc\nd", "x\nb\nc\ny");
        // The header is emitted once at the first divergence; the later
        // run at index 3 continues under it.
        assert_eq!(diff.matches("@@ -").count(), 1);
        assert!(diff.contains("@@ -1,4 +1,4 @@"));
        assert!(diff.contains("-d\n+y\n"));
    }

    #[test]
    fn hunk_counts_use_full_side_lengths() {
        let diff = synthesize("/f.txt", "a", "a\nb\nc");
        // Divergence starts at index 1; counts are full lengths (1 and 3).
        assert!(diff.contains("@@ -2,1 +2,3 @@"));
    }

    #[test]
    fn tail_longer_original_emits_trailing_removals() {
        let diff = synthesize("/f.txt", "a\nb\nc", "a");
        assert!(diff.contains(" a\n"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("-c\n"));
    }
}
