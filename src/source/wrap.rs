/// Narration column width, in characters, used by the statement table.
pub const NARRATION_WIDTH: usize = 57;

/// Breaks narration text into lines of at most [`NARRATION_WIDTH`] characters,
/// joined with `\n`. Words longer than the width are split.
pub fn wrap_narration(text: &str) -> String {
    let options = textwrap::Options::new(NARRATION_WIDTH).break_words(true);
    textwrap::wrap(text.trim(), options).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(wrap_narration("ATM withdrawal"), "ATM withdrawal");
        assert_eq!(wrap_narration(""), "");
    }

    #[test]
    fn long_text_is_broken_on_word_boundaries() {
        let text = "Transfer from savings account to current account for the monthly rent payment of November";
        let wrapped = wrap_narration(text);
        assert!(wrapped.contains('\n'));
        for line in wrapped.lines() {
            assert!(line.chars().count() <= NARRATION_WIDTH);
        }
        assert_eq!(wrapped.replace('\n', " "), text);
    }

    #[test]
    fn unbroken_tokens_are_split() {
        let token = "X".repeat(130);
        let wrapped = wrap_narration(&token);
        let lines: Vec<&str> = wrapped.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), NARRATION_WIDTH);
    }
}
