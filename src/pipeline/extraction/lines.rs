/// Split raw contract text into an ordered sequence of candidate line-item
/// strings. Blank lines are dropped and interior whitespace collapsed;
/// everything else is kept — the parser decides what is a real line item.
pub fn extract_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_blank_lines_and_collapses_whitespace() {
        let text = "  Crestron   DM-NVX-D30  decoder \n\n\t\n2x  Bosch SHP878ZD5N\n";
        let lines = extract_lines(text);
        assert_eq!(
            lines,
            vec!["Crestron DM-NVX-D30 decoder", "2x Bosch SHP878ZD5N"]
        );
    }

    #[test]
    fn preserves_document_order() {
        let lines = extract_lines("first\nsecond\nthird");
        assert_eq!(lines, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_text_yields_no_lines() {
        assert!(extract_lines("").is_empty());
        assert!(extract_lines("\n \n").is_empty());
    }
}
