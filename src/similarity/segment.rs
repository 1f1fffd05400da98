pub const STATEMENT_DELIMITER: char = '?';

/// Splits a block of text into question statements, one per `?`-terminated
/// fragment. Each retained fragment is trimmed and gets its `?` back; blank
/// fragments are dropped.
pub fn segment_statements(input: &str) -> Vec<String> {
    input
        .split(STATEMENT_DELIMITER)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| format!("{fragment}{STATEMENT_DELIMITER}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::segment_statements;

    #[test]
    fn splits_on_question_marks_and_restores_delimiter() {
        let statements = segment_statements("What is X?  Who owns Y ?\nWhen did Z happen?");
        assert_eq!(
            statements,
            vec!["What is X?", "Who owns Y?", "When did Z happen?"]
        );
    }

    #[test]
    fn drops_blank_fragments() {
        let statements = segment_statements("?? What is X? ?   ?");
        assert_eq!(statements, vec!["What is X?"]);
    }

    #[test]
    fn text_without_delimiter_becomes_single_statement() {
        assert_eq!(segment_statements("  list all datasets  "), vec!["list all datasets?"]);
    }

    #[test]
    fn blank_text_yields_empty_set() {
        assert!(segment_statements("").is_empty());
        assert!(segment_statements(" \n\t ").is_empty());
        assert!(segment_statements("???").is_empty());
    }
}
