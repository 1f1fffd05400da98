use anyhow::{Context, Result, bail};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelledInput {
    pub gold_text: String,
    pub generated_text: String,
}

/// Splits a `Gold standard: ... Generated: ...` block into its two sections.
/// Labels are case-insensitive and may span lines.
pub fn parse_labelled_input(input: &str) -> Result<LabelledInput> {
    let pattern = Regex::new(r"(?is)gold\s*standard\s*:(.*?)generated\s*:(.*)")
        .context("failed to compile labelled input regex")?;

    let Some(captures) = pattern.captures(input) else {
        let generated_label =
            Regex::new(r"(?i)generated\s*:").context("failed to compile generated label regex")?;
        if generated_label.is_match(input) {
            bail!("input must contain a 'Gold standard:' section before the 'Generated:' section");
        }
        bail!("input must contain a 'Generated:' section");
    };

    let gold_text = captures
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .context("missing gold standard capture")?;
    let generated_text = captures
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .context("missing generated capture")?;

    Ok(LabelledInput {
        gold_text,
        generated_text,
    })
}

pub fn format_labelled_input(gold_text: &str, generated_text: &str) -> String {
    format!("Gold standard: {gold_text}\nGenerated: {generated_text}")
}

#[cfg(test)]
mod tests {
    use super::{format_labelled_input, parse_labelled_input};

    #[test]
    fn parses_multiline_sections() {
        let parsed = parse_labelled_input(
            "Gold standard:\nWhat is X? What is Y?\n\nGenerated:\nWhat is X? What is Z?\n",
        )
        .expect("labelled input should parse");
        assert_eq!(parsed.gold_text, "What is X? What is Y?");
        assert_eq!(parsed.generated_text, "What is X? What is Z?");
    }

    #[test]
    fn labels_are_case_insensitive() {
        let parsed = parse_labelled_input("GOLD STANDARD : a? generated: b?")
            .expect("labelled input should parse");
        assert_eq!(parsed.gold_text, "a?");
        assert_eq!(parsed.generated_text, "b?");
    }

    #[test]
    fn round_trips_batch_row_format() {
        let text = format_labelled_input("Who? ", "What?");
        let parsed = parse_labelled_input(&text).expect("row format should parse");
        assert_eq!(parsed.gold_text, "Who?");
        assert_eq!(parsed.generated_text, "What?");
    }

    #[test]
    fn missing_sections_are_reported() {
        let error = parse_labelled_input("Generated: a?").expect_err("gold section is required");
        assert!(error.to_string().contains("Gold standard:"), "{error}");

        let error = parse_labelled_input("Gold standard: a?").expect_err("generated is required");
        assert!(error.to_string().contains("'Generated:'"), "{error}");
    }
}
