use super::aggregate::{AggregateSummary, SimilarityRecord};

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert assistant in semantics.";

pub fn build_analysis_prompt(summary: &AggregateSummary, selection: &[SimilarityRecord]) -> String {
    let mut prompt =
        String::from("Analyze the two sets of Competency Questions (CQ), generated and manual.\n\n");

    prompt.push_str(&format!(
        "Statistics:\n\
         - Average cosine similarity: {:.2}\n\
         - Maximum cosine similarity: {:.2}\n\
         - Average Jaccard similarity: {:.2}\n\n\
         Most similar pairs:\n",
        summary.mean_cosine, summary.max_cosine, summary.mean_jaccard
    ));
    for record in selection {
        prompt.push_str(&format!(
            "- Generated: \"{}\"  |  Manual: \"{}\" (Cosine: {:.2}, Jaccard: {:.2})\n",
            record.generated, record.gold, record.cosine, record.jaccard
        ));
    }
    prompt.push_str(
        "\nAnswer the following questions:\n\
         1. Which CQ pairs are the most similar?\n\
         2. Which essential and important CQs are missing from the manual CQ list?\n\
         Answer clearly and in detail.",
    );

    prompt
}
