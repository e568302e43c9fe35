//! Fixed instruction sets for every completion call the pipeline makes.

pub const EXTRACTION_MAX_TOKENS: u32 = 1000;
pub const SYNTHESIS_MAX_TOKENS: u32 = 1500;
pub const RELEVANCE_CONTENT_CHARS: usize = 3000;
pub const CLASSIFICATION_CONTENT_CHARS: usize = 1000;

pub const CLAIM_EXTRACTION_SYSTEM: &str = r#"You are a fact-checking assistant that extracts verifiable factual claims from text.

Identify ONE factual sub-claim that can be verified through external sources.

Rules:
1. Extract claims that are FACTUAL, not opinions.
2. Extract claims that are SPECIFIC and VERIFIABLE.
3. Extract claims that are ATOMIC (a single fact), stated as a declarative sentence.
4. Preserve specifics: numbers, dates, names, locations.
5. If the text contains NO verifiable factual claim, set extraction_failed to true and explain why in extraction_notes.

Output JSON with keys: claim, original_context, extraction_confidence (high|medium|low), extraction_notes, extraction_failed."#;

pub fn claim_extraction_user(input_text: &str) -> String {
    format!(
        "Extract a factual claim from the following text:\n\n<input_text>\n{}\n</input_text>\n\nRespond with JSON only.",
        input_text
    )
}

pub const SOURCE_CLASSIFICATION_SYSTEM: &str = r#"You are a source classifier for fact-checking.

Source types:
- primary: original data or direct statements (filings, datasets, press releases, transcripts)
- original_reporting: first-party journalism (interviews, investigations, on-scene reporting)
- secondary: aggregation or commentary (rewrites, analysis, opinion)
- unknown: cannot determine

Use only the URL, title and excerpt given. Output JSON with keys: source_type, reasoning."#;

pub fn source_classification_user(url: &str, title: &str, content: &str) -> String {
    format!(
        "Classify this source:\n\nURL: {}\nTitle: {}\nContent excerpt: {}\n\nRespond with JSON only.",
        url,
        title,
        truncate_chars(content, CLASSIFICATION_CONTENT_CHARS)
    )
}

pub const EVIDENCE_RELEVANCE_SYSTEM: &str = r#"You are an evidence relevance assessor for fact-checking.

Relevance scores:
- 0.8-1.0: directly relevant (addresses the claim specifically)
- 0.5-0.79: partially relevant (overlapping information)
- 0.2-0.49: tangentially relevant (background only)
- 0.0-0.19: not relevant

If the source is relevant, copy a verbatim quote from the source content that supports or addresses the claim. Never invent or reword the quote; use null if there is none.

Output JSON with keys: is_relevant, relevance_score, verbatim_quote, relevance_explanation."#;

pub fn evidence_relevance_user(claim: &str, url: &str, title: &str, content: &str) -> String {
    format!(
        "Assess the relevance of this source to the claim.\n\nCLAIM: {}\n\nSOURCE URL: {}\nSOURCE TITLE: {}\nSOURCE CONTENT:\n{}\n\nRespond with JSON only.",
        claim,
        url,
        title,
        truncate_chars(content, RELEVANCE_CONTENT_CHARS)
    )
}

pub const SOURCE_RELATION_SYSTEM: &str = r#"You are a source attribution classifier.

Relations:
- direct: the source states the claim verbatim or near-verbatim
- paraphrase: the source conveys the same meaning in different words
- contradiction: the source states the opposite or conflicts with the claim

Judge the TEXTUAL relationship only, not whether the claim is true.

Output JSON with keys: relation, reasoning."#;

pub fn source_relation_user(claim: &str, title: &str, source_type: &str, quote: &str) -> String {
    format!(
        "Classify how this source relates to the claim.\n\nCLAIM: {}\n\nSOURCE: {}\nSOURCE TYPE: {}\nVERBATIM QUOTE: {}\n\nRespond with JSON only.",
        claim, title, source_type, quote
    )
}

pub const VERDICT_SYNTHESIS_SYSTEM: &str = r#"You are a source attribution assembler.

Categories:
- direct: at least one source attributes the claim directly
- paraphrase: sources convey the same meaning, with no direct statement
- contradiction: at least one source contradicts the claim
- not_found: no relevant sources support a verdict

PREFER not_found over a fabricated attribution.

Output JSON with keys: relation, summary (2-3 sentences, under 500 characters), relies_on_secondary_only."#;

pub fn verdict_synthesis_user(claim: &str, assessments: &str) -> String {
    format!(
        "Determine the final source attribution.\n\nCLAIM: {}\n\nSOURCE ASSESSMENTS:\n{}\n\nRespond with JSON only.",
        claim, assessments
    )
}

pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
