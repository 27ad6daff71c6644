/// Catalog option lists offered to the agent for one document.
///
/// Names only; the reconciliation engine owns the name→id mapping. Lists are
/// pre-filtered by the caller (protected tags removed, pending correspondents
/// appended) before they reach prompt construction.
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    pub document_types: Vec<String>,
    pub tags: Vec<String>,
    pub correspondents: Vec<String>,
    pub storage_paths: Vec<String>,
}

pub(crate) fn format_option_list(options: &[String]) -> String {
    if options.is_empty() {
        "None available".to_string()
    } else {
        options.join(" | ")
    }
}

/// The instructional template shared by every backend. Backends differ only
/// in how the document text is referenced (`content_reference`): a temp-file
/// mention for file-capable agents, the inlined text for the rest.
pub(crate) fn categorization_prompt(content_reference: &str, options: &PromptOptions) -> String {
    let types = format_option_list(&options.document_types);
    let tags = format_option_list(&options.tags);
    let correspondents = format_option_list(&options.correspondents);
    let storage_paths = format_option_list(&options.storage_paths);

    format!(
        r#"You are helping categorize a scanned document in a document archive.

{content_reference}

Available document types: {types}
Available tags: {tags}
Available correspondents: {correspondents}
Available storage paths: {storage_paths}

Based on the content:
1. Suggest an appropriate title (concise, descriptive)
2. Choose a document type from available options (select the best match or "None")
3. Choose relevant tags from available options (select all that apply or "None")
4. Choose a correspondent from available options, OR if none match suggest "NEW: <name>"
5. Choose a storage path from available options (select the best match or "None")

IMPORTANT:
- Only suggest NEW correspondents when confident they should exist but aren't in the list
- Do NOT suggest NEW tags, document types, or storage paths - only use existing options

MATCHING GUIDELINES FOR CORRESPONDENTS - FOLLOW THIS PROCESS:

Step 1: CHECK FOR EXACT MATCHES FIRST (case-insensitive)
- Before suggesting a NEW correspondent, carefully scan the ENTIRE available list
- Look for exact matches ignoring case (e.g., "Amber Electric" matches "AMBER ELECTRIC")
- If you find an exact match, USE IT - never suggest NEW for exact matches

Step 2: CHECK FOR CLOSE MATCHES
- If no exact match, look for very similar names:
  - "Amazon.com" should match "Amazon"
  - "Dr. Smith's Office" should match "Dr. Smith"
  - "City Bank" should match "City Bank Australia"
- When in doubt, prefer matching an existing correspondent over creating new

Step 3: ONLY THEN suggest NEW
- Only suggest NEW correspondents when you've carefully checked and found no reasonable match

NORMALIZATION FOR NEW CORRESPONDENTS:
- When suggesting NEW correspondents, use clean, canonical names:
  - "Amazon.com, Inc." -> "NEW: Amazon"
  - "Dr. John Smith, MD" -> "NEW: Dr. John Smith"
- Avoid URLs, legal suffixes (Inc., LLC), or extra punctuation unless essential

SEMANTIC TAG MATCHING - CRITICAL:
- Tags should reflect what the document IS ABOUT, not just keywords that appear in it
- Ask yourself: "Is this document primarily ABOUT [tag concept]?" If no, don't use the tag
- A payslip that mentions a street address is not ABOUT that address; a utility
  bill for that address is
- Only select tags that describe the document's core subject matter

MATCHING FOR DOCUMENT TYPES AND STORAGE PATHS:
- For document type: select the single best match (or "None" if nothing fits)
- For storage path: select the best match (or "None" if unsure)

Respond in this format:
TITLE: <suggested title>
TYPE: <existing type or "None">
TAGS: <comma-separated existing tags or "None">
CORRESPONDENT: <existing correspondent or "NEW: name" or "None">
STORAGE_PATH: <existing storage path or "None">"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_lists_are_pipe_delimited() {
        let opts = vec!["Rent".to_string(), "Utilities".to_string()];
        assert_eq!(format_option_list(&opts), "Rent | Utilities");
    }

    #[test]
    fn empty_option_list_reads_none_available() {
        assert_eq!(format_option_list(&[]), "None available");
    }

    #[test]
    fn prompt_embeds_reference_and_options() {
        let options = PromptOptions {
            document_types: vec!["Invoice".to_string()],
            tags: vec!["Rent".to_string()],
            correspondents: vec![],
            storage_paths: vec!["Bills".to_string()],
        };
        let prompt = categorization_prompt("Document text follows.", &options);

        assert!(prompt.contains("Document text follows."));
        assert!(prompt.contains("Available document types: Invoice"));
        assert!(prompt.contains("Available correspondents: None available"));
        assert!(prompt.contains("STORAGE_PATH:"));
    }
}
