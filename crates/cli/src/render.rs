use docsort_catalog::Document;
use docsort_engine::{CategorizationResult, SuggestedEntity};

pub fn inbox_line(document: &Document) -> String {
    let created = if document.created_date.is_empty() {
        "unknown date"
    } else {
        &document.created_date
    };
    format!("{:>6}  {}  {}", document.id, created, document.title)
}

fn entity_label(entity: &SuggestedEntity) -> String {
    if entity.is_new {
        format!("{} [new]", entity.name)
    } else {
        entity.name.clone()
    }
}

fn arrow(current: &str, suggested: &str) -> String {
    if current == suggested {
        format!("{current} (unchanged)")
    } else {
        format!("{current} -> {suggested}")
    }
}

const ABSENT: &str = "(none)";

/// Human-readable diff of a document's current metadata against the
/// suggestion, one field per line.
pub fn result_block(result: &CategorizationResult) -> String {
    let mut lines = vec![format!(
        "Document {}: {}",
        result.document_id, result.current.title
    )];

    if let Some(message) = &result.error_message {
        lines.push(format!("  error: {message}"));
        return lines.join("\n");
    }

    if let Some(title) = &result.suggested_title {
        lines.push(format!("  Title:         {}", arrow(&result.current.title, title)));
    }

    if let Some(entity) = &result.suggested_type {
        let current = result.current.document_type.as_deref().unwrap_or(ABSENT);
        lines.push(format!("  Type:          {}", arrow(current, &entity_label(entity))));
    }

    if !result.suggested_tags.is_empty() {
        let current = if result.current.tags.is_empty() {
            ABSENT.to_string()
        } else {
            result.current.tags.join(", ")
        };
        let suggested = result
            .suggested_tags
            .iter()
            .map(entity_label)
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("  Tags:          {}", arrow(&current, &suggested)));
    }

    if let Some(entity) = &result.suggested_correspondent {
        let current = result.current.correspondent.as_deref().unwrap_or(ABSENT);
        lines.push(format!(
            "  Correspondent: {}",
            arrow(current, &entity_label(entity))
        ));
    }

    if let Some(entity) = &result.suggested_storage_path {
        let current = result.current.storage_path.as_deref().unwrap_or(ABSENT);
        lines.push(format!(
            "  Storage path:  {}",
            arrow(current, &entity_label(entity))
        ));
    }

    if lines.len() == 1 {
        lines.push("  (no suggestions)".to_string());
    }

    lines.join("\n")
}
