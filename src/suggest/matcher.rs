use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::field::field_model::Field;
use crate::suggest::suggestion_model::Suggestion;

/// How a field found its suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    ExactId,
    ExactName,
    Partial,
    None,
}

/// Association of one field with at most one suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub field: Field,
    pub suggestion: Option<Suggestion>,
    pub kind: MatchKind,
}

/// Normalized key -> suggestion, iterated in first-insertion order of the
/// key. Re-inserting a key replaces the suggestion but keeps its position.
struct SuggestionLookup<'a> {
    order: Vec<String>,
    by_key: HashMap<String, &'a Suggestion>,
}

impl<'a> SuggestionLookup<'a> {
    fn build(suggestions: &'a [Suggestion]) -> Self {
        let mut order = Vec::new();
        let mut by_key = HashMap::new();

        for suggestion in suggestions {
            let key = normalize(&suggestion.field_key);
            if key.is_empty() {
                continue;
            }
            if by_key.insert(key.clone(), suggestion).is_none() {
                order.push(key);
            }
        }

        SuggestionLookup { order, by_key }
    }

    fn get(&self, key: &str) -> Option<&'a Suggestion> {
        self.by_key.get(key).copied()
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Pair every field with a suggestion.
///
/// Each field is matched on its own against the full suggestion set: the
/// identifier, then the name, then label and placeholder when they differ
/// from the name. Without an exact hit the field takes the first suggestion
/// whose key contains, or is contained in, one of its identifying strings.
/// A suggestion may serve several fields.
///
/// Always returns one `Match` per field, in field order.
pub fn match_fields(fields: &[Field], suggestions: &[Suggestion]) -> Vec<Match> {
    let lookup = SuggestionLookup::build(suggestions);

    fields
        .iter()
        .map(|field| {
            let (kind, suggestion) = match exact_match(field, &lookup) {
                Some((kind, suggestion)) => (kind, Some(suggestion.clone())),
                None => match partial_match(field, &lookup) {
                    Some(suggestion) => (MatchKind::Partial, Some(suggestion.clone())),
                    None => (MatchKind::None, None),
                },
            };

            debug!(field = %field.id, kind = ?kind, "matched field");
            Match {
                field: field.clone(),
                suggestion,
                kind,
            }
        })
        .collect()
}

fn exact_match<'a>(field: &Field, lookup: &SuggestionLookup<'a>) -> Option<(MatchKind, &'a Suggestion)> {
    let name = normalize(&field.name);

    let by = |candidate: &str, kind: MatchKind| {
        let key = normalize(candidate);
        if key.is_empty() {
            return None;
        }
        lookup.get(&key).map(|s| (kind, s))
    };

    by(&field.id, MatchKind::ExactId)
        .or_else(|| by(&field.name, MatchKind::ExactName))
        .or_else(|| {
            [field.label.as_deref(), field.placeholder.as_deref()]
                .into_iter()
                .flatten()
                .filter(|alt| normalize(alt) != name)
                .find_map(|alt| by(alt, MatchKind::ExactName))
        })
}

fn partial_match<'a>(field: &Field, lookup: &SuggestionLookup<'a>) -> Option<&'a Suggestion> {
    let identifiers: Vec<String> = field
        .identifiers()
        .into_iter()
        .flatten()
        .map(normalize)
        .filter(|s| !s.is_empty())
        .collect();

    for key in &lookup.order {
        let hit = identifiers
            .iter()
            .any(|ident| ident.contains(key.as_str()) || key.contains(ident.as_str()));
        if hit {
            return lookup.get(key);
        }
    }
    None
}
