use form_autofill::field::field_model::{Field, FieldKind};
use form_autofill::suggest::matcher::{MatchKind, match_fields};
use form_autofill::suggest::suggestion_model::Suggestion;

fn field(id: &str, name: &str) -> Field {
    Field::new(id, name, FieldKind::Text)
}

fn sug(key: &str, value: &str) -> Suggestion {
    Suggestion::new(key, value, 0.9)
}

fn value_of(m: &form_autofill::suggest::matcher::Match) -> Option<&str> {
    m.suggestion.as_ref().map(|s| s.value.as_str())
}

// ============================================================================
// Exact matches
// ============================================================================

#[test]
fn exact_id_match_is_case_insensitive() {
    let fields = vec![field("Email", "Your email")];
    let matches = match_fields(&fields, &[sug("  email ", "a@b.com")]);
    assert_eq!(matches[0].kind, MatchKind::ExactId);
    assert_eq!(value_of(&matches[0]), Some("a@b.com"));
}

#[test]
fn exact_name_match() {
    let fields = vec![field("generic-field-1", "Company")];
    let matches = match_fields(&fields, &[sug("company", "Acme")]);
    assert_eq!(matches[0].kind, MatchKind::ExactName);
    assert_eq!(value_of(&matches[0]), Some("Acme"));
}

#[test]
fn exact_label_or_placeholder_match() {
    let fields = vec![
        field("f1", "Field one").with_label("Organisation"),
        field("f2", "Field two").with_placeholder("Mobile"),
    ];
    let matches = match_fields(&fields, &[sug("mobile", "555"), sug("organisation", "Acme")]);
    assert_eq!(matches[0].kind, MatchKind::ExactName);
    assert_eq!(value_of(&matches[0]), Some("Acme"));
    assert_eq!(matches[1].kind, MatchKind::ExactName);
    assert_eq!(value_of(&matches[1]), Some("555"));
}

#[test]
fn exact_id_beats_partial_name_overlap() {
    let fields = vec![field("phone", "Work email")];
    let suggestions = vec![sug("email", "a@b.com"), sug("phone", "555")];
    let matches = match_fields(&fields, &suggestions);
    assert_eq!(matches[0].kind, MatchKind::ExactId);
    assert_eq!(value_of(&matches[0]), Some("555"));
}

#[test]
fn exact_id_beats_exact_name() {
    let fields = vec![field("name", "email")];
    let matches = match_fields(&fields, &[sug("email", "a@b.com"), sug("name", "Ada")]);
    assert_eq!(matches[0].kind, MatchKind::ExactId);
    assert_eq!(value_of(&matches[0]), Some("Ada"));
}

#[test]
fn duplicate_keys_last_write_wins() {
    let fields = vec![field("email", "Email")];
    let matches = match_fields(&fields, &[sug("email", "old@b.com"), sug("EMAIL", "new@b.com")]);
    assert_eq!(value_of(&matches[0]), Some("new@b.com"));
}

// ============================================================================
// Partial matches
// ============================================================================

#[test]
fn partial_match_by_containment_both_ways() {
    let fields = vec![
        field("generic-field-1", "Full Name"),
        field("generic-field-2", "Phone"),
    ];
    // "name" is inside "full name"; "phone" is inside "phone number"
    let matches = match_fields(&fields, &[sug("name", "Ada"), sug("Phone number", "555")]);
    assert_eq!(matches[0].kind, MatchKind::Partial);
    assert_eq!(value_of(&matches[0]), Some("Ada"));
    assert_eq!(matches[1].kind, MatchKind::Partial);
    assert_eq!(value_of(&matches[1]), Some("555"));
}

#[test]
fn partial_match_prefers_suggestion_order() {
    let fields = vec![field("x1", "Home address line")];
    let matches = match_fields(&fields, &[sug("address", "1 Main St"), sug("home", "House")]);
    assert_eq!(value_of(&matches[0]), Some("1 Main St"));

    let matches = match_fields(&fields, &[sug("home", "House"), sug("address", "1 Main St")]);
    assert_eq!(value_of(&matches[0]), Some("House"));
}

#[test]
fn exactly_matched_suggestion_still_serves_partial_fields() {
    // "email" belongs to the second field exactly; the first overlaps it
    let fields = vec![field("f1", "Backup email"), field("email", "Email")];
    let matches = match_fields(&fields, &[sug("email", "a@b.com")]);
    assert_eq!(matches[0].kind, MatchKind::Partial);
    assert_eq!(value_of(&matches[0]), Some("a@b.com"));
    assert_eq!(matches[1].kind, MatchKind::ExactId);
    assert_eq!(value_of(&matches[1]), Some("a@b.com"));
}

#[test]
fn one_suggestion_can_partially_match_several_fields() {
    let fields = vec![field("f1", "First name"), field("f2", "Last name")];
    let matches = match_fields(&fields, &[sug("name", "Ada")]);
    assert_eq!(matches[0].kind, MatchKind::Partial);
    assert_eq!(matches[1].kind, MatchKind::Partial);
    assert_eq!(value_of(&matches[1]), Some("Ada"));
}

// ============================================================================
// Completeness and determinism
// ============================================================================

#[test]
fn one_match_per_field_in_field_order() {
    let fields = vec![field("a", "A"), field("b", "B"), field("c", "C")];

    for suggestions in [vec![], vec![sug("b", "2")], vec![sug("c", "3"), sug("zzz", "?"), sug("a", "1")]] {
        let matches = match_fields(&fields, &suggestions);
        assert_eq!(matches.len(), fields.len());
        for (m, f) in matches.iter().zip(&fields) {
            assert_eq!(m.field.id, f.id);
        }
    }
}

#[test]
fn no_suggestions_means_all_none() {
    let fields = vec![field("a", "A"), field("b", "B")];
    let matches = match_fields(&fields, &[]);
    assert!(matches.iter().all(|m| m.kind == MatchKind::None && m.suggestion.is_none()));
}

#[test]
fn exact_matches_do_not_depend_on_suggestion_order() {
    let fields = vec![field("email", "Email"), field("phone", "Phone"), field("name", "Name")];
    let base = vec![sug("name", "Ada"), sug("email", "a@b.com"), sug("phone", "555")];

    let expected = match_fields(&fields, &base);
    let permutations = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    for order in permutations {
        let shuffled: Vec<Suggestion> = order.iter().map(|&i| base[i].clone()).collect();
        assert_eq!(match_fields(&fields, &shuffled), expected);
    }
}

#[test]
fn matching_is_deterministic() {
    let fields = vec![field("f1", "Full name"), field("f2", "Email address")];
    let suggestions = vec![sug("name", "Ada"), sug("email", "a@b.com"), sug("address", "1 Main St")];
    let first = match_fields(&fields, &suggestions);
    for _ in 0..5 {
        assert_eq!(match_fields(&fields, &suggestions), first);
    }
    assert_eq!(value_of(&first[1]), Some("a@b.com"));
}
