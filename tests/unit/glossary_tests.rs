/*!
 * Unit tests for the glossary store and name-consistency enforcement
 */

use seriloc::glossary::{Glossary, GlossaryTerm, NameConsistencyEnforcer, TermCategory};
use seriloc::language_utils::Lang;

fn character(original: &str, translation: &str) -> GlossaryTerm {
    GlossaryTerm::new(original, translation, TermCategory::Character, "")
}

#[test]
fn test_enforce_withInconsistentShortName_shouldDeriveFromFullName() {
    // "이서연" and "서연" translated independently came back inconsistent
    let mut terms = vec![
        character("이서연", "李書妍"),
        character("서연", "舒妍"),
    ];

    let log = NameConsistencyEnforcer::new(Lang::TraditionalChinese).enforce(&mut terms);

    // The given-name rendering is derived from the full name, not kept
    assert_eq!(terms[1].translation, "書妍");
    assert_eq!(terms[0].translation, "李書妍");
    assert_eq!(log.count(), 1);
}

#[test]
fn test_enforce_withCompoundTerm_shouldRewriteStaleRendering() {
    let mut terms = vec![
        character("이서연", "イ・ソヨン"),
        character("서연", "セヨン"),
        GlossaryTerm::new("서연의 고모", "セヨンのおば", TermCategory::Term, ""),
    ];

    NameConsistencyEnforcer::new(Lang::Japanese).enforce(&mut terms);

    assert!(terms[2].translation.contains("ソヨン"));
    assert!(!terms[2].translation.contains("セヨン"));
}

#[test]
fn test_glossary_duplicateInsert_shouldKeepFirstTranslation() {
    let mut glossary = Glossary::create("테스트", Lang::Korean, Lang::Japanese);

    assert!(glossary.add_term(character("서연", "ソヨン")));
    assert!(!glossary.add_term(character("서연", "セヨン")));

    assert_eq!(glossary.term_count(), 1);
    assert_eq!(glossary.get_translation("서연"), Some("ソヨン"));
}

#[test]
fn test_glossary_updateTerm_shouldCorrectInPlace() {
    let mut glossary = Glossary::create("테스트", Lang::Korean, Lang::Japanese);
    glossary.add_term(character("서연", "セヨン"));

    assert!(glossary.update_term("서연", |t| t.translation = "ソヨン".to_string()));
    assert!(!glossary.update_term("미지의용어", |_| {}));

    assert_eq!(glossary.get_translation("서연"), Some("ソヨン"));
}

#[test]
fn test_glossary_saveAndLoad_shouldRoundTrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glossary_japanese.json");

    let mut glossary = Glossary::create("테스트", Lang::Korean, Lang::Japanese);
    glossary.add_term(character("이서연", "イ・ソヨン"));
    glossary.save(&path).unwrap();

    let reloaded = Glossary::load(&path).unwrap();

    assert_eq!(reloaded.series_name, "테스트");
    assert_eq!(reloaded.target_language, Lang::Japanese);
    assert_eq!(reloaded.get_translation("이서연"), Some("イ・ソヨン"));
}

#[test]
fn test_enforce_corrections_shouldFeedQaVariantDetection() {
    // An applied correction records the displaced rendering so QA can find
    // strays of it in episode bodies
    let mut terms = vec![
        character("이서연", "李書妍"),
        character("서연", "舒妍"),
    ];

    NameConsistencyEnforcer::new(Lang::TraditionalChinese).enforce(&mut terms);

    assert!(terms[1].known_wrong_variants.contains(&"舒妍".to_string()));
}
