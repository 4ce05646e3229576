//! Integration tests covering entity/value-object invariants independent
//! of any adapter.

use kbmcp_domain::entities::QuestionAnswerStyle;

#[test]
fn question_answer_style_selects_matching_hits_and_fragments() {
    assert_eq!(QuestionAnswerStyle::Concise.n_hits(), 1);
    assert_eq!(QuestionAnswerStyle::Concise.n_fragments(), 1);
    assert_eq!(QuestionAnswerStyle::Normal.n_hits(), 3);
    assert_eq!(QuestionAnswerStyle::Comprehensive.n_hits(), 6);
    assert_eq!(QuestionAnswerStyle::Exhaustive.n_hits(), 9);
    for style in [
        QuestionAnswerStyle::Concise,
        QuestionAnswerStyle::Normal,
        QuestionAnswerStyle::Comprehensive,
        QuestionAnswerStyle::Exhaustive,
    ] {
        assert_eq!(style.n_hits(), style.n_fragments());
    }
}

#[test]
fn question_answer_style_default_is_normal() {
    assert_eq!(QuestionAnswerStyle::default(), QuestionAnswerStyle::Normal);
}

#[test]
fn collection_meta_runtime_script_escapes_quotes() {
    use kbmcp_domain::value_objects::CollectionMeta;

    let meta = CollectionMeta {
        name: r#"my "special" kb"#.to_string(),
        kb_type: "docs".to_string(),
        description: "d".to_string(),
        data_source: "https://example.com".to_string(),
    };
    let script = meta.runtime_name_script();
    assert!(script.contains(r#"my \"special\" kb"#));
}
