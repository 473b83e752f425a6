use assert_matches::assert_matches;

use clio_archive::domain::{ResearchProject, Source, SourceType, Task};

fn source_json(kind: &str) -> String {
    format!(
        r#"{{
            "title": "Diário de Navegação de Pero Lopes de Sousa",
            "author": "Pero Lopes de Sousa",
            "url": "https://bndigital.bn.gov.br/acervo-digital/diario-navegacao/1234",
            "description": "Relato da expedição de Martim Afonso de Sousa",
            "type": "{kind}"
        }}"#
    )
}

#[test]
fn parse_known_source_type() {
    let source: Source = serde_json::from_str(&source_json("oral_history")).unwrap();
    assert_eq!(source.kind, SourceType::OralHistory);
    assert!(source.kind.is_known());
}

#[test]
fn unknown_source_type_falls_back() {
    let source: Source = serde_json::from_str(&source_json("map")).unwrap();
    assert_matches!(&source.kind, SourceType::Other(label) if label == "map");
    assert_eq!(source.kind.display_label(), "document");

    let encoded = serde_json::to_value(&source).unwrap();
    assert_eq!(encoded["type"], "map");
}

#[test]
fn optional_fields_are_omitted_when_absent() {
    let source: Source = serde_json::from_str(&source_json("book")).unwrap();
    let encoded = serde_json::to_value(&source).unwrap();
    assert!(encoded.get("institution").is_none());
    assert!(encoded.get("socialContext").is_none());
    assert!(encoded.get("citation").is_none());
}

#[test]
fn legacy_citation_key_is_accepted() {
    let raw = r#"{
        "title": "Revolta da Vacina",
        "url": "https://acervo.oglobo.globo.com/fatos-historicos/revolta-da-vacina-9391",
        "description": "Cobertura jornalística",
        "type": "newspaper",
        "abntCitation": "REVOLTA da Vacina. O Globo, 1904."
    }"#;
    let source: Source = serde_json::from_str(raw).unwrap();
    assert_eq!(
        source.citation.as_deref(),
        Some("REVOLTA da Vacina. O Globo, 1904.")
    );
    let encoded = serde_json::to_value(&source).unwrap();
    assert!(encoded.get("citation").is_some());
    assert!(encoded.get("abntCitation").is_none());
}

#[test]
fn missing_url_is_rejected() {
    let raw = r#"{"title": "x", "description": "y", "type": "book"}"#;
    assert!(serde_json::from_str::<Source>(raw).is_err());
}

#[test]
fn deep_url_detection() {
    let mut source: Source = serde_json::from_str(&source_json("document")).unwrap();
    assert!(source.has_deep_url());

    for shallow in [
        "https://bndigital.bn.gov.br",
        "https://bndigital.bn.gov.br/",
        "bndigital.bn.gov.br/acervo",
    ] {
        source.url = shallow.to_string();
        assert!(!source.has_deep_url(), "{shallow} should not be deep");
    }

    source.url = "https://www.loc.gov/?q=tordesilhas".to_string();
    assert!(source.has_deep_url());
}

#[test]
fn research_project_requires_every_field() {
    let raw = r#"{
        "title": "Cotidiano operário em São Paulo",
        "theme": "Greve de 1917",
        "problem": "Como as redes de vizinhança sustentaram a greve?",
        "objectives": { "general": "Analisar as redes", "specifics": [] },
        "justification": "Lacuna historiográfica",
        "methodology": "Imprensa operária",
        "theoreticalFramework": "E. P. Thompson"
    }"#;
    assert!(serde_json::from_str::<ResearchProject>(raw).is_err());
}

#[test]
fn task_names() {
    assert_eq!(Task::Search.to_string(), "search");
    assert_eq!(Task::GuideArticles.to_string(), "guide-articles");
    assert_eq!(Task::Project.to_string(), "project");
}
