use clio_archive::domain::Task;
use clio_archive::prompt::{
    TaskRequest, build_guide_articles_request, build_project_request,
    build_source_search_request,
};

#[test]
fn search_request_embeds_query_verbatim() {
    let request = build_source_search_request("Tratado de Tordesilhas");
    assert_eq!(request.task, Task::Search);
    assert!(request.use_web_search);
    assert!(request.content.contains("Tratado de Tordesilhas"));
    assert_eq!(request.schema["required"][0], "summary");
    assert_eq!(request.schema["properties"]["sources"]["type"], "ARRAY");
}

#[test]
fn search_instruction_carries_evidence_rules() {
    let request = build_source_search_request("Revolta da Vacina");
    let instruction = request.instruction.to_lowercase();
    assert!(instruction.contains("página inicial"));
    assert!(instruction.contains("omita"));
    assert!(instruction.contains("summary"));
    assert!(instruction.contains("abnt"));
}

#[test]
fn guide_request_asks_for_four_to_five_references() {
    let request = build_guide_articles_request();
    assert_eq!(request.task, Task::GuideArticles);
    assert!(request.use_web_search);
    assert!(request.instruction.contains("4 a 5"));
    assert_eq!(request.schema["type"], "ARRAY");
}

#[test]
fn project_request_disables_web_search() {
    let request = build_project_request("Irmandades negras em Minas Gerais");
    assert_eq!(request.task, Task::Project);
    assert!(!request.use_web_search);
    assert!(request.content.contains("Irmandades negras em Minas Gerais"));
    assert!(request.instruction.contains("justificativa"));
    assert!(request.instruction.contains("metodologia"));
    assert_eq!(request.schema["properties"]["objectives"]["type"], "OBJECT");
}

#[test]
fn polymorphic_builder_matches_task_functions() {
    let request = TaskRequest::Search {
        query: "Canudos".to_string(),
    };
    assert_eq!(request.task(), Task::Search);
    assert_eq!(request.build(), build_source_search_request("Canudos"));
    assert_eq!(
        TaskRequest::GuideArticles.build(),
        build_guide_articles_request()
    );
}
