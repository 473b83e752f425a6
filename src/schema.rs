use serde_json::{Value, json};

use crate::domain::{SourceType, Task};

pub fn source_schema() -> Value {
    let kinds: Vec<&str> = SourceType::KNOWN.iter().map(SourceType::as_str).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "author": { "type": "STRING" },
            "date": { "type": "STRING" },
            "institution": { "type": "STRING" },
            "url": {
                "type": "STRING",
                "description": "Link direto e verificável para o conteúdo específico (nunca a página inicial do site)."
            },
            "description": {
                "type": "STRING",
                "description": "Importância historiográfica da fonte."
            },
            "socialContext": {
                "type": "STRING",
                "description": "Leitura da fonte na perspectiva do cotidiano e da longa duração."
            },
            "type": { "type": "STRING", "enum": kinds },
            "citation": {
                "type": "STRING",
                "description": "Referência completa em formato ABNT (NBR 6023)."
            }
        },
        "required": ["title", "url", "description", "type", "citation"]
    })
}

pub fn search_result_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "Resumo geral sobre a disponibilidade e o contexto das fontes; deve declarar explicitamente quando as evidências forem insuficientes."
            },
            "sources": { "type": "ARRAY", "items": source_schema() }
        },
        "required": ["summary", "sources"]
    })
}

pub fn guide_articles_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": source_schema()
    })
}

pub fn research_project_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "theme": { "type": "STRING" },
            "problem": { "type": "STRING", "description": "Problema de pesquisa." },
            "objectives": {
                "type": "OBJECT",
                "properties": {
                    "general": { "type": "STRING" },
                    "specifics": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["general", "specifics"]
            },
            "justification": { "type": "STRING" },
            "methodology": { "type": "STRING" },
            "theoreticalFramework": { "type": "STRING" },
            "expectedResults": { "type": "STRING" }
        },
        "required": [
            "title",
            "theme",
            "problem",
            "objectives",
            "justification",
            "methodology",
            "theoreticalFramework",
            "expectedResults"
        ]
    })
}

pub fn schema_for(task: Task) -> Value {
    match task {
        Task::Search => search_result_schema(),
        Task::GuideArticles => guide_articles_schema(),
        Task::Project => research_project_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_schema_lists_every_known_kind() {
        let schema = source_schema();
        let kinds = schema["properties"]["type"]["enum"].as_array().unwrap();
        assert_eq!(kinds.len(), 9);
        assert!(kinds.iter().any(|kind| kind == "oral_history"));
    }

    #[test]
    fn project_schema_requires_every_field() {
        let schema = research_project_schema();
        let required = schema["required"].as_array().unwrap();
        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(required.len(), properties.len());
    }
}
