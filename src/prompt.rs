use serde::Serialize;
use serde_json::Value;

use crate::domain::Task;
use crate::schema;

const PERSONA: &str = "Você é um assistente especializado em pesquisa historiográfica, \
com formação na tradição dos Annales e atenção à história social e do cotidiano.";

const EVIDENCE_RULES: &str = r#"
Regras de evidência (obrigatórias):
- Cada URL deve apontar diretamente para o conteúdo citado (documento, página do acervo, artigo). Nunca use a página inicial de um site ou de uma instituição.
- Utilize apenas URLs que você consiga verificar pela pesquisa na web. Se não conseguir verificar um link, omita a fonte.
- Se não conseguir verificar um dado (autor, data, instituição), omita o campo em vez de inventá-lo.
- Não fabrique títulos, autores, acervos ou citações.
"#;

const SEARCH_TASK: &str = r#"
Sua tarefa é encontrar fontes históricas primárias e secundárias (documentos, imagens, livros, artigos, acervos digitais, jornais, obras literárias, cartas, relatos de história oral) sobre a consulta do usuário.
Para cada fonte encontrada:
1. Identifique título, autor, data, instituição mantenedora e URL.
2. Descreva brevemente a importância historiográfica da fonte.
3. Quando pertinente, acrescente em "socialContext" uma leitura da fonte na perspectiva do cotidiano e da longa duração.
4. Gere a referência completa seguindo rigorosamente a ABNT (NBR 6023), no campo "citation".
5. Classifique o tipo da fonte.
Se não for possível reunir um conjunto coerente de fontes verificáveis, retorne a lista de fontes vazia e declare isso explicitamente no resumo ("summary").
Retorne os dados em JSON estruturado, conforme o esquema fornecido.
"#;

const GUIDE_TASK: &str = r#"
Sua tarefa é indicar de 4 a 5 referências de metodologia da pesquisa histórica (teoria da história, crítica documental, história oral, trabalho em arquivos, escrita acadêmica) que sirvam de guia a estudantes de graduação e pós-graduação.
Prefira textos de acesso aberto em periódicos, repositórios institucionais e bibliotecas digitais.
Para cada referência, informe título, autor, data, instituição, URL, uma descrição de sua utilidade metodológica, o tipo e a referência completa em ABNT (NBR 6023).
Retorne apenas a lista em JSON, conforme o esquema fornecido.
"#;

const PROJECT_TASK: &str = r#"
Sua tarefa é redigir um projeto de pesquisa acadêmica em História a partir do tema indicado pelo usuário, contendo: título, tema, problema de pesquisa, objetivos (um geral e uma lista de específicos), justificativa, metodologia, referencial teórico e resultados esperados.
Se o tema for obscuro, ambíguo ou pouco documentado, explicite essa limitação dentro da justificativa e da metodologia (por exemplo, indicando lacunas documentais e caminhos de verificação) em vez de preencher o projeto com informações inventadas.
Não cite obras, autores ou acervos que você não tenha certeza de que existem.
Retorne o projeto em JSON, conforme o esquema fornecido.
"#;

const GUIDE_CONTENT: &str =
    "Liste de 4 a 5 artigos e guias de referência sobre metodologia da pesquisa historiográfica.";

/// Everything the generation client needs for one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub task: Task,
    pub instruction: String,
    pub content: String,
    pub schema: Value,
    pub use_web_search: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRequest {
    Search { query: String },
    GuideArticles,
    Project { theme: String },
}

impl TaskRequest {
    pub fn task(&self) -> Task {
        match self {
            TaskRequest::Search { .. } => Task::Search,
            TaskRequest::GuideArticles => Task::GuideArticles,
            TaskRequest::Project { .. } => Task::Project,
        }
    }

    pub fn build(&self) -> GenerationRequest {
        let task = self.task();
        let (body, content) = match self {
            TaskRequest::Search { query } => (
                SEARCH_TASK,
                format!("Pesquise fontes históricas sobre: {query}"),
            ),
            TaskRequest::GuideArticles => (GUIDE_TASK, GUIDE_CONTENT.to_string()),
            TaskRequest::Project { theme } => (
                PROJECT_TASK,
                format!("Elabore um projeto de pesquisa sobre o tema: {theme}"),
            ),
        };

        let mut instruction = String::with_capacity(1024);
        instruction.push_str(PERSONA);
        instruction.push('\n');
        instruction.push_str(body.trim());
        if task != Task::Project {
            instruction.push('\n');
            instruction.push_str(EVIDENCE_RULES.trim_end());
        }

        GenerationRequest {
            task,
            instruction,
            content,
            schema: schema::schema_for(task),
            use_web_search: task != Task::Project,
        }
    }
}

pub fn build_source_search_request(query: &str) -> GenerationRequest {
    TaskRequest::Search {
        query: query.to_string(),
    }
    .build()
}

pub fn build_guide_articles_request() -> GenerationRequest {
    TaskRequest::GuideArticles.build()
}

pub fn build_project_request(theme: &str) -> GenerationRequest {
    TaskRequest::Project {
        theme: theme.to_string(),
    }
    .build()
}
