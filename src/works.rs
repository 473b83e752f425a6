use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AcademicWorkType {
    pub title: &'static str,
    pub description: &'static str,
    pub link: &'static str,
}

pub const ACADEMIC_WORK_TYPES: &[AcademicWorkType] = &[
    AcademicWorkType {
        title: "Trabalho de Conclusão de Curso (TCC/Monografia)",
        description: "Trabalho acadêmico obrigatório para a obtenção de grau em cursos de graduação ou especialização. Pesquisa aprofundada sobre um tema específico, orientada por um professor, que demonstra capacidade de síntese e aplicação dos conhecimentos adquiridos.",
        link: "https://pt.wikipedia.org/wiki/Trabalho_de_conclus%C3%A3o_de_curso",
    },
    AcademicWorkType {
        title: "Artigo Científico",
        description: "Texto que apresenta e discute resultados de pesquisa original ou revisão de literatura, destinado a periódicos especializados e submetido à avaliação por pares.",
        link: "https://pt.wikipedia.org/wiki/Artigo_cient%C3%ADfico",
    },
    AcademicWorkType {
        title: "Resumo",
        description: "Apresentação concisa dos pontos principais de um texto: objetivos, métodos e conclusões. Essencial para indexação e para a decisão de leitura do texto completo.",
        link: "https://pt.wikipedia.org/wiki/Resumo",
    },
    AcademicWorkType {
        title: "Resenha",
        description: "Combina o resumo de uma obra com sua análise crítica, avaliando qualidade, relevância e contribuição para a área.",
        link: "https://pt.wikipedia.org/wiki/Resenha",
    },
    AcademicWorkType {
        title: "Relatório",
        description: "Descrição detalhada de uma atividade, experimento, estágio ou pesquisa, com dados, observações e resultados apresentados de forma objetiva.",
        link: "https://pt.wikipedia.org/wiki/Relat%C3%B3rio",
    },
    AcademicWorkType {
        title: "Projeto de Pesquisa",
        description: "Planejamento de uma pesquisa a ser realizada: problema, objetivos, justificativa, fundamentação teórica, metodologia e cronograma.",
        link: "https://pt.wikipedia.org/wiki/Projeto_de_pesquisa",
    },
    AcademicWorkType {
        title: "Pôster",
        description: "Recurso visual para apresentar resultados em eventos científicos, combinando textos curtos, gráficos e imagens.",
        link: "https://pt.wikipedia.org/wiki/P%C3%B4ster_cient%C3%ADfico",
    },
    AcademicWorkType {
        title: "Fichamento",
        description: "Registro organizado das informações mais relevantes de uma leitura, de citação, de resumo ou analítico.",
        link: "https://pt.wikipedia.org/wiki/Fichamento",
    },
    AcademicWorkType {
        title: "Teses e Dissertações",
        description: "Trabalhos de pós-graduação stricto sensu. A dissertação (mestrado) demonstra domínio do tema; a tese (doutorado) traz contribuição original e inédita.",
        link: "https://pt.wikipedia.org/wiki/Tese",
    },
];

/// Case-insensitive lookup on a fragment of the title, e.g. `"tcc"` or `"resenha"`.
pub fn find_work_type(query: &str) -> Option<&'static AcademicWorkType> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    ACADEMIC_WORK_TYPES
        .iter()
        .find(|work| work.title.to_lowercase().contains(&needle))
}
