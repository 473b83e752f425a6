use chrono::{Datelike, NaiveDate};

use crate::domain::Source;

const MONTHS: [&str; 12] = [
    "jan.", "fev.", "mar.", "abr.", "maio", "jun.", "jul.", "ago.", "set.", "out.", "nov.",
    "dez.",
];

/// Citation to copy for `source`: the model-supplied one when present, otherwise an
/// ABNT reference built from the known fields.
pub fn citation_text(source: &Source, accessed: NaiveDate) -> String {
    match source.citation.as_deref().map(str::trim) {
        Some(citation) if !citation.is_empty() => citation.to_string(),
        _ => format_abnt(source, accessed),
    }
}

/// ABNT NBR 6023 reference for an online document:
/// `SOBRENOME, Prenome. Título. Instituição, data. Disponível em: <url>. Acesso em: d mês aaaa.`
pub fn format_abnt(source: &Source, accessed: NaiveDate) -> String {
    let mut parts = Vec::with_capacity(5);
    if let Some(author) = non_blank(source.author.as_deref()) {
        parts.push(format_author(author));
    }
    parts.push(source.title.trim().trim_end_matches('.').to_string());

    let imprint = [
        non_blank(source.institution.as_deref()),
        non_blank(source.date.as_deref()),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(", ");
    if !imprint.is_empty() {
        parts.push(imprint);
    }

    parts.push(format!("Disponível em: <{}>", source.url.trim()));
    parts.push(format!("Acesso em: {}", format_access_date(accessed)));

    let mut reference = parts.join(". ");
    reference.push('.');
    reference
}

/// `Maria Odila Leite da Silva Dias` becomes `DIAS, Maria Odila Leite da Silva`.
/// Names already in `SURNAME, Given` form only get the surname upper-cased.
pub fn format_author(author: &str) -> String {
    let author = author.trim();
    if let Some((surname, given)) = author.split_once(',') {
        return format!("{}, {}", surname.trim().to_uppercase(), given.trim());
    }
    let mut words = author.split_whitespace().collect::<Vec<_>>();
    match words.pop() {
        Some(surname) if !words.is_empty() => {
            format!("{}, {}", surname.to_uppercase(), words.join(" "))
        }
        Some(single) => single.to_uppercase(),
        None => String::new(),
    }
}

pub fn format_access_date(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
