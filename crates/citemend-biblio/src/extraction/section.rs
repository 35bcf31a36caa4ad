use once_cell::sync::Lazy;
use regex::Regex;

static BIBLIOGRAPHY_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:bibliograf[íi]a|referencias\s+bibliogr[áa]ficas|references|bibliography)\b")
        .unwrap()
});

static SECTION_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:leyes\s+y\s+decretos\s+citados|anexos?|ap[ée]ndices?|appendix)\b")
        .unwrap()
});

/// Cut the bibliography section out of a document's extracted text. When no
/// heading is found the whole (whitespace-collapsed) text passes through, so
/// a document with an unusual layout still reaches the extraction stage.
pub fn find_bibliography_section(text: &str) -> String {
    let clean = normalize_whitespace(text);

    let Some(heading) = BIBLIOGRAPHY_HEADING_RE.find(&clean) else {
        return clean;
    };

    let tail = &clean[heading.start()..];
    let end = SECTION_END_RE
        .find_at(tail, heading.as_str().len())
        .map(|m| m.start())
        .unwrap_or(tail.len());

    tail[..end].trim().to_string()
}

fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuts_between_heading_and_cited_statutes() {
        let text = "Introducción al estudio.\n\nBibliografía\nPérez, C. (2006). Modelo gerencial.\nGaleano, E. (1971). Las venas abiertas.\n\nLeyes y Decretos Citados\nLey Orgánica de Educación.";
        let section = find_bibliography_section(text);
        assert!(section.starts_with("Bibliografía"));
        assert!(section.contains("Las venas abiertas"));
        assert!(!section.contains("Ley Orgánica"));
    }

    #[test]
    fn runs_to_the_end_without_a_terminator() {
        let text = "Cuerpo del documento. Referencias bibliográficas: Paz, O. (1950). El laberinto de la soledad.";
        let section = find_bibliography_section(text);
        assert!(section.contains("El laberinto de la soledad"));
    }

    #[test]
    fn whole_text_passes_through_without_a_heading() {
        let text = "Pérez, C. (2006).   Modelo\ngerencial.";
        assert_eq!(find_bibliography_section(text), "Pérez, C. (2006). Modelo gerencial.");
    }

    #[test]
    fn accented_and_unaccented_headings_both_match() {
        assert!(find_bibliography_section("Bibliografia\nuna referencia").starts_with("Bibliografia"));
        assert!(find_bibliography_section("References\nan entry").starts_with("References"));
    }
}
