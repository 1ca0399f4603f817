use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

use super::catalog::{
    DEGREE_MARKERS, JOB_KEYWORDS, MBA_MARKERS, POSTGRAD_MARKERS, RELEVANT_AREAS, SOFT_SKILLS,
    STOP_WORDS, TECHNICAL_SKILLS,
};
use super::ResumeError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EducationFlags {
    pub superior_completo: bool,
    pub pos_graduacao: bool,
    pub mba: bool,
    pub area_relevante: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeAnalysis {
    pub job_scores: BTreeMap<String, f64>,
    pub technical_score: f64,
    pub soft_skills_score: f64,
    pub experience_years: u32,
    pub experience_level: String,
    pub education: EducationFlags,
    pub overall_rating: f64,
    pub star_ratings: BTreeMap<String, f64>,
    pub recommendations: Vec<String>,
}

struct Patterns {
    non_letters: Regex,
    experience: Vec<Regex>,
}

fn patterns() -> &'static Patterns {
    static P: OnceLock<Patterns> = OnceLock::new();
    P.get_or_init(|| Patterns {
        non_letters: Regex::new(r"[^a-záàâãéèêíïóôõöúçñ\s]").expect("valid letter filter"),
        experience: [
            r"(\d+)\s*anos?\s*de\s*experiência",
            r"(\d+)\s*years?\s*of\s*experience",
            r"experiência\s*de\s*(\d+)\s*anos?",
            r"(\d+)\s*anos?\s*atuando",
            r"(\d+)\s*anos?\s*trabalhando",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid experience pattern"))
        .collect(),
    })
}

fn stop_words() -> &'static HashSet<&'static str> {
    static S: OnceLock<HashSet<&'static str>> = OnceLock::new();
    S.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Lowercase, keep letters and whitespace, split into words, drop stop
/// words and anything of two characters or fewer.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let letters = patterns().non_letters.replace_all(&lowered, "");
    let stops = stop_words();
    letters
        .unicode_words()
        .filter(|w| w.chars().count() > 2 && !stops.contains(w))
        .map(str::to_string)
        .collect()
}

/// Percentage of the unique keyword tokens present in `tokens`.
pub fn keyword_score(tokens: &HashSet<String>, keywords: &[&str]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let wanted: HashSet<String> = keywords.iter().flat_map(|k| tokenize(k)).collect();
    if wanted.is_empty() {
        return 0.0;
    }
    let hits = wanted.iter().filter(|k| tokens.contains(*k)).count();
    hits as f64 * 100.0 / wanted.len() as f64
}

pub fn experience_level(text: &str) -> (u32, &'static str) {
    let lowered = text.to_lowercase();
    let years = patterns()
        .experience
        .iter()
        .flat_map(|re| re.captures_iter(&lowered))
        .filter_map(|c| c.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
        .max();
    match years {
        Some(y) if y >= 5 => (y, "Sênior"),
        Some(y) if y >= 2 => (y, "Pleno"),
        Some(y) => (y, "Júnior"),
        None => (0, "Não identificado"),
    }
}

pub fn education(text: &str) -> EducationFlags {
    let t = text.to_lowercase();
    let any = |markers: &[&str]| markers.iter().any(|m| t.contains(m));
    EducationFlags {
        superior_completo: any(DEGREE_MARKERS),
        pos_graduacao: any(POSTGRAD_MARKERS),
        mba: any(MBA_MARKERS),
        area_relevante: any(RELEVANT_AREAS),
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                Some(first) => first.to_uppercase().chain(c).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn recommendations(
    job_scores: &BTreeMap<String, f64>,
    experience_years: u32,
    education: EducationFlags,
    technical_score: f64,
) -> Vec<String> {
    let mut out = Vec::new();
    // Catalog order, not map order.
    for (job, _) in JOB_KEYWORDS {
        if job_scores.get(*job).is_some_and(|s| *s < 30.0) {
            out.push(format!(
                "Para {}: Adicione mais palavras-chave específicas da área, como experiências com sistemas ERP, análises financeiras e processos específicos.",
                title_case(job)
            ));
        }
    }
    if experience_years < 2 {
        out.push(
            "Destaque projetos acadêmicos, estágios e cursos que demonstrem conhecimento prático na área financeira."
                .to_string(),
        );
    }
    if !education.superior_completo {
        out.push(
            "Considere completar um curso superior em área relacionada (Administração, Economia, Contabilidade)."
                .to_string(),
        );
    }
    if !education.pos_graduacao && experience_years >= 3 {
        out.push(
            "Para posições mais seniores, considere fazer uma pós-graduação ou MBA em Finanças ou Controladoria."
                .to_string(),
        );
    }
    if technical_score < 40.0 {
        out.push(
            "Desenvolva habilidades em ferramentas como Excel avançado, Power BI, SQL e sistemas ERP (SAP, Oracle, TOTVS)."
                .to_string(),
        );
    }
    if out.is_empty() {
        out.push(
            "Seu currículo está bem estruturado! Continue atualizando com novas experiências e certificações."
                .to_string(),
        );
    }
    out
}

/// Score `text` against every catalog.
pub fn analyze(text: &str) -> Result<ResumeAnalysis, ResumeError> {
    if text.trim().is_empty() {
        return Err(ResumeError::EmptyText);
    }
    let tokens: HashSet<String> = tokenize(text).into_iter().collect();

    let mut job_scores = BTreeMap::new();
    let mut star_ratings = BTreeMap::new();
    let mut stars_total = 0.0;
    for (job, keywords) in JOB_KEYWORDS {
        let score = round1(keyword_score(&tokens, keywords));
        let stars = (score / 20.0).clamp(0.0, 5.0);
        stars_total += stars;
        job_scores.insert(job.to_string(), score);
        star_ratings.insert(job.to_string(), round1(stars));
    }
    let overall_rating = round1(stars_total / JOB_KEYWORDS.len() as f64);

    let technical_score = round1(keyword_score(&tokens, TECHNICAL_SKILLS));
    let soft_skills_score = round1(keyword_score(&tokens, SOFT_SKILLS));
    let (experience_years, level) = experience_level(text);
    let education = education(text);

    Ok(ResumeAnalysis {
        recommendations: recommendations(&job_scores, experience_years, education, technical_score),
        job_scores,
        technical_score,
        soft_skills_score,
        experience_years,
        experience_level: level.to_string(),
        education,
        overall_rating,
        star_ratings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_short_and_stop_words() {
        let t = tokenize("Analista com 5 anos de experiência em SAP e Excel!");
        assert!(t.contains(&"analista".to_string()));
        assert!(t.contains(&"sap".to_string()));
        assert!(!t.contains(&"com".to_string()));
        assert!(!t.contains(&"em".to_string()));
        assert!(!t.iter().any(|w| w.chars().any(|c| c.is_ascii_digit())));
    }

    #[test]
    fn test_experience_takes_maximum() {
        assert_eq!(experience_level("3 anos de experiência; 6 years of experience"), (6, "Sênior"));
        assert_eq!(experience_level("experiência de 2 anos"), (2, "Pleno"));
        assert_eq!(experience_level("1 ano atuando"), (1, "Júnior"));
        assert_eq!(experience_level("nada"), (0, "Não identificado"));
    }

    #[test]
    fn test_keyword_score_is_unique_fraction() {
        let tokens: HashSet<String> = tokenize("excel excel python").into_iter().collect();
        assert_eq!(keyword_score(&tokens, &["excel", "python", "tableau", "sql"]), 50.0);
    }

    #[test]
    fn test_empty_text_is_refused() {
        assert!(matches!(analyze("   \n"), Err(ResumeError::EmptyText)));
    }

    #[test]
    fn test_recommendation_order() {
        let a = analyze("Trabalho dedicado.").unwrap();
        assert!(a.recommendations[0].starts_with("Para Analista Financeiro"));
        assert_eq!(a.experience_level, "Não identificado");
        assert_eq!(a.overall_rating, 0.0);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("analista_precificacao"), "Analista Precificacao");
    }
}
