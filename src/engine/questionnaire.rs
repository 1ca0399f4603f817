//! Answers for the application questionnaire.
//!
//! Everything here is pure: the flow engine scans the modal, hands the
//! snapshot to [`plan_fills`], and applies whatever comes back.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::selectors::SelectorPolicy;
use crate::browser::{FieldError, FieldFill, FieldKind, FormField};
use crate::core::config::AnswerSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerBank {
    pub years_experience: String,
    /// Digits only.
    pub salary: String,
    pub language_level: String,
    pub cover_letter: String,
    pub default_text: String,
}

impl AnswerBank {
    pub fn from_settings(settings: &AnswerSettings) -> Self {
        Self {
            years_experience: settings.resolve_years_experience(),
            salary: settings.resolve_salary(),
            language_level: settings.resolve_language_level(),
            cover_letter: settings.resolve_cover_letter(),
            default_text: settings.resolve_default_text(),
        }
    }

    fn text_for(&self, topic: Topic) -> &str {
        match topic {
            Topic::YearsOfExperience => &self.years_experience,
            Topic::Salary => &self.salary,
            Topic::Language => &self.language_level,
            Topic::CoverLetter => &self.cover_letter,
            Topic::Other => &self.default_text,
        }
    }

    /// Numeric answer for `type=number` inputs.
    fn number_for(&self, topic: Topic) -> &str {
        match topic {
            Topic::Salary => &self.salary,
            _ => &self.years_experience,
        }
    }
}

impl Default for AnswerBank {
    fn default() -> Self {
        Self::from_settings(&AnswerSettings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    YearsOfExperience,
    Salary,
    Language,
    CoverLetter,
    Other,
}

struct TopicPatterns {
    years: Regex,
    salary: Regex,
    language: Regex,
    cover: Regex,
    affirmative: Regex,
    decimal_error: Regex,
    integer_error: Regex,
}

static PATTERNS: OnceLock<TopicPatterns> = OnceLock::new();

fn patterns() -> &'static TopicPatterns {
    PATTERNS.get_or_init(|| TopicPatterns {
        years: Regex::new(
            r"quantos anos|how many years|anos de experi|years of experience|years experience|experi[eê]ncia (com|em|de)|(anos|years).{0,40}experi|experi.{0,40}(anos|years)",
        )
        .expect("valid years pattern"),
        salary: Regex::new(
            r"sal[aá]ri|pretens[aã]o|remunera|compensation|compensa[cç][aã]o|salary|expectativa salarial|\bctc\b",
        )
        .expect("valid salary pattern"),
        language: Regex::new(
            r"ingl[eê]s|english|espanhol|spanish|franc[eê]s|french|idioma|language|flu[eê]n|profici",
        )
        .expect("valid language pattern"),
        cover: Regex::new(
            r"\bwhy\b|por que|porque|describe|descreva|briefly|brevemente|cover letter|carta de apresenta|conte.{0,10}sobre|tell us",
        )
        .expect("valid cover-letter pattern"),
        affirmative: Regex::new(r"\b(yes|sim|true)\b").expect("valid affirmative pattern"),
        decimal_error: Regex::new(r"decimal|larger than 0\.0|maior que 0[.,]0")
            .expect("valid decimal-error pattern"),
        integer_error: Regex::new(r"whole number|integer|inteiro|entre 0 e 99|between 0 and 99")
            .expect("valid integer-error pattern"),
    })
}

/// Classify a case-folded label bundle. Earlier topics win.
pub fn classify(label: &str) -> Topic {
    let l = label.to_lowercase();
    let p = patterns();
    if p.years.is_match(&l) {
        Topic::YearsOfExperience
    } else if p.salary.is_match(&l) {
        Topic::Salary
    } else if p.language.is_match(&l) {
        Topic::Language
    } else if p.cover.is_match(&l) {
        Topic::CoverLetter
    } else {
        Topic::Other
    }
}

pub fn is_affirmative(text: &str) -> bool {
    patterns().affirmative.is_match(&text.to_lowercase())
}

/// Portuguese spellings shown by the site for the configured proficiency.
fn level_synonyms(level: &str) -> Vec<String> {
    let l = level.trim().to_lowercase();
    let mut out = vec![l.clone()];
    let extra: &[&str] = match l.as_str() {
        "basic" | "básico" | "basico" => &["basic", "básico", "elementar"],
        "intermediate" | "intermediário" | "intermediario" => &["intermediate", "intermediário"],
        "advanced" | "avançado" | "avancado" => &["advanced", "avançado"],
        "fluent" | "fluente" | "native" | "nativo" => &["fluent", "fluente", "nativo"],
        _ => &[],
    };
    out.extend(extra.iter().map(|s| s.to_string()));
    out
}

/// One answered question, kept for the attempt's `questions_answered` blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFill {
    pub fill: FieldFill,
    pub answer: AnsweredQuestion,
}

fn planned(field: &FormField, fill: FieldFill, answer: &str) -> PlannedFill {
    PlannedFill {
        fill,
        answer: AnsweredQuestion {
            question: field.label.clone(),
            answer: answer.to_string(),
        },
    }
}

fn plan_select(field: &FormField, bank: &AnswerBank, policy: &SelectorPolicy) -> Option<PlannedFill> {
    if !policy.is_placeholder_option(&field.value) {
        return None;
    }
    let real: Vec<_> = field
        .options
        .iter()
        .filter(|o| !policy.is_placeholder_option(&o.text))
        .collect();
    let wanted: Vec<String> = match classify(&field.label) {
        Topic::Language => level_synonyms(&bank.language_level),
        Topic::Other => Vec::new(),
        topic => vec![bank.text_for(topic).to_lowercase()],
    };
    let preferred = real.iter().find(|o| {
        let text = o.text.to_lowercase();
        wanted.iter().any(|w| !w.is_empty() && text.contains(w.as_str()))
    });
    let affirmative = || real.iter().find(|o| is_affirmative(&o.text));
    let chosen = preferred
        .or_else(|| if wanted.is_empty() { affirmative() } else { None })
        .or_else(|| real.first())?;
    Some(planned(
        field,
        FieldFill::SelectOption {
            key: field.key.clone(),
            value: chosen.value.clone(),
        },
        &chosen.text,
    ))
}

fn plan_choice(field: &FormField) -> Option<PlannedFill> {
    if field.options.iter().any(|o| o.selected) {
        return None;
    }
    let yes = field
        .options
        .iter()
        .find(|o| is_affirmative(&o.text) || is_affirmative(&o.value))?;
    Some(planned(field, FieldFill::Check { key: yes.key.clone() }, &yes.text))
}

fn plan_text(field: &FormField, bank: &AnswerBank) -> Option<PlannedFill> {
    if !field.value.trim().is_empty() {
        return None;
    }
    let topic = classify(&field.label);
    if field.kind == FieldKind::Number {
        let value = bank.number_for(topic);
        return Some(planned(
            field,
            FieldFill::SetNumber {
                key: field.key.clone(),
                value: value.to_string(),
            },
            value,
        ));
    }
    let text = bank.text_for(topic);
    Some(planned(
        field,
        FieldFill::Type {
            key: field.key.clone(),
            text: text.to_string(),
        },
        text,
    ))
}

/// Fills for every unanswered field of one form step. Answered fields and
/// groups with no affirmative option are left alone.
pub fn plan_fills(fields: &[FormField], bank: &AnswerBank, policy: &SelectorPolicy) -> Vec<PlannedFill> {
    fields
        .iter()
        .filter_map(|f| match f.kind {
            FieldKind::Select => plan_select(f, bank, policy),
            FieldKind::Radio | FieldKind::Checkbox => plan_choice(f),
            FieldKind::Text | FieldKind::TextArea | FieldKind::Number => plan_text(f, bank),
        })
        .collect()
}

/// Rewrites for inputs whose inline error asks for a number: the salary for
/// decimals, the years answer for integers. Other errors are ignored.
pub fn recovery_fills(errors: &[FieldError], fields: &[FormField], bank: &AnswerBank) -> Vec<FieldFill> {
    let p = patterns();
    let mut out: Vec<FieldFill> = Vec::new();
    for err in errors {
        let Some(key) = err.field_key.as_ref() else {
            continue;
        };
        let msg = err.message.to_lowercase();
        let value = if p.decimal_error.is_match(&msg) {
            &bank.salary
        } else if p.integer_error.is_match(&msg) {
            &bank.years_experience
        } else {
            continue;
        };
        if out.iter().any(|f| f.key() == key) {
            continue;
        }
        let kind = fields.iter().find(|f| &f.key == key).map(|f| f.kind);
        out.push(match kind {
            Some(FieldKind::Text) | Some(FieldKind::TextArea) => FieldFill::Type {
                key: key.clone(),
                text: value.clone(),
            },
            _ => FieldFill::SetNumber {
                key: key.clone(),
                value: value.clone(),
            },
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::FieldOption;

    fn field(kind: FieldKind, label: &str, value: &str, options: Vec<FieldOption>) -> FormField {
        FormField {
            key: format!("[data-as-ref=\"{}\"]", label.len()),
            kind,
            label: label.to_string(),
            value: value.to_string(),
            options,
        }
    }

    fn opt(key: &str, text: &str, selected: bool) -> FieldOption {
        FieldOption {
            key: key.to_string(),
            value: key.to_string(),
            text: text.to_string(),
            selected,
        }
    }

    fn bank() -> AnswerBank {
        AnswerBank {
            years_experience: "2".into(),
            salary: "1900".into(),
            language_level: "Basic".into(),
            cover_letter: "COVER".into(),
            default_text: "GENERIC".into(),
        }
    }

    #[test]
    fn test_topic_classification() {
        assert_eq!(classify("Pretensão salarial"), Topic::Salary);
        assert_eq!(classify("How many years of experience do you have with SAP?"), Topic::YearsOfExperience);
        assert_eq!(classify("Qual seu nível de inglês?"), Topic::Language);
        assert_eq!(classify("Describe briefly why you are a fit"), Topic::CoverLetter);
        assert_eq!(classify("Cidade onde mora"), Topic::Other);
    }

    #[test]
    fn test_salary_text_field_gets_configured_value() {
        let fields = vec![field(FieldKind::Text, "Pretensão salarial", "", vec![])];
        let plan = plan_fills(&fields, &bank(), &SelectorPolicy::linkedin());
        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan[0].fill,
            FieldFill::Type {
                key: fields[0].key.clone(),
                text: "1900".into()
            }
        );
        assert_eq!(plan[0].answer.question, "Pretensão salarial");
    }

    #[test]
    fn test_filled_fields_are_skipped() {
        let fields = vec![
            field(FieldKind::Text, "Telefone", "+55 11 99999-0000", vec![]),
            field(
                FieldKind::Select,
                "Você fala inglês?",
                "Sim",
                vec![opt("1", "Sim", true), opt("2", "Não", false)],
            ),
        ];
        assert!(plan_fills(&fields, &bank(), &SelectorPolicy::linkedin()).is_empty());
    }

    #[test]
    fn test_number_inputs_use_scripted_assignment() {
        let fields = vec![field(FieldKind::Number, "Anos de experiência com Excel", "", vec![])];
        let plan = plan_fills(&fields, &bank(), &SelectorPolicy::linkedin());
        assert!(matches!(&plan[0].fill, FieldFill::SetNumber { value, .. } if value == "2"));
    }

    #[test]
    fn test_select_prefers_topic_value_then_first_real_option() {
        let policy = SelectorPolicy::linkedin();
        let lang = field(
            FieldKind::Select,
            "English level",
            "Select an option",
            vec![
                opt("", "Select an option", true),
                opt("n", "Nenhum", false),
                opt("b", "Básico", false),
                opt("f", "Fluente", false),
            ],
        );
        let plan = plan_fills(&[lang], &bank(), &policy);
        assert!(matches!(&plan[0].fill, FieldFill::SelectOption { value, .. } if value == "b"));

        let other = field(
            FieldKind::Select,
            "Modelo de trabalho",
            "",
            vec![opt("", "Selecione", true), opt("h", "Híbrido", false), opt("r", "Remoto", false)],
        );
        let plan = plan_fills(&[other], &bank(), &policy);
        assert!(matches!(&plan[0].fill, FieldFill::SelectOption { value, .. } if value == "h"));

        let yes_no = field(
            FieldKind::Select,
            "Possui CNH?",
            "",
            vec![opt("", "Selecione", true), opt("n", "Não", false), opt("s", "Sim", false)],
        );
        let plan = plan_fills(&[yes_no], &bank(), &policy);
        assert!(matches!(&plan[0].fill, FieldFill::SelectOption { value, .. } if value == "s"));
    }

    #[test]
    fn test_radio_never_defaults_to_no() {
        let policy = SelectorPolicy::linkedin();
        let group = field(
            FieldKind::Radio,
            "Disponibilidade para viagens?",
            "",
            vec![opt("#r-no", "Não", false), opt("#r-yes", "Sim", false)],
        );
        let plan = plan_fills(&[group], &bank(), &policy);
        assert_eq!(plan[0].fill, FieldFill::Check { key: "#r-yes".into() });

        let no_yes = field(
            FieldKind::Radio,
            "Turno",
            "",
            vec![opt("#m", "Manhã", false), opt("#t", "Tarde", false)],
        );
        assert!(plan_fills(&[no_yes], &bank(), &policy).is_empty());
    }

    #[test]
    fn test_affirmative_is_word_bounded() {
        assert!(is_affirmative("Yes"));
        assert!(is_affirmative("sim, possuo"));
        assert!(!is_affirmative("Simulado"));
        assert!(!is_affirmative("eyes"));
    }

    #[test]
    fn test_recovery_rewrites_numeric_errors_once_per_field() {
        let fields = vec![
            field(FieldKind::Text, "Pretensão", "R$ 1.900", vec![]),
            field(FieldKind::Number, "Anos", "dois", vec![]),
        ];
        let errors = vec![
            FieldError {
                field_key: Some(fields[0].key.clone()),
                message: "Enter a decimal number larger than 0.0".into(),
            },
            FieldError {
                field_key: Some(fields[1].key.clone()),
                message: "Insira um número inteiro entre 0 e 99".into(),
            },
            FieldError {
                field_key: Some(fields[1].key.clone()),
                message: "Enter a whole number".into(),
            },
            FieldError {
                field_key: None,
                message: "Enter a whole number".into(),
            },
            FieldError {
                field_key: Some("x".into()),
                message: "Campo obrigatório".into(),
            },
        ];
        let fills = recovery_fills(&errors, &fields, &bank());
        assert_eq!(
            fills,
            vec![
                FieldFill::Type {
                    key: fields[0].key.clone(),
                    text: "1900".into()
                },
                FieldFill::SetNumber {
                    key: fields[1].key.clone(),
                    value: "2".into()
                },
            ]
        );
    }
}
