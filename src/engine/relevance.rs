//! Category keyword tables and the lenient relevance filter.

use aho_corasick::{AhoCorasick, MatchKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    #[serde(alias = "analista_financeiro")]
    FinancialAnalyst,
    #[serde(alias = "contas_pagar")]
    AccountsPayable,
    #[serde(alias = "contas_receber")]
    AccountsReceivable,
    #[serde(alias = "analista_precificacao")]
    PricingAnalyst,
    #[serde(alias = "custos")]
    Costs,
    Backoffice,
}

impl JobCategory {
    pub const ALL: [JobCategory; 6] = [
        JobCategory::FinancialAnalyst,
        JobCategory::AccountsPayable,
        JobCategory::AccountsReceivable,
        JobCategory::PricingAnalyst,
        JobCategory::Costs,
        JobCategory::Backoffice,
    ];

    /// Phrase typed into the site's search box for this category.
    pub fn search_phrase(self) -> &'static str {
        match self {
            JobCategory::FinancialAnalyst => "analista financeiro",
            JobCategory::AccountsPayable => "contas a pagar",
            JobCategory::AccountsReceivable => "contas a receber",
            JobCategory::PricingAnalyst => "analista de precificação",
            JobCategory::Costs => "analista de custos",
            JobCategory::Backoffice => "backoffice financeiro",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            JobCategory::FinancialAnalyst => &[
                "analista financeiro",
                "analista financeira",
                "financial analyst",
                "finance analyst",
                "fp&a",
                "planejamento financeiro",
            ],
            JobCategory::AccountsPayable => &[
                "contas a pagar",
                "accounts payable",
                "pagamentos",
                "fornecedores",
            ],
            JobCategory::AccountsReceivable => &[
                "contas a receber",
                "accounts receivable",
                "cobrança",
                "faturamento",
                "crédito e cobrança",
            ],
            JobCategory::PricingAnalyst => &[
                "precificação",
                "pricing",
                "formação de preço",
                "preços",
            ],
            JobCategory::Costs => &[
                "custos",
                "custo",
                "cost analyst",
                "cost accounting",
                "controladoria",
            ],
            JobCategory::Backoffice => &[
                "backoffice",
                "back office",
                "back-office",
                "assistente administrativo financeiro",
                "auxiliar financeiro",
            ],
        }
    }
}

/// Secondary pass, applied for any non-empty category set.
pub const GENERAL_FINANCE_TERMS: &[&str] = &[
    "financeiro",
    "financeira",
    "finanças",
    "finance",
    "tesouraria",
    "treasury",
    "contábil",
    "contabilidade",
    "fiscal",
    "conciliação",
];

/// Pattern index → owning category (`None` for the general terms).
struct Matcher {
    ac: AhoCorasick,
    owners: Vec<Option<JobCategory>>,
}

static MATCHER: OnceLock<Matcher> = OnceLock::new();

fn matcher() -> &'static Matcher {
    MATCHER.get_or_init(|| {
        let mut patterns = Vec::new();
        let mut owners = Vec::new();
        for cat in JobCategory::ALL {
            for kw in cat.keywords() {
                patterns.push(*kw);
                owners.push(Some(cat));
            }
        }
        for term in GENERAL_FINANCE_TERMS {
            patterns.push(*term);
            owners.push(None);
        }
        let ac = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .expect("valid category keyword patterns");
        Matcher { ac, owners }
    })
}

/// `true` when any keyword of a selected category, or any general finance
/// term, occurs in the case-folded title or description. An empty selection
/// matches nothing.
pub fn is_relevant(
    title: &str,
    description: Option<&str>,
    categories: &BTreeSet<JobCategory>,
) -> bool {
    if categories.is_empty() {
        return false;
    }
    let m = matcher();
    let haystack = format!(
        "{}\n{}",
        title.to_lowercase(),
        description.unwrap_or_default().to_lowercase()
    );
    m.ac
        .find_overlapping_iter(&haystack)
        .any(|hit| match m.owners[hit.pattern().as_usize()] {
            Some(cat) => categories.contains(&cat),
            None => true,
        })
}

/// Search phrases for `categories`, in table order. An empty selection
/// searches the first category.
pub fn search_phrases(categories: &BTreeSet<JobCategory>) -> Vec<&'static str> {
    let phrases: Vec<&'static str> = JobCategory::ALL
        .iter()
        .filter(|c| categories.contains(c))
        .map(|c| c.search_phrase())
        .collect();
    if phrases.is_empty() {
        vec![JobCategory::FinancialAnalyst.search_phrase()]
    } else {
        phrases
    }
}
