//! Site knowledge, kept apart from the engine so that a DOM change is a
//! policy edit rather than an engine edit.

use serde::{Deserialize, Serialize};

use crate::browser::Locator;

/// Platforms the HTTP surface accepts. Only LinkedIn has a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linkedin,
    Infojobs,
    Catho,
    Gupy,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Linkedin,
        Platform::Infojobs,
        Platform::Catho,
        Platform::Gupy,
    ];

    /// Display label, also used as the `platform` column value.
    pub fn label(self) -> &'static str {
        match self {
            Platform::Linkedin => "LinkedIn",
            Platform::Infojobs => "InfoJobs",
            Platform::Catho => "Catho",
            Platform::Gupy => "Gupy",
        }
    }

    /// Key used by credentials (`"linkedin"`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Platform::Linkedin => "linkedin",
            Platform::Infojobs => "infojobs",
            Platform::Catho => "catho",
            Platform::Gupy => "gupy",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_lowercase();
        Platform::ALL.into_iter().find(|p| p.key() == wanted)
    }

    pub fn selector_policy(self) -> Option<SelectorPolicy> {
        match self {
            Platform::Linkedin => Some(SelectorPolicy::linkedin()),
            _ => None,
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct SelectorPolicy {
    /// Bumped whenever the site's DOM forces a selector change.
    pub schema_version: u32,
    pub platform: Platform,
    pub base_url: String,
    pub login_url: String,
    pub feed_url: String,

    // ── auth ─────────────────────────────────────────────────────────────────
    /// Profile affordance shown only to a signed-in member.
    pub profile_markers: Vec<Locator>,
    pub username_input: Locator,
    pub password_input: Locator,
    pub login_submit: Locator,
    /// URL fragments of pages reached after a successful login.
    pub logged_in_url_markers: Vec<String>,
    pub challenge_url_markers: Vec<String>,
    /// Case-folded page-source tokens of a captcha or verification wall.
    pub challenge_page_tokens: Vec<String>,
    pub credential_error_phrases: Vec<String>,

    // ── search list ──────────────────────────────────────────────────────────
    /// Ranked; the first selector with any match wins.
    pub card_selectors: Vec<String>,
    pub card_link_selectors: Vec<String>,
    pub card_title_selectors: Vec<String>,
    pub card_employer_selectors: Vec<String>,
    pub card_location_selectors: Vec<String>,
    pub one_click_tokens: Vec<String>,
    pub applied_tokens: Vec<String>,

    // ── posting detail ───────────────────────────────────────────────────────
    pub detail_panels: Vec<Locator>,
    /// Searched inside the detail panel only.
    pub applied_badge: Locator,
    /// Ranked apply-control strategies.
    pub apply_controls: Vec<Locator>,
    pub overlay_close: Locator,

    // ── application modal ────────────────────────────────────────────────────
    pub modal_containers: Vec<Locator>,
    pub modal_scroll: Locator,
    pub step_button_primary: Vec<Locator>,
    pub step_button_caption: Locator,
    pub submit_captions: Vec<String>,
    pub review_captions: Vec<String>,
    pub next_captions: Vec<String>,
    pub modal_dismiss: Locator,

    pub discard_modals: Vec<Locator>,
    pub discard_button: Locator,
    pub save_button: Locator,

    // ── confirmation ─────────────────────────────────────────────────────────
    pub confirmation_containers: Vec<Locator>,
    pub confirmation_phrases: Vec<String>,
    pub confirmation_url_markers: Vec<String>,
    pub done_button: Locator,

    // ── questionnaire ────────────────────────────────────────────────────────
    pub placeholder_options: Vec<String>,
}

impl SelectorPolicy {
    pub fn linkedin() -> Self {
        Self {
            schema_version: 3,
            platform: Platform::Linkedin,
            base_url: "https://www.linkedin.com".into(),
            login_url: "https://www.linkedin.com/login".into(),
            feed_url: "https://www.linkedin.com/feed/".into(),

            profile_markers: vec![
                Locator::css("img.global-nav__me-photo"),
                Locator::css("button.global-nav__primary-link-me-menu-trigger"),
                Locator::css("div.feed-identity-module"),
            ],
            username_input: Locator::css("#username"),
            password_input: Locator::css("#password"),
            login_submit: Locator::css("button[type='submit']"),
            logged_in_url_markers: owned(&["/feed", "/jobs", "/in/", "/mynetwork"]),
            challenge_url_markers: owned(&["checkpoint/challenge", "/checkpoint/", "captcha"]),
            challenge_page_tokens: owned(&[
                "recaptcha",
                "i'm not a robot",
                "não sou um robô",
                "security verification",
                "verificação de segurança",
            ]),
            credential_error_phrases: owned(&[
                "wrong email or password",
                "that's not the right password",
                "couldn't find a linkedin account",
                "e-mail ou senha incorretos",
                "senha incorreta",
                "não encontramos uma conta",
            ]),

            card_selectors: owned(&[
                "li[data-occludable-job-id]",
                "ul.scaffold-layout__list-container li",
                "ul.jobs-search__results-list li",
                "div.job-card-container",
            ]),
            card_link_selectors: owned(&[
                "a[href*='/jobs/view/']",
                "a.base-card__full-link",
                "a.job-card-list__title",
                "a.job-card-container__link",
            ]),
            card_title_selectors: owned(&[
                ".job-card-list__title",
                ".base-search-card__title",
                ".job-card-container__title",
                "a[href*='/jobs/view/'] strong",
            ]),
            card_employer_selectors: owned(&[
                ".job-card-container__company-name",
                ".artdeco-entity-lockup__subtitle",
                ".base-search-card__subtitle",
                ".job-card-list__company",
            ]),
            card_location_selectors: owned(&[
                ".job-card-container__metadata-item",
                ".job-card-list__location",
                ".job-search-card__location",
                ".artdeco-entity-lockup__caption",
            ]),
            one_click_tokens: owned(&[
                "candidatura simplificada",
                "easy apply",
                "jobs-apply-button",
            ]),
            applied_tokens: owned(&[
                "candidatura enviada",
                "candidatou-se",
                "you already applied",
                "job-card-container__footer-job-state",
            ]),

            detail_panels: vec![
                Locator::css("div.jobs-search__job-details"),
                Locator::css("div.jobs-details__main-content"),
                Locator::css("div[id*='job-details']"),
                Locator::css("div.job-view-layout"),
            ],
            applied_badge: Locator::caption(
                ".artdeco-inline-feedback__message, .jobs-s-apply__application-link, .post-apply-timeline__entity, .jobs-details-top-card__apply-error",
                &["candidatura enviada", "candidatou-se", "you already applied", "applied"],
            ),
            apply_controls: vec![
                Locator::css("button#jobs-apply-button-id"),
                Locator::css(
                    "button[aria-label*='Candidatura simplificada'], button[aria-label*='Easy Apply']",
                ),
                Locator::caption("button", &["candidatura simplificada", "easy apply"]),
                Locator::css("button[data-control-name*='apply']"),
                Locator::css(
                    "div.jobs-apply-button button, div.jobs-apply-button--top-card button, div.jobs-s-apply button",
                ),
            ],
            overlay_close: Locator::css(
                "button[aria-label='Fechar'], button[aria-label='Dismiss'], button.msg-overlay-bubble-header__control--close-btn",
            ),

            modal_containers: vec![
                Locator::css("div[data-test-modal-container][data-test-modal-id*='easy-apply-modal']"),
                Locator::css("div.jobs-easy-apply-modal"),
                Locator::caption("div[role='dialog']", &["candidatura", "apply to", "application"]),
            ],
            modal_scroll: Locator::css(".jobs-easy-apply-modal__content, .artdeco-modal__content"),
            step_button_primary: vec![
                Locator::css("button[data-easy-apply-next-button]"),
                Locator::css("button[data-live-test-easy-apply-submit-button]"),
                Locator::css("button[data-live-test-easy-apply-review-button]"),
                Locator::css("button[data-live-test-easy-apply-next-button]"),
            ],
            step_button_caption: Locator::caption(
                "button",
                &[
                    "enviar candidatura",
                    "submit application",
                    "revisar",
                    "review",
                    "avançar",
                    "próximo",
                    "próxima",
                    "next",
                    "continuar",
                ],
            ),
            submit_captions: owned(&["enviar candidatura", "submit application", "enviar", "submit"]),
            review_captions: owned(&["revisar", "review"]),
            next_captions: owned(&["avançar", "próximo", "próxima", "next", "continuar", "continue"]),
            modal_dismiss: Locator::css("button.artdeco-modal__dismiss, button[aria-label='Fechar'], button[aria-label='Dismiss']"),

            discard_modals: vec![
                Locator::css("div[data-test-modal-id*='discard-confirmation']"),
                Locator::caption(
                    "div[role='alertdialog'], div[role='dialog']",
                    &["salvar esta candidatura", "save this application"],
                ),
            ],
            discard_button: Locator::caption(
                "button[data-control-name='discard_application_confirm_btn'], button",
                &["descartar", "discard"],
            ),
            save_button: Locator::caption(
                "button[data-control-name='save_application_btn'], button",
                &["salvar", "save"],
            ),

            confirmation_containers: vec![
                Locator::css("[data-live-test='easy-apply-submitted']"),
                Locator::css("div.jobs-apply-submit-confirmation"),
                Locator::css("div.post-apply-timeline"),
                Locator::css("div.application-submitted"),
            ],
            confirmation_phrases: owned(&[
                "sua candidatura foi enviada",
                "candidatura enviada",
                "your application was sent",
                "application submitted",
                "application sent",
            ]),
            confirmation_url_markers: owned(&["/post-apply", "postapply", "applied=true"]),
            done_button: Locator::caption("button", &["concluído", "concluir", "done"]),

            placeholder_options: owned(&[
                "",
                "select an option",
                "selecione uma opção",
                "selecionar opção",
                "selecione",
                "escolha uma opção",
                "--",
            ]),
        }
    }

    /// Link of one specific posting inside the result list.
    pub fn posting_link(&self, platform_id: &str) -> Locator {
        Locator::css(format!("a[href*='/jobs/view/{}']", platform_id))
    }

    pub fn is_placeholder_option(&self, text: &str) -> bool {
        let t = text.trim().to_lowercase();
        self.placeholder_options.iter().any(|p| *p == t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_linkedin_is_drivable() {
        assert!(Platform::Linkedin.selector_policy().is_some());
        for p in [Platform::Infojobs, Platform::Catho, Platform::Gupy] {
            assert!(p.selector_policy().is_none());
        }
        assert_eq!(Platform::from_key(" LinkedIn "), Some(Platform::Linkedin));
        assert_eq!(Platform::from_key("indeed"), None);
    }

    #[test]
    fn test_placeholder_detection() {
        let p = SelectorPolicy::linkedin();
        assert!(p.is_placeholder_option("Select an option"));
        assert!(p.is_placeholder_option("  "));
        assert!(!p.is_placeholder_option("Sim"));
    }
}
