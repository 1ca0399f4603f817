//! The application-flow engine and the site knowledge it runs on.

pub mod auth;
pub mod events;
pub mod flow;
pub mod harvester;
pub mod pacing;
pub mod questionnaire;
pub mod relevance;
pub mod run;
pub mod search_url;
pub mod selectors;
pub mod state;

pub use auth::LoginCredentials;
pub use events::{LogLevel, RunObserver};
pub use flow::{ApplyFlow, PostingReport};
pub use harvester::PostingDescriptor;
pub use relevance::JobCategory;
pub use run::{Engine, RunRequest, RunSummary};
pub use search_url::SortOrder;
pub use selectors::{Platform, SelectorPolicy};
pub use state::{FlowState, PostingOutcome};
