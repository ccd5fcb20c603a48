use thiserror::Error;

use talkcal_dom::DomError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Could not read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scenario: {0}")]
    Scenario(#[from] serde_json::Error),

    #[error("Page error: {0}")]
    Dom(#[from] DomError),

    #[error("Step {step} needs the {what}, which is not on the page")]
    MissingTarget { step: usize, what: &'static str },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
