use thiserror::Error;

#[derive(Error, Debug)]
pub enum InviteError {
    #[error("Invalid dial-in numbers: {0}")]
    InvalidNumbers(String),

    #[error("Empty template")]
    EmptyTemplate,
}
