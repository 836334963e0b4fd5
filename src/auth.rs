use std::fmt;

/// Value shipped in the sample `.env` files; treated the same as a missing token.
const PLACEHOLDER_TOKEN: &str = "YOUR_DBT_CLOUD_API_TOKEN_HERE";

/// dbt Cloud service or personal access token, sent as a bearer credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.trim().is_empty() || self.0 == PLACEHOLDER_TOKEN
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Never print the secret, even in debug logs.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}
