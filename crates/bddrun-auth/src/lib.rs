//! Authentication contexts handed to the execution engine.

use bddrun_ports::AuthContext;

pub const DEFAULT_TOKEN_ENV: &str = "BDDRUN_AUTH_TOKEN";
pub const DEFAULT_HEADER: &str = "Authorization";

/// Requests go out without credentials.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAuth;

impl AuthContext for NoAuth {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn auth_summary(&self) -> String {
        "none".to_string()
    }
}

/// A static token sent on every request.
///
/// With the `Authorization` header the value is `Bearer <token>`; any other
/// header (an API key header, say) carries the bare token.
#[derive(Clone)]
pub struct BearerAuth {
    header: String,
    token: String,
    source: String,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("header", &self.header)
            .field("token", &mask(&self.token))
            .field("source", &self.source)
            .finish()
    }
}

impl BearerAuth {
    pub fn new(token: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            token: token.into(),
            source: "configuration".to_string(),
        }
    }

    /// Token from the environment variable `var`. Unset or blank means `None`.
    pub fn from_env(var: &str, header: &str) -> Option<Self> {
        Self::from_lookup(var, header, |name| std::env::var(name).ok())
    }

    pub fn from_lookup(
        var: &str,
        header: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<Self> {
        let token = lookup(var)?.trim().to_string();
        if token.is_empty() {
            return None;
        }
        Some(Self {
            header: header.to_string(),
            token,
            source: var.to_string(),
        })
    }

    fn header_value(&self) -> String {
        if self.header.eq_ignore_ascii_case(DEFAULT_HEADER) {
            format!("Bearer {}", self.token)
        } else {
            self.token.clone()
        }
    }
}

impl AuthContext for BearerAuth {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn auth_summary(&self) -> String {
        format!(
            "token from {} in {} header ({})",
            self.source,
            self.header,
            mask(&self.token)
        )
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![(self.header.clone(), self.header_value())]
    }
}

/// Bearer auth when the variable holds a token, anonymous otherwise.
pub fn resolve_auth(token_env: &str, header: &str) -> Box<dyn AuthContext> {
    match BearerAuth::from_env(token_env, header) {
        Some(auth) => Box::new(auth),
        None => Box::new(NoAuth),
    }
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
