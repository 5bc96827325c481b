use serde::{Deserialize, Serialize};
use std::fmt;

/// Méthode d'authentification principale d'un compte.
///
/// Closed set: the engine never needs runtime-pluggable providers, only
/// per-variant adapter behavior and a per-variant verification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
    Apple,
    Facebook,
}

impl AuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Google => "google",
            Self::Apple => "apple",
            Self::Facebook => "facebook",
        }
    }

    /// Parse la valeur stockée en base (ou reçue dans une URL)
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "local" => Some(Self::Local),
            "google" => Some(Self::Google),
            "apple" => Some(Self::Apple),
            "facebook" => Some(Self::Facebook),
            _ => None,
        }
    }

    pub fn is_social(self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
