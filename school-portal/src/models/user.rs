use serde::{Deserialize, Serialize};

/// Identity record as returned by the auth provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Provider-level role claim (usually `authenticated`), not the school role.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn display_email(&self) -> String {
        self.email.clone().unwrap_or_else(|| self.id.clone())
    }
}

/// Token pair issued by the provider on sign-in or refresh.
#[derive(Debug, Deserialize, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: User,
}

/// Row of the `users` table.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserRow {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl UserRow {
    pub const COLUMNS: &'static str = "id,email,full_name,role,created_at";

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }

    pub fn name(&self) -> String {
        match (&self.full_name, &self.email) {
            (Some(name), _) if !name.trim().is_empty() => name.clone(),
            (_, Some(email)) => email.split('@').next().unwrap_or("User").to_string(),
            _ => "User".to_string(),
        }
    }

    pub fn role_label(&self) -> &str {
        self.role.as_deref().unwrap_or("member")
    }

    pub fn email_label(&self) -> &str {
        self.email.as_deref().unwrap_or("-")
    }
}
