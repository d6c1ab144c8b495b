use serde::{Deserialize, Serialize};

/// Registry-assigned account identifier.
pub type AccountId = i64;

/// A logged-in identity on some Mastodon instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub domain: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub profile_picture_url: String,
    #[serde(default)]
    pub header_url: String,
    #[serde(default = "default_tabs")]
    pub tabs: Vec<TabKind>,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    /// Bumped whenever the account becomes active; drives "most recent" ordering.
    #[serde(default)]
    pub last_active_seq: u64,
}

impl Account {
    pub fn new(id: AccountId, domain: &str, username: &str) -> Self {
        Account {
            id,
            domain: domain.to_string(),
            username: username.to_string(),
            display_name: username.to_string(),
            locked: false,
            active: false,
            profile_picture_url: String::new(),
            header_url: String::new(),
            tabs: default_tabs(),
            notifications_enabled: true,
            last_active_seq: 0,
        }
    }

    /// `@username@domain`
    pub fn full_name(&self) -> String {
        format!("@{}@{}", self.username, self.domain)
    }
}

fn default_true() -> bool {
    true
}

pub fn default_tabs() -> Vec<TabKind> {
    vec![
        TabKind::Home,
        TabKind::Notifications,
        TabKind::Local,
        TabKind::Federated,
    ]
}

/// Profile fields returned by verify-credentials or an edit-profile round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub username: String,
    pub display_name: String,
    pub locked: bool,
    pub avatar: String,
    pub header: String,
}

/// One entry of an account's tab preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TabKind {
    Home,
    Notifications,
    Local,
    Federated,
    Direct,
    List { id: String, title: String },
}

impl TabKind {
    /// Accessibility label for the tab icon.
    pub fn description(&self) -> &str {
        match self {
            TabKind::Home => "Home",
            TabKind::Notifications => "Notifications",
            TabKind::Local => "Local",
            TabKind::Federated => "Federated",
            TabKind::Direct => "Direct messages",
            TabKind::List { title, .. } => title,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            TabKind::Home => "home",
            TabKind::Notifications => "notifications",
            TabKind::Local => "local",
            TabKind::Federated => "federated",
            TabKind::Direct => "direct",
            TabKind::List { .. } => "list",
        }
    }
}

/// Author of a status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusAuthor {
    /// Fully qualified handle (`user` or `user@remote`).
    pub username: String,
    pub local_username: String,
    pub display_name: String,
}

/// A status the quick compose widget can reply to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Status {
    pub id: String,
    pub account: StatusAuthor,
    pub content: String,
    #[serde(default)]
    pub spoiler_text: String,
    #[serde(default)]
    pub mentions: Vec<String>,
}

/// Instance metadata shown in the drawer footer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instance {
    pub title: String,
    pub uri: String,
    pub version: String,
}
