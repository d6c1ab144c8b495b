use crate::core::models::{Account, AccountId, Instance};

/// Identifier of the "add account" row in the profile header.
pub const ADD_ACCOUNT_PROFILE_ID: AccountId = -13;

/// Shown in the footer when instance metadata could not be fetched.
pub const INSTANCE_DATA_FAILED: &str = "Failed to fetch instance data";

/// Position the follow-requests row takes when the account is locked.
const FOLLOW_REQUESTS_POSITION: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawerItemId {
    EditProfile,
    Favourites,
    Bookmarks,
    Lists,
    Search,
    SavedToots,
    AccountSettings,
    Settings,
    About,
    LogOut,
    FollowRequests,
    ScheduledToots,
}

/// Screens the drawer can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    EditProfile,
    Favourites,
    Bookmarks,
    Lists,
    Search,
    SavedToots,
    ScheduledToots,
    FollowRequests,
    AccountPreferences,
    Preferences,
    About,
    Profile(AccountId),
    Login { adding_account: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawerEntry {
    Primary { id: DrawerItemId, label: &'static str, icon: &'static str },
    Secondary { id: DrawerItemId, label: &'static str, icon: &'static str },
    Divider,
}

impl DrawerEntry {
    pub fn id(&self) -> Option<DrawerItemId> {
        match self {
            DrawerEntry::Primary { id, .. } | DrawerEntry::Secondary { id, .. } => Some(*id),
            DrawerEntry::Divider => None,
        }
    }
}

/// What a drawer row does when tapped.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawerAction {
    Open(Screen),
    LogOut,
}

impl DrawerItemId {
    pub fn action(self) -> DrawerAction {
        let screen = match self {
            DrawerItemId::EditProfile => Screen::EditProfile,
            DrawerItemId::Favourites => Screen::Favourites,
            DrawerItemId::Bookmarks => Screen::Bookmarks,
            DrawerItemId::Lists => Screen::Lists,
            DrawerItemId::Search => Screen::Search,
            DrawerItemId::SavedToots => Screen::SavedToots,
            DrawerItemId::ScheduledToots => Screen::ScheduledToots,
            DrawerItemId::FollowRequests => Screen::FollowRequests,
            DrawerItemId::AccountSettings => Screen::AccountPreferences,
            DrawerItemId::Settings => Screen::Preferences,
            DrawerItemId::About => Screen::About,
            DrawerItemId::LogOut => return DrawerAction::LogOut,
        };
        DrawerAction::Open(screen)
    }
}

/// One row in the account switcher header.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileEntry {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub icon: String,
    pub selected: bool,
}

/// Footer line with instance info and its hidden click counter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Footer {
    text: String,
}

impl Footer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_instance(&mut self, result: &Result<Instance, String>) {
        self.text = match result {
            Ok(i) => format!("{}\n{}\n{}", i.title, i.uri, i.version),
            Err(_) => INSTANCE_DATA_FAILED.to_string(),
        };
    }

    /// Each tap appends a `?`. Seven in a row strips them and returns true.
    pub fn click(&mut self) -> bool {
        self.text.push('?');
        if self.text.ends_with("???????") {
            let keep = self.text.len() - "???????".len();
            self.text.truncate(keep);
            return true;
        }
        false
    }
}

#[derive(Debug, Clone)]
pub struct Drawer {
    entries: Vec<DrawerEntry>,
    profiles: Vec<ProfileEntry>,
    active_profile: Option<AccountId>,
    open: bool,
    pub footer: Footer,
}

impl Default for Drawer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drawer {
    pub fn new() -> Self {
        use DrawerItemId::*;
        let entries = vec![
            DrawerEntry::Primary { id: EditProfile, label: "Edit profile", icon: "person" },
            DrawerEntry::Primary { id: Favourites, label: "Favourites", icon: "star" },
            DrawerEntry::Primary { id: Bookmarks, label: "Bookmarks", icon: "bookmark" },
            DrawerEntry::Primary { id: Lists, label: "Lists", icon: "list" },
            DrawerEntry::Primary { id: Search, label: "Search", icon: "search" },
            DrawerEntry::Primary { id: SavedToots, label: "Drafts", icon: "notebook" },
            DrawerEntry::Primary { id: ScheduledToots, label: "Scheduled toots", icon: "access_time" },
            DrawerEntry::Divider,
            DrawerEntry::Secondary { id: AccountSettings, label: "Account preferences", icon: "account_settings" },
            DrawerEntry::Secondary { id: Settings, label: "Preferences", icon: "settings" },
            DrawerEntry::Secondary { id: About, label: "About", icon: "info" },
            DrawerEntry::Secondary { id: LogOut, label: "Log out", icon: "logout" },
        ];
        Drawer {
            entries,
            profiles: Vec::new(),
            active_profile: None,
            open: false,
            footer: Footer::default(),
        }
    }

    pub fn entries(&self) -> &[DrawerEntry] {
        &self.entries
    }

    pub fn profiles(&self) -> &[ProfileEntry] {
        &self.profiles
    }

    pub fn active_profile(&self) -> Option<AccountId> {
        self.active_profile
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn contains(&self, id: DrawerItemId) -> bool {
        self.entries.iter().any(|e| e.id() == Some(id))
    }

    /// Locked accounts get a follow-requests row; unlocked ones lose it.
    pub fn set_locked(&mut self, locked: bool) {
        let present = self.contains(DrawerItemId::FollowRequests);
        if locked && !present {
            let at = FOLLOW_REQUESTS_POSITION.min(self.entries.len());
            self.entries.insert(
                at,
                DrawerEntry::Primary {
                    id: DrawerItemId::FollowRequests,
                    label: "Follow requests",
                    icon: "person_add",
                },
            );
        } else if !locked && present {
            self.entries
                .retain(|e| e.id() != Some(DrawerItemId::FollowRequests));
        }
    }

    /// Rebuild the profile header from the registry listing (active first),
    /// followed by the "add account" row.
    pub fn update_profiles(&mut self, accounts: &[Account]) {
        let mut profiles: Vec<ProfileEntry> = accounts
            .iter()
            .map(|a| ProfileEntry {
                id: a.id,
                name: a.display_name.clone(),
                email: a.full_name(),
                icon: a.profile_picture_url.clone(),
                selected: a.active,
            })
            .collect();
        profiles.push(ProfileEntry {
            id: ADD_ACCOUNT_PROFILE_ID,
            name: "Add account".into(),
            email: "Add new Mastodon account".into(),
            icon: "add".into(),
            selected: false,
        });
        self.active_profile = accounts.iter().find(|a| a.active).map(|a| a.id);
        self.profiles = profiles;
    }
}
