use serde::{Deserialize, Serialize};

use crate::core::events::{Event, EventHub};
use crate::core::prefs::PreferenceStore;
use crate::core::store::StoreError;

/// Preference key holding the quick compose visibility.
pub const PREF_CURRENT_VISIBILITY: &str = "current_visibility";

/// Audience scope of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Unknown,
    Public,
    Unlisted,
    Private,
    Unleakable,
}

impl Visibility {
    pub fn from_num(num: i32) -> Self {
        match num {
            1 => Visibility::Public,
            2 => Visibility::Unlisted,
            3 => Visibility::Private,
            4 => Visibility::Unleakable,
            _ => Visibility::Unknown,
        }
    }

    pub fn num(self) -> i32 {
        match self {
            Visibility::Unknown => 0,
            Visibility::Public => 1,
            Visibility::Unlisted => 2,
            Visibility::Private => 3,
            Visibility::Unleakable => 4,
        }
    }

    /// Icon resource shown on the visibility button.
    pub fn icon(self) -> Option<&'static str> {
        match self {
            Visibility::Public => Some("ic_public_24dp"),
            Visibility::Unlisted => Some("ic_lock_open_24dp"),
            Visibility::Private => Some("ic_lock_outline_24dp"),
            Visibility::Unleakable => Some("ic_unleakable_24dp"),
            Visibility::Unknown => None,
        }
    }
}

/// Next visibility when the user taps the visibility button.
pub fn next(current: Visibility, domain_allows_unleakable: bool) -> Visibility {
    match current {
        Visibility::Public => Visibility::Unlisted,
        Visibility::Unlisted => Visibility::Private,
        Visibility::Private if domain_allows_unleakable => Visibility::Unleakable,
        Visibility::Private | Visibility::Unleakable | Visibility::Unknown => Visibility::Public,
    }
}

/// Result of re-validating a stored visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sanitized {
    pub visibility: Visibility,
    /// The stored value was out of the account's capability and got replaced.
    pub corrected: bool,
}

pub fn sanitize(stored: Visibility, domain_allows_unleakable: bool) -> Sanitized {
    if stored == Visibility::Unleakable && !domain_allows_unleakable {
        Sanitized {
            visibility: Visibility::Public,
            corrected: true,
        }
    } else {
        Sanitized {
            visibility: stored,
            corrected: false,
        }
    }
}

/// Instances that federate the unleakable scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnleakableDomains(Vec<String>);

impl Default for UnleakableDomains {
    fn default() -> Self {
        UnleakableDomains(vec!["itabashi.0j0.jp".into(), "odakyu.app".into()])
    }
}

impl UnleakableDomains {
    pub fn new(domains: Vec<String>) -> Self {
        UnleakableDomains(domains)
    }

    pub fn allows(&self, domain: &str) -> bool {
        self.0.iter().any(|d| d.eq_ignore_ascii_case(domain))
    }
}

/// Read the persisted visibility, correcting it if the active account's
/// domain cannot use it.
///
/// A correction is written back and announced with a `PreferenceChanged`
/// event so dependent views re-read.
pub fn read_current(
    prefs: &mut dyn PreferenceStore,
    hub: &EventHub,
    allows_unleakable: bool,
) -> Result<Visibility, StoreError> {
    let stored = Visibility::from_num(
        prefs.get_int(PREF_CURRENT_VISIBILITY, Visibility::Public.num()),
    );
    let checked = sanitize(stored, allows_unleakable);
    if checked.corrected {
        log::info!("Stored visibility {:?} not available, falling back to public", stored);
        prefs.put_int(PREF_CURRENT_VISIBILITY, checked.visibility.num())?;
        hub.publish(Event::PreferenceChanged(PREF_CURRENT_VISIBILITY.into()));
    }
    Ok(checked.visibility)
}

/// Advance the persisted visibility one step and announce the change.
pub fn cycle_current(
    prefs: &mut dyn PreferenceStore,
    hub: &EventHub,
    allows_unleakable: bool,
) -> Result<Visibility, StoreError> {
    let current = read_current(prefs, hub, allows_unleakable)?;
    let advanced = next(current, allows_unleakable);
    prefs.put_int(PREF_CURRENT_VISIBILITY, advanced.num())?;
    hub.publish(Event::PreferenceChanged(PREF_CURRENT_VISIBILITY.into()));
    Ok(advanced)
}
