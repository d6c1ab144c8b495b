//! Decide what the main shell does with an incoming intent: stay on the
//! current account, restart under another one, or ask the user to pick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::models::{Account, AccountId};

/// Extra carrying the account id as a number (notifications, our own restarts).
pub const EXTRA_ACCOUNT_ID: &str = "account_id";
/// Extra carrying the account id as a string (OS sharing shortcuts).
pub const EXTRA_SHORTCUT_ID: &str = "android.intent.extra.shortcut.ID";

/// An external request to open the main shell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub target_account_id: Option<AccountId>,
    pub target_account_id_string: Option<String>,
    pub mime_type: Option<String>,
    pub action: Option<String>,
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
    pub status_url: Option<String>,
    /// Launched by tapping a notification.
    #[serde(default)]
    pub from_notification: bool,
    /// Start as a new task and clear the existing one.
    #[serde(default)]
    pub clear_task: bool,
}

impl Intent {
    /// The account this intent asks for. The numeric carrier wins outright;
    /// the string carrier is only consulted when it is absent, and an
    /// unparsable string counts as no request.
    pub fn requested_account(&self) -> Option<AccountId> {
        if let Some(id) = self.target_account_id {
            return Some(id);
        }
        let raw = self.target_account_id_string.as_deref()?;
        match raw.trim().parse() {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Ignoring malformed shortcut account id {:?}: {}", raw, e);
                None
            }
        }
    }

    pub fn has_shareable_payload(&self) -> bool {
        self.mime_type.as_deref().is_some_and(can_handle_mime_type)
    }

    /// Copy of this intent aimed at `account_id`, for relaunching the shell
    /// after a switch.
    pub fn forwarded_to(&self, account_id: AccountId) -> Intent {
        let mut extras = self.extras.clone();
        extras.insert(EXTRA_ACCOUNT_ID.into(), account_id.to_string());
        Intent {
            target_account_id: Some(account_id),
            target_account_id_string: None,
            mime_type: self.mime_type.clone(),
            action: self.action.clone(),
            extras,
            status_url: self.status_url.clone(),
            from_notification: self.from_notification,
            clear_task: true,
        }
    }
}

/// Payload types the compose screen accepts from other apps.
pub fn can_handle_mime_type(mime: &str) -> bool {
    let mime = mime.trim().to_ascii_lowercase();
    mime == "text/plain"
        || mime.starts_with("image/")
        || mime.starts_with("video/")
        || mime.starts_with("audio/")
}

/// What to do with one incoming intent.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingDecision {
    /// The right account is already active.
    Proceed {
        /// Hand the shared payload to the compose flow.
        forward_share: bool,
        select_notifications_tab: bool,
    },
    /// Make `account_id` active and restart with `forward`.
    Switch {
        account_id: AccountId,
        forward: Intent,
    },
    /// Ask the user which account should receive the share.
    Choose { candidates: Vec<Account> },
}

/// Outcome of routing before a shell can even be built.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Nobody is logged in; the host sends the user to login.
    RequiresLogin,
    Decided(RoutingDecision),
}

/// Route `intent` against the currently active account. `accounts` is the
/// registry listing (active first) offered when the user must choose.
pub fn route(intent: &Intent, active: Option<&Account>, accounts: &[Account]) -> Route {
    let requested = intent.requested_account();
    let shareable = intent.has_shareable_payload();

    let Some(requested) = requested else {
        if active.is_none() {
            return Route::RequiresLogin;
        }
        if shareable {
            return Route::Decided(RoutingDecision::Choose {
                candidates: accounts.to_vec(),
            });
        }
        return Route::Decided(RoutingDecision::Proceed {
            forward_share: false,
            select_notifications_tab: intent.from_notification,
        });
    };

    Route::Decided(decide_for(requested, intent, active))
}

/// Finish a `Choose` once the user picked `picked`.
pub fn resolve_choice(picked: AccountId, intent: &Intent, active: Option<&Account>) -> RoutingDecision {
    decide_for(picked, intent, active)
}

fn decide_for(requested: AccountId, intent: &Intent, active: Option<&Account>) -> RoutingDecision {
    match active {
        Some(account) if account.id == requested => {
            let shareable = intent.has_shareable_payload();
            RoutingDecision::Proceed {
                forward_share: shareable,
                select_notifications_tab: !shareable,
            }
        }
        _ => RoutingDecision::Switch {
            account_id: requested,
            forward: intent.forwarded_to(requested),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: AccountId, active: bool) -> Account {
        let mut a = Account::new(id, "mastodon.social", &format!("user{id}"));
        a.active = active;
        a
    }

    fn share(mime: &str) -> Intent {
        let mut extras = BTreeMap::new();
        extras.insert("android.intent.extra.TEXT".into(), "hello".into());
        Intent {
            mime_type: Some(mime.into()),
            action: Some("android.intent.action.SEND".into()),
            extras,
            ..Intent::default()
        }
    }

    // -- carriers --

    #[test]
    fn numeric_carrier_wins_over_string() {
        let intent = Intent {
            target_account_id: Some(5),
            target_account_id_string: Some("9".into()),
            ..Intent::default()
        };
        assert_eq!(intent.requested_account(), Some(5));
    }

    #[test]
    fn string_carrier_is_fallback() {
        let intent = Intent {
            target_account_id_string: Some(" 9 ".into()),
            ..Intent::default()
        };
        assert_eq!(intent.requested_account(), Some(9));
    }

    #[test]
    fn malformed_string_carrier_is_absent() {
        let intent = Intent {
            target_account_id_string: Some("nine".into()),
            ..Intent::default()
        };
        assert_eq!(intent.requested_account(), None);
    }

    #[test]
    fn shareable_mime_types() {
        assert!(can_handle_mime_type("text/plain"));
        assert!(can_handle_mime_type("image/png"));
        assert!(can_handle_mime_type("Video/MP4"));
        assert!(can_handle_mime_type("audio/ogg"));
        assert!(!can_handle_mime_type("text/html"));
        assert!(!can_handle_mime_type("application/pdf"));
        assert!(!Intent::default().has_shareable_payload());
    }

    // -- route --

    #[test]
    fn plain_launch_proceeds() {
        let active = account(1, true);
        let route = route(&Intent::default(), Some(&active), &[active.clone()]);
        assert_eq!(
            route,
            Route::Decided(RoutingDecision::Proceed {
                forward_share: false,
                select_notifications_tab: false,
            })
        );
    }

    #[test]
    fn no_active_account_requires_login() {
        assert_eq!(route(&Intent::default(), None, &[]), Route::RequiresLogin);
        assert_eq!(route(&share("text/plain"), None, &[]), Route::RequiresLogin);
    }

    #[test]
    fn notification_flag_selects_tab() {
        let active = account(1, true);
        let intent = Intent {
            from_notification: true,
            ..Intent::default()
        };
        assert_eq!(
            route(&intent, Some(&active), &[]),
            Route::Decided(RoutingDecision::Proceed {
                forward_share: false,
                select_notifications_tab: true,
            })
        );
    }

    #[test]
    fn share_without_account_asks_user() {
        let accounts = vec![account(1, true), account(2, false)];
        let route = route(&share("image/jpeg"), Some(&accounts[0]), &accounts);
        assert_eq!(
            route,
            Route::Decided(RoutingDecision::Choose {
                candidates: accounts.clone()
            })
        );
    }

    #[test]
    fn requested_active_account_proceeds() {
        let active = account(5, true);
        let mut intent = share("text/plain");
        intent.target_account_id = Some(5);
        assert_eq!(
            route(&intent, Some(&active), &[]),
            Route::Decided(RoutingDecision::Proceed {
                forward_share: true,
                select_notifications_tab: false,
            })
        );
    }

    #[test]
    fn notification_for_active_account_selects_tab() {
        let active = account(5, true);
        let intent = Intent {
            target_account_id: Some(5),
            ..Intent::default()
        };
        assert_eq!(
            route(&intent, Some(&active), &[]),
            Route::Decided(RoutingDecision::Proceed {
                forward_share: false,
                select_notifications_tab: true,
            })
        );
    }

    #[test]
    fn other_account_switches_and_forwards_payload() {
        let active = account(1, true);
        let mut intent = share("text/plain");
        intent.target_account_id_string = Some("2".into());
        let Route::Decided(RoutingDecision::Switch { account_id, forward }) =
            route(&intent, Some(&active), &[])
        else {
            panic!("expected switch");
        };
        assert_eq!(account_id, 2);
        assert_eq!(forward.target_account_id, Some(2));
        assert_eq!(forward.target_account_id_string, None);
        assert_eq!(forward.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(forward.action.as_deref(), Some("android.intent.action.SEND"));
        assert_eq!(forward.extras.get("android.intent.extra.TEXT").map(String::as_str), Some("hello"));
        assert_eq!(forward.extras.get(EXTRA_ACCOUNT_ID).map(String::as_str), Some("2"));
        assert!(forward.clear_task);
    }

    #[test]
    fn requested_account_without_active_switches() {
        let intent = Intent {
            target_account_id: Some(3),
            ..Intent::default()
        };
        assert!(matches!(
            route(&intent, None, &[]),
            Route::Decided(RoutingDecision::Switch { account_id: 3, .. })
        ));
    }

    #[test]
    fn relaunched_intent_then_proceeds() {
        let intent = share("text/plain");
        let forward = intent.forwarded_to(2);
        let now_active = account(2, true);
        assert_eq!(
            route(&forward, Some(&now_active), &[]),
            Route::Decided(RoutingDecision::Proceed {
                forward_share: true,
                select_notifications_tab: false,
            })
        );
    }

    // -- resolve_choice --

    #[test]
    fn choosing_active_account_proceeds() {
        let active = account(1, true);
        assert_eq!(
            resolve_choice(1, &share("text/plain"), Some(&active)),
            RoutingDecision::Proceed {
                forward_share: true,
                select_notifications_tab: false,
            }
        );
    }

    #[test]
    fn choosing_other_account_switches() {
        let active = account(1, true);
        let decision = resolve_choice(2, &share("text/plain"), Some(&active));
        let RoutingDecision::Switch { account_id, forward } = decision else {
            panic!("expected switch");
        };
        assert_eq!(account_id, 2);
        assert_eq!(forward.target_account_id, Some(2));
    }
}
