use crate::core::models::{Account, AccountId};
use crate::core::registry::AccountRegistry;
use crate::core::routing::Intent;
use crate::core::store::StoreError;

use super::drawer::Screen;
use super::{Effect, Services};

/// Make `account_id` active and restart the shell, carrying `forward` if
/// the restart was triggered by an external intent.
pub fn change_account(
    services: &mut Services,
    account_id: AccountId,
    forward: Option<Intent>,
) -> Result<Vec<Effect>, StoreError> {
    services.host.stop_background_sync();
    services.host.flush_filters();
    services.registry.set_active(account_id)?;
    log::info!("Switched active account to {}", account_id);

    let relaunch = forward.unwrap_or_else(|| Intent {
        clear_task: true,
        ..Intent::default()
    });
    Ok(vec![
        Effect::KeepScreenOn(false),
        Effect::Relaunch(relaunch),
        Effect::Finish,
    ])
}

/// Pending "really log out?" prompt. Only [`request_logout`] creates one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutConfirmation {
    account_id: AccountId,
    full_name: String,
}

impl LogoutConfirmation {
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn prompt(&self) -> String {
        format!("Log out of the account {}?", self.full_name)
    }
}

pub fn request_logout(registry: &dyn AccountRegistry) -> Option<LogoutConfirmation> {
    registry.active().map(|a| LogoutConfirmation {
        account_id: a.id,
        full_name: a.full_name(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogoutOutcome {
    /// Another account took over; the shell restarts for it.
    Main(Account),
    /// No accounts left.
    Login,
    /// The confirmation no longer matches the active account.
    Stale,
}

/// Log the confirmed account out and tear down everything kept for it.
pub fn logout(
    services: &mut Services,
    confirmation: &LogoutConfirmation,
) -> Result<(LogoutOutcome, Vec<Effect>), StoreError> {
    let active = services.registry.active().ok_or(StoreError::NoActiveAccount)?;
    if active.id != confirmation.account_id {
        log::warn!(
            "Ignoring logout confirmation for {}, active account is {}",
            confirmation.account_id,
            active.id
        );
        return Ok((LogoutOutcome::Stale, Vec::new()));
    }

    services.host.delete_notification_channels(&active);
    services.host.clear_account_caches(active.id);
    services.host.remove_share_shortcut(&active);

    let next = services.registry.logout_active()?;

    if !notifications_enabled(services.registry.as_ref()) {
        services.host.set_pull_notifications(false);
    }

    match next {
        Some(account) => {
            log::info!("Logged out, continuing as {}", account.full_name());
            Ok((
                LogoutOutcome::Main(account),
                vec![Effect::Relaunch(Intent::default()), Effect::Finish],
            ))
        }
        None => {
            log::info!("Logged out of the last account");
            Ok((
                LogoutOutcome::Login,
                vec![
                    Effect::Open(Screen::Login {
                        adding_account: false,
                    }),
                    Effect::Finish,
                ],
            ))
        }
    }
}

/// Whether any logged-in account wants notifications.
pub fn notifications_enabled(registry: &dyn AccountRegistry) -> bool {
    registry
        .all_ordered_by_active()
        .iter()
        .any(|a| a.notifications_enabled)
}
