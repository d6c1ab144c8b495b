use crate::core::events::Event;
use crate::core::models::Profile;
use crate::core::store::StoreError;

use super::{Effect, Message, Shell};

impl Shell {
    pub(super) fn handle_profile(&mut self, message: Message) -> Result<Vec<Effect>, StoreError> {
        match message {
            Message::ProfileLoaded { ticket, result } => {
                let active = self.services.registry.active().map(|a| a.id);
                if !ticket.is_current(active) {
                    log::debug!(
                        "Discarding profile fetched for account {}",
                        ticket.account_id()
                    );
                    return Ok(Vec::new());
                }
                match result {
                    Ok(profile) => self.apply_profile(&profile),
                    Err(e) => {
                        log::error!("Failed to fetch user info. {}", e);
                        Ok(Vec::new())
                    }
                }
            }

            Message::InstanceLoaded { ticket, result } => {
                let active = self.services.registry.active().map(|a| a.id);
                if !ticket.is_current(active) {
                    log::debug!(
                        "Discarding instance data fetched for account {}",
                        ticket.account_id()
                    );
                    return Ok(Vec::new());
                }
                if let Err(e) = &result {
                    log::warn!("Failed to fetch instance data: {}", e);
                }
                self.drawer.footer.set_instance(&result);
                Ok(Vec::new())
            }

            Message::FooterClicked => {
                if self.drawer.footer.click() {
                    self.services.hub.publish(Event::DrawerFooterClicked(true));
                    self.drawer.set_open(false);
                    return Ok(vec![Effect::CloseDrawer]);
                }
                Ok(Vec::new())
            }

            _ => Ok(Vec::new()),
        }
    }

    /// Fold fresh profile data into the registry and everything derived
    /// from it.
    pub(super) fn apply_profile(&mut self, profile: &Profile) -> Result<Vec<Effect>, StoreError> {
        self.services.registry.update_active(profile)?;
        if let Some(account) = self.services.registry.active() {
            self.account = account;
        }
        self.services
            .host
            .create_notification_channels(&self.account);
        self.drawer.set_locked(profile.locked);
        self.drawer
            .update_profiles(&self.services.registry.all_ordered_by_active());
        self.services.host.update_share_shortcut(&self.account);
        Ok(Vec::new())
    }
}
