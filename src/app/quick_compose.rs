use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::core::events::{Event, EventHub};
use crate::core::models::{Account, Status};
use crate::core::prefs::PreferenceStore;
use crate::core::store::StoreError;
use crate::core::visibility::{self, UnleakableDomains, Visibility, PREF_CURRENT_VISIBILITY};

/// What the compose screen is asked to open with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeRequest {
    pub text: String,
    pub visibility: Visibility,
    pub send_immediately: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentioned_usernames: Option<IndexSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_author_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_content_snippet: Option<String>,
}

/// Result of pressing the floating compose button.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposeAction {
    /// Nothing typed and no reply pending.
    OpenBlank,
    Open(ComposeRequest),
}

/// The inline compose bar at the bottom of the main shell.
#[derive(Debug)]
pub struct QuickCompose {
    text: String,
    in_reply_to: Option<Status>,
    logged_in_username: Option<String>,
    allows_unleakable: bool,
    visibility: Visibility,
}

impl QuickCompose {
    pub fn new(
        active: Option<&Account>,
        domains: &UnleakableDomains,
        prefs: &mut dyn PreferenceStore,
        hub: &EventHub,
    ) -> Result<Self, StoreError> {
        let allows_unleakable = active.is_some_and(|a| domains.allows(&a.domain));
        let visibility = visibility::read_current(prefs, hub, allows_unleakable)?;
        Ok(QuickCompose {
            text: String::new(),
            in_reply_to: None,
            logged_in_username: active.map(|a| a.username.clone()),
            allows_unleakable,
            visibility,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: String) {
        self.text = text;
    }

    pub fn in_reply_to(&self) -> Option<&Status> {
        self.in_reply_to.as_ref()
    }

    /// Visibility last shown on the button.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn visibility_icon(&self) -> Option<&'static str> {
        self.visibility.icon()
    }

    /// Line above the text field naming the reply target.
    pub fn reply_info(&self) -> String {
        match &self.in_reply_to {
            Some(status) => format!("Reply to : {}", status.account.username),
            None => String::new(),
        }
    }

    pub fn handle_event(
        &mut self,
        event: &Event,
        prefs: &mut dyn PreferenceStore,
        hub: &EventHub,
    ) -> Result<(), StoreError> {
        match event {
            Event::QuickReply(status) => self.reply(status.clone()),
            Event::PreferenceChanged(key) if key == PREF_CURRENT_VISIBILITY => {
                self.refresh_visibility(prefs, hub)?;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn reply(&mut self, status: Status) {
        self.in_reply_to = Some(status);
    }

    pub fn reset(&mut self) {
        self.text.clear();
        self.in_reply_to = None;
    }

    fn refresh_visibility(
        &mut self,
        prefs: &mut dyn PreferenceStore,
        hub: &EventHub,
    ) -> Result<Visibility, StoreError> {
        self.visibility = visibility::read_current(prefs, hub, self.allows_unleakable)?;
        Ok(self.visibility)
    }

    /// Visibility button tapped.
    pub fn cycle_visibility(
        &mut self,
        prefs: &mut dyn PreferenceStore,
        hub: &EventHub,
    ) -> Result<Visibility, StoreError> {
        self.visibility = visibility::cycle_current(prefs, hub, self.allows_unleakable)?;
        Ok(self.visibility)
    }

    /// Floating compose button tapped: open the full compose screen,
    /// carrying over whatever was typed or replied to.
    pub fn compose_button(
        &mut self,
        prefs: &mut dyn PreferenceStore,
        hub: &EventHub,
    ) -> Result<ComposeAction, StoreError> {
        if self.text.is_empty() && self.in_reply_to.is_none() {
            return Ok(ComposeAction::OpenBlank);
        }
        let request = self.build_request(false, prefs, hub)?;
        self.reset();
        Ok(ComposeAction::Open(request))
    }

    /// Send button tapped. Does nothing without text.
    pub fn quick_toot(
        &mut self,
        prefs: &mut dyn PreferenceStore,
        hub: &EventHub,
    ) -> Result<Option<ComposeRequest>, StoreError> {
        if self.text.is_empty() {
            return Ok(None);
        }
        let request = self.build_request(true, prefs, hub)?;
        self.reset();
        Ok(Some(request))
    }

    fn build_request(
        &mut self,
        send_immediately: bool,
        prefs: &mut dyn PreferenceStore,
        hub: &EventHub,
    ) -> Result<ComposeRequest, StoreError> {
        let visibility = self.refresh_visibility(prefs, hub)?;
        let mut request = ComposeRequest {
            text: self.text.clone(),
            visibility,
            send_immediately,
            in_reply_to_id: None,
            content_warning: None,
            mentioned_usernames: None,
            reply_author_handle: None,
            reply_content_snippet: None,
        };

        let Some(status) = &self.in_reply_to else {
            return Ok(request);
        };

        let mut mentioned = IndexSet::new();
        mentioned.insert(status.account.username.clone());
        for username in &status.mentions {
            mentioned.insert(username.clone());
        }
        if let Some(me) = &self.logged_in_username {
            mentioned.shift_remove(me);
        }

        request.in_reply_to_id = Some(status.id.clone());
        request.content_warning = Some(status.spoiler_text.clone());
        request.mentioned_usernames = Some(mentioned);
        request.reply_author_handle = Some(status.account.local_username.clone());
        request.reply_content_snippet = Some(status.content.clone());
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::StatusAuthor;
    use crate::core::prefs::MemoryPreferences;

    fn status() -> Status {
        Status {
            id: "109".into(),
            account: StatusAuthor {
                username: "alice@remote.example".into(),
                local_username: "alice".into(),
                display_name: "Alice".into(),
            },
            content: "hello there".into(),
            spoiler_text: "cw".into(),
            mentions: vec!["me".into(), "bob".into(), "alice@remote.example".into()],
        }
    }

    fn widget(domain: &str, prefs: &mut MemoryPreferences, hub: &EventHub) -> QuickCompose {
        let me = Account::new(1, domain, "me");
        QuickCompose::new(Some(&me), &UnleakableDomains::default(), prefs, hub).unwrap()
    }

    #[test]
    fn compose_button_without_input_opens_blank() {
        let hub = EventHub::new();
        let mut prefs = MemoryPreferences::default();
        let mut quick = widget("mastodon.social", &mut prefs, &hub);
        assert_eq!(quick.compose_button(&mut prefs, &hub).unwrap(), ComposeAction::OpenBlank);
    }

    #[test]
    fn compose_button_carries_text_and_resets() {
        let hub = EventHub::new();
        let mut prefs = MemoryPreferences::default();
        prefs.put_int(PREF_CURRENT_VISIBILITY, Visibility::Unlisted.num()).unwrap();
        let mut quick = widget("mastodon.social", &mut prefs, &hub);
        quick.set_text("draft".into());

        let ComposeAction::Open(req) = quick.compose_button(&mut prefs, &hub).unwrap() else {
            panic!("expected prefilled compose");
        };
        assert_eq!(req.text, "draft");
        assert_eq!(req.visibility, Visibility::Unlisted);
        assert!(!req.send_immediately);
        assert!(req.in_reply_to_id.is_none());
        assert_eq!(quick.text(), "");
    }

    #[test]
    fn quick_toot_needs_text() {
        let hub = EventHub::new();
        let mut prefs = MemoryPreferences::default();
        let mut quick = widget("mastodon.social", &mut prefs, &hub);
        quick.reply(status());
        assert!(quick.quick_toot(&mut prefs, &hub).unwrap().is_none());
        // Reply target survives a rejected send.
        assert!(quick.in_reply_to().is_some());
    }

    #[test]
    fn reply_request_fields() {
        let hub = EventHub::new();
        let mut prefs = MemoryPreferences::default();
        let mut quick = widget("mastodon.social", &mut prefs, &hub);
        quick.handle_event(&Event::QuickReply(status()), &mut prefs, &hub).unwrap();
        assert_eq!(quick.reply_info(), "Reply to : alice@remote.example");
        quick.set_text("hi".into());

        let req = quick.quick_toot(&mut prefs, &hub).unwrap().unwrap();
        assert!(req.send_immediately);
        assert_eq!(req.in_reply_to_id.as_deref(), Some("109"));
        assert_eq!(req.content_warning.as_deref(), Some("cw"));
        assert_eq!(req.reply_author_handle.as_deref(), Some("alice"));
        assert_eq!(req.reply_content_snippet.as_deref(), Some("hello there"));
        let mentioned: Vec<_> = req.mentioned_usernames.unwrap().into_iter().collect();
        assert_eq!(mentioned, vec!["alice@remote.example".to_string(), "bob".to_string()]);

        assert!(quick.in_reply_to().is_none());
        assert_eq!(quick.reply_info(), "");
    }

    #[test]
    fn reply_alone_opens_prefilled_compose() {
        let hub = EventHub::new();
        let mut prefs = MemoryPreferences::default();
        let mut quick = widget("mastodon.social", &mut prefs, &hub);
        quick.reply(status());
        let action = quick.compose_button(&mut prefs, &hub).unwrap();
        assert!(matches!(action, ComposeAction::Open(ref r) if r.in_reply_to_id.is_some()));
        assert!(quick.in_reply_to().is_none());
    }

    #[test]
    fn cycling_respects_domain() {
        let hub = EventHub::new();
        let mut prefs = MemoryPreferences::default();
        prefs.put_int(PREF_CURRENT_VISIBILITY, Visibility::Private.num()).unwrap();

        let mut plain = widget("mastodon.social", &mut prefs, &hub);
        assert_eq!(plain.cycle_visibility(&mut prefs, &hub).unwrap(), Visibility::Public);

        prefs.put_int(PREF_CURRENT_VISIBILITY, Visibility::Private.num()).unwrap();
        let mut capable = widget("odakyu.app", &mut prefs, &hub);
        assert_eq!(capable.cycle_visibility(&mut prefs, &hub).unwrap(), Visibility::Unleakable);
        assert_eq!(capable.visibility_icon(), Some("ic_unleakable_24dp"));
    }

    #[test]
    fn stored_unleakable_is_corrected_for_incapable_account() {
        let hub = EventHub::new();
        let mut sub = hub.subscribe(|e| matches!(e, Event::PreferenceChanged(_)));
        let mut prefs = MemoryPreferences::default();
        prefs.put_int(PREF_CURRENT_VISIBILITY, Visibility::Unleakable.num()).unwrap();

        let quick = widget("mastodon.social", &mut prefs, &hub);
        assert_eq!(quick.visibility(), Visibility::Public);
        assert_eq!(prefs.get_int(PREF_CURRENT_VISIBILITY, 0), Visibility::Public.num());
        assert_eq!(sub.drain().len(), 1);
    }

    #[test]
    fn preference_event_refreshes_button() {
        let hub = EventHub::new();
        let mut prefs = MemoryPreferences::default();
        let mut quick = widget("mastodon.social", &mut prefs, &hub);
        assert_eq!(quick.visibility(), Visibility::Public);
        prefs.put_int(PREF_CURRENT_VISIBILITY, Visibility::Private.num()).unwrap();
        quick
            .handle_event(&Event::PreferenceChanged("other".into()), &mut prefs, &hub)
            .unwrap();
        assert_eq!(quick.visibility(), Visibility::Public);
        quick
            .handle_event(
                &Event::PreferenceChanged(PREF_CURRENT_VISIBILITY.into()),
                &mut prefs,
                &hub,
            )
            .unwrap();
        assert_eq!(quick.visibility(), Visibility::Private);
    }

    #[test]
    fn request_serializes_without_empty_reply_fields() {
        let req = ComposeRequest {
            text: "t".into(),
            visibility: Visibility::Private,
            send_immediately: true,
            in_reply_to_id: None,
            content_warning: None,
            mentioned_usernames: None,
            reply_author_handle: None,
            reply_content_snippet: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["visibility"], "private");
        assert!(json.get("in_reply_to_id").is_none());
    }
}
