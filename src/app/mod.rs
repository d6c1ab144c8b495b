mod drawer;
mod navigation;
mod profile;
mod quick_compose;
mod switch;
mod tabs;

pub use drawer::{
    Drawer, DrawerAction, DrawerEntry, DrawerItemId, Footer, ProfileEntry, Screen,
    ADD_ACCOUNT_PROFILE_ID, INSTANCE_DATA_FAILED,
};
pub use navigation::{Key, KeyCode};
pub use quick_compose::{ComposeAction, ComposeRequest, QuickCompose};
pub use switch::{LogoutConfirmation, LogoutOutcome};
pub use tabs::{Tab, TabAction, Tabs};

use crate::config::Config;
use crate::core::events::{Event, EventHub, Subscription};
use crate::core::models::{Account, AccountId, Instance, Profile};
use crate::core::prefs::PreferenceStore;
use crate::core::registry::AccountRegistry;
use crate::core::routing::{self, Intent, Route, RoutingDecision};
use crate::core::scope::{InstanceScope, Ticket};
use crate::core::store::StoreError;

const PREF_USE_HTL_STREAM: &str = "useHTLStream";
const PREF_OFFSCREEN_LIMIT: &str = "viewPagerOffScreenLimit";
const PREF_ANIMATE_AVATARS: &str = "animateGifAvatars";
const OFFSCREEN_PAGE_LIMIT: usize = 9;

/// Per-account machinery that lives outside this crate.
pub trait SessionHost {
    fn stop_background_sync(&mut self);
    fn flush_filters(&mut self);
    fn clear_account_caches(&mut self, account_id: AccountId);
    fn create_notification_channels(&mut self, account: &Account);
    fn delete_notification_channels(&mut self, account: &Account);
    fn clear_notifications(&mut self, account: &Account);
    fn update_share_shortcut(&mut self, account: &Account);
    fn remove_share_shortcut(&mut self, account: &Account);
    fn set_pull_notifications(&mut self, enabled: bool);
}

/// Long-lived collaborators handed from one shell instance to the next.
pub struct Services {
    pub registry: Box<dyn AccountRegistry>,
    pub prefs: Box<dyn PreferenceStore>,
    pub host: Box<dyn SessionHost>,
    pub hub: EventHub,
}

/// Work for the UI host to carry out.
#[derive(Debug, Clone)]
pub enum Effect {
    Open(Screen),
    OpenBlankCompose,
    OpenCompose(ComposeRequest),
    /// Hand a shared payload straight to the compose screen.
    ForwardShare(Intent),
    /// Start a fresh shell with this intent (new task, old one cleared).
    Relaunch(Intent),
    ChooseAccount(Vec<Account>),
    ConfirmLogout(LogoutConfirmation),
    FetchProfile(Ticket),
    FetchInstance(Ticket),
    ViewStatus(url::Url),
    OpenDrawer,
    CloseDrawer,
    ShowTabActions(usize),
    RunTabAction(usize, TabAction),
    KeepScreenOn(bool),
    /// Tear this instance down; call [`Shell::shutdown`].
    Finish,
}

#[derive(Debug, Clone)]
pub enum Message {
    QuickTextChanged(String),
    ComposeButton,
    QuickToot,
    VisibilityButton,

    DrawerItem(DrawerItemId),
    ProfileClicked { id: AccountId, current: bool },
    FooterClicked,

    AccountChosen(AccountId),
    ChooserDismissed,
    LogoutConfirmed(LogoutConfirmation),

    TabSelected(usize),
    TabReselected(usize),
    TabActionChosen(usize, TabAction),

    BackPressed,
    KeyPressed(Key),

    ProfileLoaded {
        ticket: Ticket,
        result: Result<Profile, String>,
    },
    InstanceLoaded {
        ticket: Ticket,
        result: Result<Instance, String>,
    },

    Resumed,
    Started,
    Stopped,
}

/// Result of trying to bring up a shell for an intent.
pub enum Launch {
    Running(Box<Shell>, Vec<Effect>),
    /// No shell was built; services come back for the next attempt.
    Exited(Services, Vec<Effect>),
}

/// Launch failed on storage. The services come back so the caller can
/// retry or fall back to login.
#[derive(thiserror::Error)]
#[error("{error}")]
pub struct LaunchError {
    pub services: Services,
    #[source]
    pub error: StoreError,
}

impl std::fmt::Debug for LaunchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// The main window: tabs, drawer and quick compose for the active account.
pub struct Shell {
    pub(super) services: Services,
    pub(super) config: Config,
    pub(super) scope: InstanceScope,
    pub(super) events: Subscription,
    pub(super) account: Account,
    pub(super) quick: QuickCompose,
    pub(super) drawer: Drawer,
    pub(super) tabs: Tabs,
    /// Share intent waiting on the account chooser.
    pub(super) pending_share: Option<Intent>,
}

impl Shell {
    /// Route `intent` and, unless it leads elsewhere, build the shell.
    pub fn launch(
        mut services: Services,
        config: Config,
        intent: Intent,
    ) -> Result<Launch, LaunchError> {
        let active = services.registry.active();
        let accounts = services.registry.all_ordered_by_active();

        let decision = match routing::route(&intent, active.as_ref(), &accounts) {
            Route::RequiresLogin => {
                log::info!("No active account, redirecting to login");
                return Ok(Launch::Exited(services, login_effects()));
            }
            Route::Decided(decision) => decision,
        };
        log::debug!("Routing decision: {:?}", decision);

        match decision {
            RoutingDecision::Switch { account_id, forward } => {
                match switch::change_account(&mut services, account_id, Some(forward)) {
                    Ok(effects) => Ok(Launch::Exited(services, effects)),
                    Err(error) => Err(LaunchError { services, error }),
                }
            }
            RoutingDecision::Proceed {
                forward_share: true,
                ..
            } => Ok(Launch::Exited(services, forward_share_effects(&intent))),
            RoutingDecision::Proceed {
                select_notifications_tab,
                ..
            } => {
                // Only a switch can be decided without an active account.
                let Some(account) = active else {
                    return Ok(Launch::Exited(services, login_effects()));
                };
                let (shell, effects) =
                    Self::build(services, config, account, &intent, select_notifications_tab)?;
                Ok(Launch::Running(shell, effects))
            }
            RoutingDecision::Choose { candidates } => {
                let Some(account) = active else {
                    return Ok(Launch::Exited(services, login_effects()));
                };
                let (mut shell, mut effects) =
                    Self::build(services, config, account, &intent, false)?;
                shell.pending_share = Some(intent);
                effects.push(Effect::ChooseAccount(candidates));
                Ok(Launch::Running(shell, effects))
            }
        }
    }

    fn build(
        mut services: Services,
        config: Config,
        account: Account,
        intent: &Intent,
        select_notifications_tab: bool,
    ) -> Result<(Box<Shell>, Vec<Effect>), LaunchError> {
        let quick = match QuickCompose::new(
            Some(&account),
            &config.unleakable_domains,
            services.prefs.as_mut(),
            &services.hub,
        ) {
            Ok(quick) => quick,
            Err(error) => return Err(LaunchError { services, error }),
        };

        let scope = InstanceScope::new(account.id);
        let events = services.hub.subscribe_scoped(&scope, |_| true);

        let mut drawer = Drawer::new();
        drawer.update_profiles(&services.registry.all_ordered_by_active());
        drawer.set_locked(account.locked);

        let tabs = Tabs::new(&account.tabs, select_notifications_tab);
        if select_notifications_tab && tabs.notification_position().is_some() {
            services.host.clear_notifications(&account);
        }

        let pull = switch::notifications_enabled(services.registry.as_ref());
        services.host.set_pull_notifications(pull);

        let mut effects = vec![
            Effect::FetchProfile(scope.ticket()),
            Effect::FetchInstance(scope.ticket()),
        ];
        if let Some(raw) = &intent.status_url {
            match url::Url::parse(raw) {
                Ok(url) => effects.push(Effect::ViewStatus(url)),
                Err(e) => log::warn!("Ignoring malformed status url {:?}: {}", raw, e),
            }
        }

        log::info!("Shell ready for {}", account.full_name());
        let shell = Shell {
            services,
            config,
            scope,
            events,
            account,
            quick,
            drawer,
            tabs,
            pending_share: None,
        };
        Ok((Box::new(shell), effects))
    }

    /// Tear the instance down and hand the services back. Outstanding
    /// tickets and the event subscription go dead.
    pub fn shutdown(self) -> Services {
        self.scope.teardown();
        self.services
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn quick_compose(&self) -> &QuickCompose {
        &self.quick
    }

    pub fn drawer(&self) -> &Drawer {
        &self.drawer
    }

    pub fn tabs(&self) -> &Tabs {
        &self.tabs
    }

    pub fn is_live(&self) -> bool {
        self.scope.is_live()
    }

    pub fn offscreen_page_limit(&self) -> Option<usize> {
        let enabled = self
            .services
            .prefs
            .get_bool(PREF_OFFSCREEN_LIMIT, self.config.view_pager_offscreen_limit);
        enabled.then_some(OFFSCREEN_PAGE_LIMIT)
    }

    pub fn animate_avatars(&self) -> bool {
        self.services
            .prefs
            .get_bool(PREF_ANIMATE_AVATARS, self.config.animate_gif_avatars)
    }

    pub fn update(&mut self, message: Message) -> Result<Vec<Effect>, StoreError> {
        if !self.scope.is_live() {
            log::debug!("Dropping {:?} for a torn down shell", message);
            return Ok(Vec::new());
        }
        match message {
            Message::QuickTextChanged(_)
            | Message::ComposeButton
            | Message::QuickToot
            | Message::VisibilityButton => self.handle_quick_compose(message),

            Message::DrawerItem(_)
            | Message::ProfileClicked { .. }
            | Message::AccountChosen(_)
            | Message::ChooserDismissed
            | Message::LogoutConfirmed(_) => self.handle_accounts(message),

            Message::ProfileLoaded { .. }
            | Message::InstanceLoaded { .. }
            | Message::FooterClicked => self.handle_profile(message),

            Message::TabSelected(_)
            | Message::TabReselected(_)
            | Message::TabActionChosen(..)
            | Message::BackPressed
            | Message::KeyPressed(_)
            | Message::Resumed
            | Message::Started
            | Message::Stopped => self.handle_navigation(message),
        }
    }

    /// Deliver pending hub events to this instance.
    pub fn pump_events(&mut self) -> Result<Vec<Effect>, StoreError> {
        let events = self.events.drain();
        let mut effects = Vec::new();
        for event in events {
            match &event {
                Event::ProfileEdited(profile) => {
                    effects.extend(self.apply_profile(profile)?);
                }
                Event::MainTabsChanged => {
                    if let Some(account) = self.services.registry.active() {
                        self.account = account;
                    }
                    self.tabs = Tabs::new(&self.account.tabs, false);
                }
                Event::QuickReply(_) | Event::PreferenceChanged(_) => {
                    self.quick.handle_event(
                        &event,
                        self.services.prefs.as_mut(),
                        &self.services.hub,
                    )?;
                }
                Event::DrawerFooterClicked(_) => {}
            }
        }
        Ok(effects)
    }

    fn handle_quick_compose(&mut self, message: Message) -> Result<Vec<Effect>, StoreError> {
        let prefs = self.services.prefs.as_mut();
        let hub = &self.services.hub;
        let effects = match message {
            Message::QuickTextChanged(text) => {
                self.quick.set_text(text);
                Vec::new()
            }
            Message::ComposeButton => match self.quick.compose_button(prefs, hub)? {
                ComposeAction::OpenBlank => vec![Effect::OpenBlankCompose],
                ComposeAction::Open(request) => vec![Effect::OpenCompose(request)],
            },
            Message::QuickToot => match self.quick.quick_toot(prefs, hub)? {
                Some(request) => vec![Effect::OpenCompose(request)],
                None => Vec::new(),
            },
            Message::VisibilityButton => {
                let v = self.quick.cycle_visibility(prefs, hub)?;
                log::debug!("Quick compose visibility now {:?}", v);
                Vec::new()
            }
            _ => Vec::new(),
        };
        Ok(effects)
    }

    fn handle_accounts(&mut self, message: Message) -> Result<Vec<Effect>, StoreError> {
        match message {
            Message::DrawerItem(id) => match id.action() {
                DrawerAction::Open(screen) => Ok(vec![Effect::Open(screen)]),
                DrawerAction::LogOut => {
                    Ok(switch::request_logout(self.services.registry.as_ref())
                        .map(Effect::ConfirmLogout)
                        .into_iter()
                        .collect())
                }
            },

            Message::ProfileClicked { id, current } => {
                if current {
                    return Ok(vec![
                        Effect::Open(Screen::Profile(self.account.id)),
                        Effect::CloseDrawer,
                    ]);
                }
                if id == ADD_ACCOUNT_PROFILE_ID {
                    return Ok(vec![
                        Effect::Open(Screen::Login {
                            adding_account: true,
                        }),
                        Effect::CloseDrawer,
                    ]);
                }
                self.switch_to(id, None)
            }

            Message::AccountChosen(id) => {
                let Some(intent) = self.pending_share.take() else {
                    log::warn!("Account {} chosen with no share pending", id);
                    return Ok(Vec::new());
                };
                match routing::resolve_choice(id, &intent, Some(&self.account)) {
                    RoutingDecision::Switch { account_id, forward } => {
                        self.switch_to(account_id, Some(forward))
                    }
                    RoutingDecision::Proceed { .. } | RoutingDecision::Choose { .. } => {
                        self.scope.teardown();
                        Ok(forward_share_effects(&intent))
                    }
                }
            }

            Message::ChooserDismissed => {
                self.pending_share = None;
                Ok(Vec::new())
            }

            Message::LogoutConfirmed(confirmation) => {
                let (outcome, effects) = switch::logout(&mut self.services, &confirmation)?;
                if outcome != LogoutOutcome::Stale {
                    self.scope.teardown();
                }
                Ok(effects)
            }

            _ => Ok(Vec::new()),
        }
    }

    fn switch_to(
        &mut self,
        account_id: AccountId,
        forward: Option<Intent>,
    ) -> Result<Vec<Effect>, StoreError> {
        let effects = switch::change_account(&mut self.services, account_id, forward)?;
        // Anything still in flight belongs to the old account.
        self.scope.teardown();
        Ok(effects)
    }
}

fn login_effects() -> Vec<Effect> {
    vec![
        Effect::Open(Screen::Login {
            adding_account: false,
        }),
        Effect::Finish,
    ]
}

fn forward_share_effects(intent: &Intent) -> Vec<Effect> {
    vec![
        Effect::ForwardShare(Intent {
            clear_task: true,
            ..intent.clone()
        }),
        Effect::Finish,
    ]
}
