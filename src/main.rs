use clap::{Args, Parser, Subcommand};

use tootshell::app::{Effect, Launch, LaunchError, Message, Services, SessionHost, Shell};
use tootshell::config::Config;
use tootshell::core::events::EventHub;
use tootshell::core::models::{Account, AccountId, TabKind};
use tootshell::core::prefs::FilePreferences;
use tootshell::core::registry::{AccountRegistry, AccountStore};
use tootshell::core::routing::Intent;

/// Relaunches are followed at most this many times per invocation.
const MAX_RELAUNCHES: usize = 4;

#[derive(Parser)]
#[command(name = "tootshell")]
#[command(about = "Route an intent through the Mastodon client shell")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    intent: IntentArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Register an account and make it active
    AddAccount {
        id: AccountId,
        domain: String,
        username: String,
        /// Account requires follow approval
        #[arg(long)]
        locked: bool,
    },
    /// List accounts, active first
    Accounts,
    /// Set the active account's main tabs, e.g. `home,notifications,direct`
    SetTabs {
        #[arg(value_delimiter = ',', value_parser = parse_tab)]
        tabs: Vec<TabKind>,
    },
}

#[derive(Args)]
struct IntentArgs {
    /// Numeric account id (notification or restart carrier)
    #[arg(long)]
    account_id: Option<AccountId>,

    /// Account id as text (sharing shortcut carrier)
    #[arg(long)]
    shortcut_id: Option<String>,

    /// Mime type of a shared payload
    #[arg(long)]
    mime_type: Option<String>,

    #[arg(long)]
    action: Option<String>,

    /// Extra intent data as key=value, repeatable
    #[arg(long = "extra", value_parser = parse_extra)]
    extras: Vec<(String, String)>,

    /// Status to open once the shell is up
    #[arg(long)]
    status_url: Option<String>,

    #[arg(long)]
    from_notification: bool,

    /// Answer the account chooser with this id
    #[arg(long)]
    choose: Option<AccountId>,
}

fn parse_extra(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

fn parse_tab(raw: &str) -> Result<TabKind, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "home" => Ok(TabKind::Home),
        "notifications" => Ok(TabKind::Notifications),
        "local" => Ok(TabKind::Local),
        "federated" => Ok(TabKind::Federated),
        "direct" => Ok(TabKind::Direct),
        other => Err(format!("unknown tab {other:?}")),
    }
}

impl IntentArgs {
    fn to_intent(&self) -> Intent {
        Intent {
            target_account_id: self.account_id,
            target_account_id_string: self.shortcut_id.clone(),
            mime_type: self.mime_type.clone(),
            action: self.action.clone(),
            extras: self.extras.iter().cloned().collect(),
            status_url: self.status_url.clone(),
            from_notification: self.from_notification,
            clear_task: false,
        }
    }
}

/// Host that only reports what a real client would do.
struct LoggingHost;

impl SessionHost for LoggingHost {
    fn stop_background_sync(&mut self) {
        log::info!("Stopping background sync");
    }
    fn flush_filters(&mut self) {
        log::info!("Flushing filter cache");
    }
    fn clear_account_caches(&mut self, account_id: AccountId) {
        log::info!("Clearing caches for account {}", account_id);
    }
    fn create_notification_channels(&mut self, account: &Account) {
        log::info!("Creating notification channels for {}", account.full_name());
    }
    fn delete_notification_channels(&mut self, account: &Account) {
        log::info!("Deleting notification channels for {}", account.full_name());
    }
    fn clear_notifications(&mut self, account: &Account) {
        log::info!("Clearing notifications for {}", account.full_name());
    }
    fn update_share_shortcut(&mut self, account: &Account) {
        log::info!("Updating share shortcut for {}", account.full_name());
    }
    fn remove_share_shortcut(&mut self, account: &Account) {
        log::info!("Removing share shortcut for {}", account.full_name());
    }
    fn set_pull_notifications(&mut self, enabled: bool) {
        log::info!("Pull notifications enabled: {}", enabled);
    }
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("tootshell: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = Config::resolve();
    let mut registry =
        AccountStore::open(&config.accounts_path()).map_err(|e| format!("open accounts: {e}"))?;

    match cli.command {
        Some(Command::AddAccount {
            id,
            domain,
            username,
            locked,
        }) => {
            let mut account = Account::new(id, &domain, &username);
            account.locked = locked;
            registry
                .add_account(account)
                .map_err(|e| format!("add account: {e}"))?;
            println!("Added @{username}@{domain} as account {id}");
            return Ok(());
        }
        Some(Command::Accounts) => {
            for a in registry.all_ordered_by_active() {
                let marker = if a.active { "*" } else { " " };
                println!("{marker} {:>4}  {}", a.id, a.full_name());
            }
            return Ok(());
        }
        Some(Command::SetTabs { tabs }) => {
            registry
                .set_active_tabs(tabs)
                .map_err(|e| format!("set tabs: {e}"))?;
            println!("Tabs updated");
            return Ok(());
        }
        None => {}
    }

    let prefs = FilePreferences::open(&config.preferences_path())
        .map_err(|e| format!("open preferences: {e}"))?;
    let mut services = Services {
        registry: Box::new(registry),
        prefs: Box::new(prefs),
        host: Box::new(LoggingHost),
        hub: EventHub::new(),
    };

    let mut intent = cli.intent.to_intent();
    for _ in 0..=MAX_RELAUNCHES {
        let launch = match Shell::launch(services, config.clone(), intent.clone()) {
            Ok(launch) => launch,
            // A stale notification or shortcut may name an account that is gone.
            Err(LaunchError { services: kept, error }) if intent != Intent::default() => {
                log::warn!("Launch failed ({}), retrying without a target", error);
                services = kept;
                intent = Intent::default();
                continue;
            }
            Err(e) => return Err(format!("launch: {e}")),
        };
        let (next_services, effects) = match launch {
            Launch::Exited(services, effects) => (services, effects),
            Launch::Running(mut shell, mut effects) => {
                if let Some(id) = cli.intent.choose {
                    if effects.iter().any(|e| matches!(e, Effect::ChooseAccount(_))) {
                        print_effects(&effects);
                        effects = shell
                            .update(Message::AccountChosen(id))
                            .map_err(|e| format!("choose account: {e}"))?;
                    }
                }
                report(&shell);
                (shell.shutdown(), effects)
            }
        };
        print_effects(&effects);
        services = next_services;

        match relaunch_intent(&effects) {
            Some(next) => intent = next,
            None => return Ok(()),
        }
    }
    Err(format!("gave up after {MAX_RELAUNCHES} relaunches"))
}

fn relaunch_intent(effects: &[Effect]) -> Option<Intent> {
    effects.iter().find_map(|e| match e {
        Effect::Relaunch(intent) => Some(intent.clone()),
        _ => None,
    })
}

fn print_effects(effects: &[Effect]) {
    for effect in effects {
        println!("-> {effect:?}");
    }
}

fn report(shell: &Shell) {
    let quick = shell.quick_compose();
    println!(
        "Running as {} (tab {}, visibility {:?})",
        shell.account().full_name(),
        shell.tabs().current(),
        quick.visibility()
    );
    println!(
        "   offscreen page limit {:?}, animated avatars {}",
        shell.offscreen_page_limit(),
        shell.animate_avatars()
    );
    for profile in shell.drawer().profiles() {
        println!("   {} {}", if profile.selected { "*" } else { " " }, profile.email);
    }
}
