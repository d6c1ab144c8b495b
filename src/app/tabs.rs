use crate::core::models::TabKind;

/// Actions offered when an already-selected tab is tapped again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabAction {
    JumpToTop,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub kind: TabKind,
    pub icon: &'static str,
    pub description: String,
}

/// The main tab bar, built from the active account's tab preferences.
#[derive(Debug, Clone, Default)]
pub struct Tabs {
    tabs: Vec<Tab>,
    notification_position: Option<usize>,
    current: usize,
}

impl Tabs {
    /// Build the bar. With `select_notifications` the notifications tab (if
    /// the account has one) starts selected.
    pub fn new(prefs: &[TabKind], select_notifications: bool) -> Self {
        let tabs: Vec<Tab> = prefs
            .iter()
            .map(|kind| Tab {
                kind: kind.clone(),
                icon: kind.icon(),
                description: kind.description().to_string(),
            })
            .collect();
        let notification_position = tabs
            .iter()
            .position(|t| t.kind == TabKind::Notifications);
        let current = match notification_position {
            Some(pos) if select_notifications => pos,
            _ => 0,
        };
        Tabs {
            tabs,
            notification_position,
            current,
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn notification_position(&self) -> Option<usize> {
        self.notification_position
    }

    /// Select `position`. Returns true when it is the notifications tab.
    pub fn select(&mut self, position: usize) -> bool {
        if position < self.tabs.len() {
            self.current = position;
        }
        self.notification_position == Some(position)
    }
}
