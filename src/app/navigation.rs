use crate::core::store::StoreError;

use super::{Effect, Message, Screen, Shell, PREF_USE_HTL_STREAM};

/// Hardware or keyboard key press forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub code: KeyCode,
    pub ctrl: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Menu,
    Search,
    Char(char),
}

impl Shell {
    pub(super) fn handle_navigation(&mut self, message: Message) -> Result<Vec<Effect>, StoreError> {
        let effects = match message {
            Message::TabSelected(position) => {
                if self.tabs.select(position) {
                    self.services.host.clear_notifications(&self.account);
                }
                Vec::new()
            }

            Message::TabReselected(position) => vec![Effect::ShowTabActions(position)],

            Message::TabActionChosen(position, action) => {
                vec![Effect::RunTabAction(position, action)]
            }

            Message::BackPressed => {
                if self.drawer.is_open() {
                    self.drawer.set_open(false);
                    vec![Effect::CloseDrawer]
                } else if self.tabs.current() != 0 {
                    return self.handle_navigation(Message::TabSelected(0));
                } else {
                    vec![Effect::Finish]
                }
            }

            Message::KeyPressed(key) => match key.code {
                KeyCode::Menu => {
                    let open = !self.drawer.is_open();
                    self.drawer.set_open(open);
                    vec![if open { Effect::OpenDrawer } else { Effect::CloseDrawer }]
                }
                KeyCode::Search => vec![Effect::Open(Screen::Search)],
                // Some keyboards report Shift while Ctrl is held.
                KeyCode::Char('n' | 'N') if key.ctrl || key.shift => {
                    vec![Effect::OpenBlankCompose]
                }
                KeyCode::Char(_) => Vec::new(),
            },

            Message::Resumed => {
                self.services.host.clear_notifications(&self.account);
                Vec::new()
            }

            Message::Started => {
                let stream = self
                    .services
                    .prefs
                    .get_bool(PREF_USE_HTL_STREAM, self.config.use_htl_stream);
                if stream {
                    vec![Effect::KeepScreenOn(true)]
                } else {
                    Vec::new()
                }
            }

            Message::Stopped => vec![Effect::KeepScreenOn(false)],

            _ => Vec::new(),
        };
        Ok(effects)
    }
}
