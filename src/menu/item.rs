//! Menu item definitions

use serde::Serialize;

pub const ITEM_RECORD: &str = "item_record";
pub const ITEM_PAUSE_RESUME: &str = "item_pause_resume";
pub const ITEM_HOME: &str = "item_home";
pub const ITEM_SETTING: &str = "item_setting";
pub const ITEM_TOOL: &str = "item_tool";

/// Semantic action bound to a menu slot by its identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuAction {
    StartStop,
    PauseResume,
    OpenHome,
    OpenSetting,
    OpenTool,
}

impl MenuAction {
    pub fn all() -> &'static [MenuAction] {
        &[
            MenuAction::StartStop,
            MenuAction::PauseResume,
            MenuAction::OpenHome,
            MenuAction::OpenSetting,
            MenuAction::OpenTool,
        ]
    }

    /// Identifier a menu definition uses for this action
    pub fn id(&self) -> &'static str {
        match self {
            MenuAction::StartStop => ITEM_RECORD,
            MenuAction::PauseResume => ITEM_PAUSE_RESUME,
            MenuAction::OpenHome => ITEM_HOME,
            MenuAction::OpenSetting => ITEM_SETTING,
            MenuAction::OpenTool => ITEM_TOOL,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        MenuAction::all().iter().copied().find(|action| action.id() == id)
    }
}

/// One action button in the folding bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,
    /// Icon resource name
    pub icon: String,
    /// Selection marker
    pub checked: bool,
    /// Horizontal slot when expanded, fixed at load time
    pub order: usize,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, icon: impl Into<String>, order: usize) -> Self {
        Self {
            id: id.into(),
            icon: icon.into(),
            checked: false,
            order,
        }
    }

    /// `None` when the identifier is not one the bubble knows how to act on
    pub fn action(&self) -> Option<MenuAction> {
        MenuAction::from_id(&self.id)
    }
}

/// The recorder control menu
pub fn default_menu_items() -> Vec<MenuItem> {
    vec![
        MenuItem::new(ITEM_RECORD, "ic_record_menu", 0),
        MenuItem::new(ITEM_PAUSE_RESUME, "ic_pause_red", 1),
        MenuItem::new(ITEM_HOME, "ic_home", 2),
        MenuItem::new(ITEM_SETTING, "ic_setting", 3),
        MenuItem::new(ITEM_TOOL, "ic_tool", 4),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_ids_round_trip() {
        for action in MenuAction::all() {
            assert_eq!(MenuAction::from_id(action.id()), Some(*action));
        }
        assert_eq!(MenuAction::from_id("item_screenshot"), None);
    }

    #[test]
    fn test_default_items_are_ordered() {
        let items = default_menu_items();
        assert!(items.iter().enumerate().all(|(i, item)| item.order == i));
        assert!(items.iter().all(|item| item.action().is_some()));
    }
}
