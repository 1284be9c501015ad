use wardrobe_schema::{Screen, StorageLocation};

/// What the UI should render, resolved against the current locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View<'a> {
    Home,
    Location(&'a StorageLocation),
    Search,
    Video,
}

/// Active screen plus the selected location. In-memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigator {
    active: Screen,
    selected_location: Option<String>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_screen(&self) -> Screen {
        self.active
    }

    pub fn selected_location_id(&self) -> Option<&str> {
        self.selected_location.as_deref()
    }

    pub fn go_to(&mut self, screen: Screen) {
        self.active = screen;
    }

    pub fn select_location(&mut self, id: impl Into<String>) {
        self.selected_location = Some(id.into());
        self.active = Screen::Location;
    }

    /// Drop the selection if it points at `id`. Returns whether it did.
    pub fn forget_location(&mut self, id: &str) -> bool {
        if self.selected_location.as_deref() != Some(id) {
            return false;
        }
        self.selected_location = None;
        self.active = Screen::Home;
        true
    }

    /// A Location screen whose selection no longer resolves renders Home.
    pub fn current_view<'a>(&self, locations: &'a [StorageLocation]) -> View<'a> {
        match self.active {
            Screen::Home => View::Home,
            Screen::Search => View::Search,
            Screen::Video => View::Video,
            Screen::Location => self
                .selected_location
                .as_deref()
                .and_then(|id| locations.iter().find(|l| l.id == id))
                .map(View::Location)
                .unwrap_or(View::Home),
        }
    }

    /// Bottom-bar highlight. The Home tab stays lit while inside a location.
    pub fn tab_is_active(&self, tab: Screen) -> bool {
        match tab {
            Screen::Home => matches!(self.active, Screen::Home | Screen::Location),
            other => self.active == other,
        }
    }
}
