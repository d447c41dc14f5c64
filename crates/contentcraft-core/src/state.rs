//! UI-agnostic navigation state
//!
//! Shared by every front end; holds which screen is visible and which
//! template the generate screen is bound to.

use thiserror::Error;

use crate::catalog::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Catalog,
    Generate,
    History,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Catalog => "Templates",
            View::Generate => "Generate",
            View::History => "History",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Select a template before opening the generator")]
    NoTemplateSelected,
}

/// Current view plus the selected template. No back-stack.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    view: View,
    selected: Option<&'static Template>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selected(&self) -> Option<&'static Template> {
        self.selected
    }

    /// Bind `template` and switch to the generate view.
    pub fn select(&mut self, template: &'static Template) {
        self.selected = Some(template);
        self.view = View::Generate;
    }

    pub fn navigate(&mut self, view: View) -> Result<(), NavigationError> {
        match view {
            View::Generate if self.selected.is_none() => {
                return Err(NavigationError::NoTemplateSelected)
            }
            View::Catalog => self.selected = None,
            _ => {}
        }
        self.view = view;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_generate_requires_selection() {
        let mut nav = Navigator::new();
        assert_eq!(nav.navigate(View::Generate), Err(NavigationError::NoTemplateSelected));
        assert_eq!(nav.view(), View::Catalog);
    }

    #[test]
    fn test_select_then_back_to_catalog_clears() {
        let mut nav = Navigator::new();
        let template = Catalog::builtin().find("rewrite").unwrap();
        nav.select(template);
        assert_eq!(nav.view(), View::Generate);
        assert_eq!(nav.selected().map(|t| t.id), Some("rewrite"));

        nav.navigate(View::Catalog).unwrap();
        assert!(nav.selected().is_none());
        assert!(nav.navigate(View::Generate).is_err());
    }

    #[test]
    fn test_history_keeps_selection() {
        let mut nav = Navigator::new();
        nav.select(Catalog::builtin().find("blog-post").unwrap());
        nav.navigate(View::History).unwrap();
        assert!(nav.selected().is_some());
        nav.navigate(View::Generate).unwrap();
        assert_eq!(nav.view(), View::Generate);
    }
}
