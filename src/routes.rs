// App routes shared with the webview router
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::catalog::DEFAULT_MEDITATION_ID;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Route {
    Cards,
    Reels,
    Favorites,
    Profile,
    Meditation { id: String },
    MeditationComplete { id: String },
}

/// `/meditation`, `/meditation/:id` and `/meditation/:id/complete`
fn get_meditation_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^/meditation(?:/([^/]+))?(/complete)?/?$").unwrap()
    })
}

impl Route {
    /// Parse a router path. The query string and fragment are ignored.
    pub fn parse(path: &str) -> Option<Route> {
        Self::parse_with_default(path, DEFAULT_MEDITATION_ID)
    }

    /// Like `parse`, opening `default_id` for a bare `/meditation`
    pub fn parse_with_default(path: &str, default_id: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();

        match path.trim_end_matches('/') {
            "" | "/cards" => return Some(Route::Cards),
            "/reels" => return Some(Route::Reels),
            "/favorites" => return Some(Route::Favorites),
            "/profile" => return Some(Route::Profile),
            _ => {}
        }

        let captures = get_meditation_regex().captures(path)?;
        let id = captures.get(1).map(|m| m.as_str());
        let complete = captures.get(2).is_some();

        match (id, complete) {
            (Some(id), false) => Some(Route::Meditation { id: id.to_string() }),
            (Some(id), true) => Some(Route::MeditationComplete { id: id.to_string() }),
            (None, _) => Some(Route::meditation(default_id)),
        }
    }

    pub fn meditation(id: &str) -> Self {
        Route::Meditation { id: id.to_string() }
    }

    pub fn completion(id: &str) -> Self {
        Route::MeditationComplete { id: id.to_string() }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Cards => "/cards".to_string(),
            Route::Reels => "/reels".to_string(),
            Route::Favorites => "/favorites".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::Meditation { id } => format!("/meditation/{}", id),
            Route::MeditationComplete { id } => format!("/meditation/{}/complete", id),
        }
    }
}

/// Payload of the `navigate` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NavigationEvent {
    Push { path: String, route: Route },
    /// Leave the current screen (history back)
    Back,
}

impl NavigationEvent {
    pub fn push(route: Route) -> Self {
        NavigationEvent::Push {
            path: route.path(),
            route,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_routes() {
        assert_eq!(Route::parse("/"), Some(Route::Cards));
        assert_eq!(Route::parse("/cards"), Some(Route::Cards));
        assert_eq!(Route::parse("/reels/"), Some(Route::Reels));
        assert_eq!(Route::parse("/favorites"), Some(Route::Favorites));
        assert_eq!(Route::parse("/profile"), Some(Route::Profile));
    }

    #[test]
    fn test_meditation_routes() {
        assert_eq!(Route::parse("/meditation/calm3"), Some(Route::meditation("calm3")));
        assert_eq!(
            Route::parse("/meditation/calm3/complete"),
            Some(Route::completion("calm3"))
        );
        assert_eq!(
            Route::parse("/meditation/calm3?autoplay=1"),
            Some(Route::meditation("calm3"))
        );
    }

    #[test]
    fn test_missing_id_uses_default() {
        assert_eq!(
            Route::parse("/meditation"),
            Some(Route::meditation(DEFAULT_MEDITATION_ID))
        );
        assert_eq!(
            Route::parse_with_default("/meditation/", "calm2"),
            Some(Route::meditation("calm2"))
        );
        assert_eq!(
            Route::parse_with_default("/meditation/calm3", "calm2"),
            Some(Route::meditation("calm3"))
        );
    }

    #[test]
    fn test_unknown_paths() {
        assert_eq!(Route::parse("/settings"), None);
        assert_eq!(Route::parse("/meditation/a/b"), None);
    }

    #[test]
    fn test_path_formatting() {
        assert_eq!(Route::completion("calm3").path(), "/meditation/calm3/complete");
        assert_eq!(Route::parse(&Route::meditation("deep10").path()), Some(Route::meditation("deep10")));
    }

    #[test]
    fn test_navigation_payload() {
        let json = serde_json::to_value(NavigationEvent::push(Route::completion("calm3"))).unwrap();
        assert_eq!(json["action"], "push");
        assert_eq!(json["path"], "/meditation/calm3/complete");
        assert_eq!(json["route"]["screen"], "meditation_complete");
        assert_eq!(json["route"]["id"], "calm3");

        let back = serde_json::to_value(NavigationEvent::Back).unwrap();
        assert_eq!(back["action"], "back");
    }
}
