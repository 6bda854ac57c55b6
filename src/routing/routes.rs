//! The application's route surface and the guard requirement of each route

use super::guard::GuardRequirement;

pub const LOGIN_PATH: &str = "/login";
pub const CALLBACK_PATH: &str = "/auth/callback";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    AuthCallback,
    Chat,
    Quiz,
    History,
    AdminDashboard,
    AdminChapters,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Login,
        Route::AuthCallback,
        Route::Chat,
        Route::Quiz,
        Route::History,
        Route::AdminDashboard,
        Route::AdminChapters,
    ];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => LOGIN_PATH,
            Route::AuthCallback => CALLBACK_PATH,
            Route::Chat => HOME_PATH,
            Route::Quiz => "/quiz",
            Route::History => "/history",
            Route::AdminDashboard => "/admin",
            Route::AdminChapters => "/admin/chapters",
        }
    }

    /// `None` for public routes
    #[must_use]
    pub fn requirement(self) -> Option<GuardRequirement> {
        match self {
            Route::Login | Route::AuthCallback => None,
            Route::Chat | Route::Quiz | Route::History => Some(GuardRequirement::AUTHENTICATED),
            Route::AdminDashboard | Route::AdminChapters => Some(GuardRequirement::ADMIN),
        }
    }

    /// Match a location against the route table, ignoring query, fragment
    /// and a trailing slash
    #[must_use]
    pub fn from_path(location: &str) -> Option<Route> {
        let path = normalize_path(location);
        Route::ALL.into_iter().find(|route| route.path() == path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    Public(Route),
    Protected(Route, GuardRequirement),
    /// Not in the table; the router sends these to `/`
    Unknown,
}

#[must_use]
pub fn resolve(location: &str) -> RouteMatch {
    match Route::from_path(location) {
        Some(route) => match route.requirement() {
            Some(requirement) => RouteMatch::Protected(route, requirement),
            None => RouteMatch::Public(route),
        },
        None => RouteMatch::Unknown,
    }
}

fn normalize_path(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    let path = &location[..end];
    match path.trim_end_matches('/') {
        "" => HOME_PATH,
        trimmed => trimmed,
    }
}
