use std::str::FromStr;

use switchrt_core::SessionKind;

/// Entry points that start a run. The route alone decides the session length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/trial`: short practice run.
    Trial,
    /// `/game`: full recorded run.
    Game,
}

impl Route {
    /// Parses `/trial`, `trial`, `/game/` and the like.
    pub fn parse(path: &str) -> Option<Self> {
        match path.trim().trim_matches('/') {
            "trial" => Some(Route::Trial),
            "game" => Some(Route::Game),
            _ => None,
        }
    }

    pub const fn path(self) -> &'static str {
        match self {
            Route::Trial => "/trial",
            Route::Game => "/game",
        }
    }

    pub const fn session_kind(self) -> SessionKind {
        match self {
            Route::Trial => SessionKind::Short,
            Route::Game => SessionKind::Long,
        }
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::parse(s).ok_or_else(|| format!("unknown route {s:?}, expected 'trial' or 'game'"))
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
