// shipctl - CLI for private-location ships and team agents
// Copyright (C) 2024 shipctl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Chooses which upstream endpoint answers a `get` invocation.

use tracing::warn;

/// Configured fallbacks for `--ws` / `--tm`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub workspace_id: Option<u64>,
    pub team_id: Option<String>,
}

/// What the user typed on the command line, before defaults are applied.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    pub workspace_id: Option<u64>,
    pub use_default_workspace: bool,
    pub team_id: Option<String>,
    pub use_default_team: bool,
    pub harbour_id: Option<String>,
    pub raw_output: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub workspace_id: Option<u64>,
    pub team_id: Option<String>,
    pub harbour_id: Option<String>,
    pub raw_output: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Team { team_id: String },
    Workspace { workspace_id: u64 },
    Harbour { workspace_id: u64, harbour_id: String },
    Integrations { team_id: String },
}

impl RequestContext {
    /// Applies `defaults` where the selection asked for them. A default that
    /// is not configured leaves the id unset.
    pub fn from_selection(selection: Selection, defaults: &Defaults) -> Self {
        let workspace_id = if selection.use_default_workspace {
            if defaults.workspace_id.is_none() {
                warn!("--ws given but no default workspace is configured");
            }
            defaults.workspace_id
        } else {
            selection.workspace_id
        };
        let team_id = if selection.use_default_team {
            if defaults.team_id.is_none() {
                warn!("--tm given but no default team is configured");
            }
            defaults.team_id.clone()
        } else {
            selection.team_id
        };

        Self {
            workspace_id,
            team_id,
            harbour_id: selection.harbour_id,
            raw_output: selection.raw_output,
        }
    }

    /// Route for `get agents`, or `None` when the context is insufficient.
    pub fn agents_route(&self) -> Option<Route> {
        match (self.workspace(), self.harbour(), self.team()) {
            (None, None, Some(team)) => Some(Route::Team {
                team_id: team.to_string(),
            }),
            (Some(workspace_id), None, _) => Some(Route::Workspace { workspace_id }),
            (Some(workspace_id), Some(harbour), _) => Some(Route::Harbour {
                workspace_id,
                harbour_id: harbour.to_string(),
            }),
            _ => None,
        }
    }

    /// Route for `get integrations`, which only exists on the team API.
    pub fn integrations_route(&self) -> Option<Route> {
        self.team().map(|team| Route::Integrations {
            team_id: team.to_string(),
        })
    }

    fn workspace(&self) -> Option<u64> {
        self.workspace_id.filter(|id| *id != 0)
    }

    fn harbour(&self) -> Option<&str> {
        self.harbour_id.as_deref().filter(|id| !id.is_empty())
    }

    fn team(&self) -> Option<&str> {
        self.team_id.as_deref().filter(|id| !id.is_empty())
    }
}
