use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Admin,
    Staff,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        })
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            other => Err(format!("unknown role '{other}' (expected admin or staff)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavItem {
    Headquarters,
    Violations,
    Personnel,
    Analytics,
    Settings,
}

impl NavItem {
    pub const ALL: [NavItem; 5] = [
        NavItem::Headquarters,
        NavItem::Violations,
        NavItem::Personnel,
        NavItem::Analytics,
        NavItem::Settings,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NavItem::Headquarters => "Headquarters",
            NavItem::Violations => "Violations",
            NavItem::Personnel => "Personnel",
            NavItem::Analytics => "Analytics",
            NavItem::Settings => "Settings",
        }
    }

    /// CLI command that opens this view, if there is one.
    pub fn command(self) -> Option<&'static str> {
        match self {
            NavItem::Headquarters => Some("stats"),
            NavItem::Violations => Some("violations"),
            NavItem::Personnel => Some("verified"),
            NavItem::Analytics => Some("analytics"),
            NavItem::Settings => None,
        }
    }

    fn admin_only(self) -> bool {
        matches!(self, NavItem::Headquarters | NavItem::Analytics)
    }
}

/// Who is looking. Passed explicitly to anything that varies by role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub role: Role,
}

impl Session {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    pub fn can_see(&self, item: NavItem) -> bool {
        self.role == Role::Admin || !item.admin_only()
    }

    pub fn nav_items(&self) -> Vec<NavItem> {
        NavItem::ALL.into_iter().filter(|i| self.can_see(*i)).collect()
    }
}
