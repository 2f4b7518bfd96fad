//! Member Model

use serde::{Deserialize, Serialize};

use crate::util::{non_blank, normalize_cni};

/// Member entity (club member directory record)
///
/// `id == 0` marks a record that has not been saved yet; the store assigns
/// a snowflake id on first save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cni: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cne: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub registered_at: i64,
}

impl Member {
    /// Normalized CNI, if the member has a non-blank one
    pub fn cni_key(&self) -> Option<String> {
        self.cni
            .as_deref()
            .map(normalize_cni)
            .filter(|c| !c.is_empty())
    }

    /// Case-insensitive CNI comparison
    pub fn matches_cni(&self, cni: &str) -> bool {
        let wanted = normalize_cni(cni);
        !wanted.is_empty() && self.cni_key().as_deref() == Some(wanted.as_str())
    }
}

/// Create member payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberCreate {
    pub name: String,
    #[serde(default)]
    pub cni: Option<String>,
    #[serde(default)]
    pub cne: Option<String>,
    #[serde(default)]
    pub school_level: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
}

impl MemberCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_cni(mut self, cni: impl Into<String>) -> Self {
        self.cni = Some(cni.into());
        self
    }

    pub fn with_cne(mut self, cne: impl Into<String>) -> Self {
        self.cne = Some(cne.into());
        self
    }

    pub fn with_school_level(mut self, level: impl Into<String>) -> Self {
        self.school_level = Some(level.into());
        self
    }

    pub fn with_whatsapp(mut self, number: impl Into<String>) -> Self {
        self.whatsapp = Some(number.into());
        self
    }

    /// Normalized CNI, if non-blank
    pub fn cni_key(&self) -> Option<String> {
        self.cni
            .as_deref()
            .map(normalize_cni)
            .filter(|c| !c.is_empty())
    }

    /// Build an unsaved member: text trimmed, blanks dropped, CNI lower-cased.
    pub fn into_member(self, registered_at: i64) -> Member {
        Member {
            id: 0,
            name: self.name.trim().to_string(),
            cni: self.cni_key(),
            cne: non_blank(self.cne.as_deref()),
            school_level: non_blank(self.school_level.as_deref()),
            whatsapp: non_blank(self.whatsapp.as_deref()),
            registered_at,
        }
    }
}

/// Update member payload (profile edits; `None` leaves a field unchanged)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cni: Option<String>,
    #[serde(default)]
    pub cne: Option<String>,
    #[serde(default)]
    pub school_level: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
}

impl MemberUpdate {
    /// Apply to a member; a blank optional field clears it.
    pub fn apply_to(self, member: &mut Member) {
        if let Some(name) = self.name {
            member.name = name.trim().to_string();
        }
        if let Some(cni) = self.cni {
            member.cni = Some(normalize_cni(&cni)).filter(|c| !c.is_empty());
        }
        if let Some(cne) = self.cne {
            member.cne = non_blank(Some(cne.as_str()));
        }
        if let Some(level) = self.school_level {
            member.school_level = non_blank(Some(level.as_str()));
        }
        if let Some(number) = self.whatsapp {
            member.whatsapp = non_blank(Some(number.as_str()));
        }
    }
}
