use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map($name)
            }
        }
    };
}

id_newtype!(RecordId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_joined: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl UserProfile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            full_name: String::new(),
            email: String::new(),
            is_active: true,
            is_superuser: false,
            date_joined: None,
        }
    }

    /// Case-insensitive match over username, full name and email.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.username, &self.full_name, &self.email]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A record is either a stub (id only) or fully loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub profile: Option<UserProfile>,
}

impl Record {
    pub fn stub(id: RecordId) -> Self {
        Self { id, profile: None }
    }

    pub fn loaded(id: RecordId, profile: UserProfile) -> Self {
        Self {
            id,
            profile: Some(profile),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.profile.is_some()
    }
}

/// Ordered result of a collection search, unique by record id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        let mut out: Vec<Record> = Vec::new();
        for record in records {
            if let Some(existing) = out.iter_mut().find(|r| r.id == record.id) {
                *existing = record;
            } else {
                out.push(record);
            }
        }
        Self { records: out }
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|r| r.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub suggested: u64,
    #[serde(default)]
    pub translated: u64,
    #[serde(default)]
    pub reviewed: u64,
}

impl Contributor {
    pub fn total(&self) -> u64 {
        self.suggested + self.translated + self.reviewed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_parses_and_displays() {
        assert_eq!(" 42 ".parse::<RecordId>(), Ok(RecordId(42)));
        assert!("abc".parse::<RecordId>().is_err());
        assert_eq!(RecordId(7).to_string(), "7");
    }

    #[test]
    fn profile_matches_any_text_field_case_insensitively() {
        let mut profile = UserProfile::new("alice");
        profile.full_name = "Alice Liddell".to_string();
        profile.email = "alice@wonder.land".to_string();

        assert!(profile.matches(""));
        assert!(profile.matches("LIDDELL"));
        assert!(profile.matches("wonder"));
        assert!(!profile.matches("bob"));
    }

    #[test]
    fn result_set_is_unique_by_id_and_keeps_order() {
        let set = ResultSet::new(vec![
            Record::stub(RecordId(3)),
            Record::stub(RecordId(1)),
            Record::loaded(RecordId(3), UserProfile::new("carol")),
        ]);
        assert_eq!(set.ids(), vec![RecordId(3), RecordId(1)]);
        assert!(set.get(RecordId(3)).expect("record").is_loaded());
        assert!(!set.contains(RecordId(2)));
    }
}
