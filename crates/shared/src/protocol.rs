use serde::{Deserialize, Serialize};

use crate::domain::{Record, RecordId, ResultSet, UserProfile};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayload {
    pub id: RecordId,
    #[serde(flatten)]
    pub profile: UserProfile,
}

impl From<RecordPayload> for Record {
    fn from(value: RecordPayload) -> Self {
        Record::loaded(value.id, value.profile)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<RecordPayload>,
}

impl From<SearchResponse> for ResultSet {
    fn from(value: SearchResponse) -> Self {
        ResultSet::new(value.items.into_iter().map(Record::from))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub has_more_items: bool,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_more_items: false,
        }
    }

    pub fn more(items: Vec<T>) -> Self {
        Self {
            items,
            has_more_items: true,
        }
    }
}
