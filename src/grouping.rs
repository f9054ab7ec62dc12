// src/grouping.rs
//! Client -> chats hierarchy for the navigation sidebar.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClientChat {
    pub chat_id: i64,
    pub client_id: i64,
}

impl ClientChat {
    pub fn new(chat_id: i64, client_id: i64) -> Self {
        Self { chat_id, client_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientChatsGroup {
    pub client_id: i64,
    pub chats: Vec<ClientChat>,
}

/// Deduplicates on `(chat_id, client_id)` and groups by client. Groups are
/// ordered by client id, chats inside a group by chat id.
pub fn group_client_chats<I>(pairs: I) -> Vec<ClientChatsGroup>
where
    I: IntoIterator<Item = ClientChat>,
{
    let mut by_client: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
    for pair in pairs {
        by_client.entry(pair.client_id).or_default().insert(pair.chat_id);
    }

    by_client
        .into_iter()
        .map(|(client_id, chat_ids)| ClientChatsGroup {
            client_id,
            chats: chat_ids
                .into_iter()
                .map(|chat_id| ClientChat::new(chat_id, client_id))
                .collect(),
        })
        .collect()
}
