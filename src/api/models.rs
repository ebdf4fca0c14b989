use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SearchRequest {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GamesRequest {
    pub id: Vec<u64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    pub game_id: u64,
}
