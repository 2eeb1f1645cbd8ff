use crate::{
    error::{AppError, AppResult},
    model::{ItemId, ListId, MoveTarget},
};

// Struct representing the request body for registering or logging in
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CredentialsSchema {
    pub username: String,
    pub password: String,
}

// Struct representing the request body for creating or renaming a list
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ListSchema {
    pub title: String,
}

// Struct representing the request body for creating a new item
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct CreateItemSchema {
    pub content: String,
    #[serde(default)]
    pub list_id: Option<ListId>,
    #[serde(default)]
    pub parent_id: Option<ItemId>,
}

// Struct representing the request body for updating an item
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct UpdateItemSchema {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

// Struct representing the request body for moving an item,
// e.g. {"target_type": "item", "target_id": 4}
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct MoveItemSchema {
    pub target_type: String,
    pub target_id: i64,
}

impl MoveItemSchema {
    pub fn target(&self) -> AppResult<MoveTarget> {
        match self.target_type.as_str() {
            "list" => Ok(MoveTarget::List(self.target_id)),
            "item" => Ok(MoveTarget::Item(self.target_id)),
            other => Err(AppError::InvalidInput(format!("Invalid target type {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_schema_parses_target_kinds() {
        let body: MoveItemSchema =
            serde_json::from_str(r#"{"target_type": "item", "target_id": 4}"#).unwrap();
        assert_eq!(body.target().unwrap(), MoveTarget::Item(4));

        let body: MoveItemSchema =
            serde_json::from_str(r#"{"target_type": "list", "target_id": 2}"#).unwrap();
        assert_eq!(body.target().unwrap(), MoveTarget::List(2));

        let body: MoveItemSchema =
            serde_json::from_str(r#"{"target_type": "shelf", "target_id": 2}"#).unwrap();
        assert!(matches!(body.target(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn create_item_schema_defaults_missing_ids() {
        let body: CreateItemSchema = serde_json::from_str(r#"{"content": "milk"}"#).unwrap();
        assert_eq!((body.list_id, body.parent_id), (None, None));
    }
}
