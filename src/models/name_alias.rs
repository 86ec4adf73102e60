use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maps a one-letter initial to a participant fullname within a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NameAlias {
    pub chat_id: i64,
    /// Always stored lowercase.
    pub initial: String,
    pub fullname: String,
}

impl NameAlias {
    pub fn new(chat_id: i64, initial: &str, fullname: &str) -> Self {
        Self {
            chat_id,
            initial: initial.trim().to_lowercase(),
            fullname: fullname.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_normalizes_input() {
        let alias = NameAlias::new(1, " B ", " Bình ");
        assert_eq!(alias.initial, "b");
        assert_eq!(alias.fullname, "Bình");
    }
}
