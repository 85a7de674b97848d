use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// The parts of an authenticated user's account that the election core reads.
/// Accounts are owned by the authentication service and never written here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// The name a new voter record is seeded with.
    pub fn display_name(&self) -> Option<String> {
        [&self.full_name, &self.email]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_email() {
        let mut user = User {
            id: Id::new(),
            full_name: Some("Nusrat Jahan".to_string()),
            email: Some("it21001@mbstu.ac.bd".to_string()),
        };
        assert_eq!(user.display_name().as_deref(), Some("Nusrat Jahan"));

        user.full_name = Some(String::new());
        assert_eq!(user.display_name().as_deref(), Some("it21001@mbstu.ac.bd"));

        user.email = None;
        assert_eq!(user.display_name(), None);
    }
}
