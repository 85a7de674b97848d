use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// Who may see the election results.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultVisibility {
    /// Anyone, at any time.
    Public,
    /// Anyone, once the election has closed.
    #[default]
    AfterClosure,
    /// Administrators only.
    AdminOnly,
}

impl From<ResultVisibility> for Bson {
    fn from(visibility: ResultVisibility) -> Self {
        to_bson(&visibility).expect("Serialisation is infallible")
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn wire_names() {
        let visibility: ResultVisibility = serde_json::from_str("\"after_closure\"").unwrap();
        assert_eq!(visibility, ResultVisibility::AfterClosure);
        assert_eq!(
            serde_json::to_string(&ResultVisibility::AdminOnly).unwrap(),
            "\"admin_only\""
        );
        assert!(serde_json::from_str::<ResultVisibility>("\"never\"").is_err());
    }
}
