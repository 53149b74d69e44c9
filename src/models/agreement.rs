use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgreementStatus {
    Active,
    Draft,
    Archived,
}

/// A formalized team agreement. `signatories` lists the user ids that accepted it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub id: String,
    pub title: String,
    pub content: String,
    pub status: AgreementStatus,
    pub created_at: DateTime<Utc>,
    pub signatories: Vec<String>,
}

impl Agreement {
    /// Record a user's acceptance. Returns false if they had already signed.
    pub fn sign(&mut self, user_id: &str) -> bool {
        if self.signatories.iter().any(|s| s == user_id) {
            return false;
        }
        self.signatories.push(user_id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_twice_is_ignored() {
        let mut agreement = Agreement {
            id: "ag-1".to_string(),
            title: "Code review policy".to_string(),
            content: "Two approvals per PR".to_string(),
            status: AgreementStatus::Active,
            created_at: Utc::now(),
            signatories: vec!["user-1".to_string()],
        };
        assert!(!agreement.sign("user-1"));
        assert!(agreement.sign("user-2"));
        assert_eq!(agreement.signatories, vec!["user-1", "user-2"]);
    }
}
