//! GitHub API Client
//!
//! Thin wrapper over the GitHub Labels API. Each operation is a single HTTP
//! round trip with no retry policy; batch deletion loops sequentially so one
//! failure never affects the rest of the batch.

use octocrab::Octocrab;

use crate::error::{Error, Result};
use crate::labels::LabelRecord;

/// Color sent when a record carries none; the API requires one
const DEFAULT_COLOR: &str = "ededed";

/// Encode a string for use in URL path segments (RFC 3986 with UTF-8 support)
///
/// Only unreserved characters (A-Z, a-z, 0-9, -, ., _, ~) are left unencoded,
/// so label names with spaces or non-ASCII text address the right resource.
fn encode_path_segment(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '~' => c.to_string(),
            _ => c
                .to_string()
                .bytes()
                .map(|b| format!("%{:02X}", b))
                .collect::<String>(),
        })
        .collect()
}

/// Outcome of a label creation attempt
///
/// Response codes map to distinct outcomes: 201 created, 404 repository not
/// found, 422 label already exists. Anything else is reported as unexpected
/// without further classification.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created,
    RepositoryNotFound,
    AlreadyExists,
    Unexpected(String),
}

/// Outcome of a label deletion attempt
///
/// A 404 is reported but not fatal to the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Failed(String),
}

/// Resolve the authenticated user's login for a token
///
/// Used to validate saved credentials against the live API.
///
/// # Errors
/// [`Error::AuthenticationFailed`] when the API rejects the token;
/// [`Error::Network`] for any other failure.
pub async fn authenticated_login(token: &str) -> Result<String> {
    let octocrab = Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(Error::Network)?;

    let user = octocrab.current().user().await.map_err(|e| {
        if is_auth_error(&e) {
            Error::AuthenticationFailed
        } else {
            Error::Network(e)
        }
    })?;

    Ok(user.login)
}

/// GitHub Labels API client bound to one repository
pub struct LabelClient {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl LabelClient {
    /// Create a new client and verify the token against `GET /user`
    ///
    /// # Errors
    /// Returns [`Error::AuthenticationFailed`] if the token is rejected.
    pub async fn new(access_token: &str, owner: &str, repo: &str) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(access_token.to_string())
            .build()
            .map_err(Error::Network)?;

        let _user = octocrab
            .current()
            .user()
            .await
            .map_err(|_| Error::AuthenticationFailed)?;

        Ok(Self {
            octocrab,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Create a label, classifying the response
    ///
    /// One round trip, no retry. Every failure is folded into an outcome so
    /// batch creation can continue past individual errors.
    pub async fn create_label(&self, record: &LabelRecord) -> CreateOutcome {
        let color = record.color.as_deref().unwrap_or(DEFAULT_COLOR);
        let description = record.description.as_deref().unwrap_or("");

        let result = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .create_label(&record.name, color, description)
            .await;

        match result {
            Ok(_) => CreateOutcome::Created,
            Err(e) if is_not_found_error(&e) => CreateOutcome::RepositoryNotFound,
            Err(e) if is_validation_error(&e) => CreateOutcome::AlreadyExists,
            Err(e) => CreateOutcome::Unexpected(e.to_string()),
        }
    }

    /// Delete a single label
    pub async fn delete_label(&self, name: &str) -> DeleteOutcome {
        let encoded_name = encode_path_segment(name);
        let result = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .delete_label(&encoded_name)
            .await;

        match result {
            Ok(()) => DeleteOutcome::Deleted,
            Err(e) if is_not_found_error(&e) => DeleteOutcome::NotFound,
            Err(e) => DeleteOutcome::Failed(e.to_string()),
        }
    }

    /// Delete labels one at a time
    ///
    /// Names are processed sequentially in the order given; each outcome is
    /// recorded per name and one failure does not stop the rest.
    pub async fn delete_labels(&self, names: &[String]) -> Vec<(String, DeleteOutcome)> {
        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            let outcome = self.delete_label(name).await;
            outcomes.push((name.clone(), outcome));
        }
        outcomes
    }

    /// List label names, first page only
    ///
    /// A single `GET` with `per_page(100)`; repositories with more than 100
    /// labels are undercounted. Used to drive the "delete all" action.
    ///
    /// # Errors
    /// Returns an error if the API call fails.
    pub async fn list_label_names(&self) -> Result<Vec<String>> {
        let page = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .list_labels_for_repo()
            .per_page(100)
            .send()
            .await
            .map_err(Error::Network)?;

        Ok(page.items.into_iter().map(|label| label.name).collect())
    }

    /// Repository this client is bound to, as `owner/repo`
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

fn is_not_found_error(err: &octocrab::Error) -> bool {
    err.to_string().contains("Not Found")
}

fn is_validation_error(err: &octocrab::Error) -> bool {
    let message = err.to_string();
    message.contains("already_exists") || message.contains("Validation Failed")
}

fn is_auth_error(err: &octocrab::Error) -> bool {
    let message = err.to_string();
    message.contains("Bad credentials") || message.contains("401")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("bug"), "bug");
        assert_eq!(encode_path_segment("feature-request"), "feature-request");
        assert_eq!(
            encode_path_segment("good first issue"),
            "good%20first%20issue"
        );
        assert_eq!(encode_path_segment("バグ"), "%E3%83%90%E3%82%B0");
        assert_eq!(
            encode_path_segment("test-label_v1.2~alpha"),
            "test-label_v1.2~alpha"
        );
        assert_eq!(encode_path_segment("test/label"), "test%2Flabel");
    }

    #[test]
    fn test_create_outcome_equality() {
        assert_eq!(CreateOutcome::Created, CreateOutcome::Created);
        assert_ne!(
            CreateOutcome::AlreadyExists,
            CreateOutcome::RepositoryNotFound
        );
    }
}
