use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    session::SessionUser,
    store::{to_body, Document, DocumentStore, Query},
};

pub const USERS: &str = "users";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Password,
    Google,
}

/// Stored user body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>, // argon2; absent for OAuth-only users
    pub provider: Provider,
    pub provider_subject: Option<String>,
    /// Bumped on sign-out and password reset; tokens from an older epoch are refused.
    pub session_epoch: u64,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub record: UserRecord,
    pub created_at: OffsetDateTime,
}

impl User {
    fn from_doc(doc: &Document) -> anyhow::Result<User> {
        Ok(User {
            id: doc.id,
            record: doc.decode()?,
            created_at: doc.created_at,
        })
    }

    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            uid: self.id,
            email: self.record.email.clone(),
            display_name: self.record.display_name.clone(),
            photo_url: self.record.photo_url.clone(),
        }
    }

    /// Whether a token signed in `epoch` still belongs to a live session.
    pub fn session_current(&self, epoch: u64) -> bool {
        self.record.session_epoch == epoch
    }

    /// Invalidate every token issued so far.
    pub fn end_sessions(&mut self) {
        self.record.session_epoch += 1;
    }

    /// Find a user by (lower-cased) email.
    pub async fn find_by_email(store: &dyn DocumentStore, email: &str) -> anyhow::Result<Option<User>> {
        let docs = store
            .find(Query::collection(USERS).where_eq("email", email).limit(1))
            .await?;
        docs.first().map(User::from_doc).transpose()
    }

    pub async fn find_by_id(store: &dyn DocumentStore, id: Uuid) -> anyhow::Result<Option<User>> {
        store
            .get(USERS, id)
            .await?
            .as_ref()
            .map(User::from_doc)
            .transpose()
    }

    pub async fn find_by_subject(
        store: &dyn DocumentStore,
        provider: Provider,
        subject: &str,
    ) -> anyhow::Result<Option<User>> {
        let docs = store
            .find(
                Query::collection(USERS)
                    .where_eq("provider", to_body(&provider)?)
                    .where_eq("provider_subject", subject)
                    .limit(1),
            )
            .await?;
        docs.first().map(User::from_doc).transpose()
    }

    pub async fn create(store: &dyn DocumentStore, record: UserRecord) -> anyhow::Result<User> {
        let doc = store.create(USERS, to_body(&record)?).await?;
        User::from_doc(&doc)
    }

    pub async fn save(&self, store: &dyn DocumentStore) -> anyhow::Result<User> {
        let doc = store.update(USERS, self.id, to_body(&self.record)?).await?;
        User::from_doc(&doc)
    }
}
