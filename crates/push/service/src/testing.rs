//! In-memory fakes for service tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use push_fcm::{
    AccessToken, Message, MessageSender, ProviderAuth, ProviderReply, ServiceAccount,
    TokenExchanger,
};
use push_storage::{IdentityStore, TokenStore};

#[derive(Clone, Default)]
pub struct FakeStore {
    users: HashMap<String, String>,
    devices: Vec<(String, Option<String>, String)>,
    failing: bool,
}

impl FakeStore {
    pub fn with_user(mut self, bearer: &str, user_id: &str) -> Self {
        self.users.insert(bearer.into(), user_id.into());
        self
    }

    pub fn with_device(mut self, owner: &str, pet_id: Option<&str>, token: &str) -> Self {
        self.devices
            .push((owner.into(), pet_id.map(Into::into), token.into()));
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn check(&self) -> color_eyre::eyre::Result<()> {
        if self.failing {
            color_eyre::eyre::bail!("store unavailable");
        }
        Ok(())
    }
}

impl IdentityStore for FakeStore {
    async fn verify_token(&self, bearer: &str) -> color_eyre::eyre::Result<Option<String>> {
        self.check()?;
        Ok(self.users.get(bearer).cloned())
    }
}

impl TokenStore for FakeStore {
    async fn owns_token(&self, owner_id: &str, token: &str) -> color_eyre::eyre::Result<bool> {
        self.check()?;
        Ok(self
            .devices
            .iter()
            .any(|(owner, _, t)| owner == owner_id && t == token))
    }

    async fn tokens_for_pet(
        &self,
        pet_id: &str,
        owner_id: Option<&str>,
    ) -> color_eyre::eyre::Result<Vec<String>> {
        self.check()?;
        Ok(self
            .devices
            .iter()
            .filter(|(_, pet, _)| pet.as_deref() == Some(pet_id))
            .filter(|(owner, _, _)| owner_id.is_none_or(|id| id == owner))
            .map(|(_, _, token)| token.clone())
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct FakeExchanger {
    pub calls: Arc<AtomicUsize>,
    failing: bool,
}

impl FakeExchanger {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }
}

impl TokenExchanger for FakeExchanger {
    async fn exchange(
        &self,
        _account: &ServiceAccount,
        _scope: &str,
    ) -> color_eyre::eyre::Result<AccessToken> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            color_eyre::eyre::bail!("invalid_grant");
        }
        Ok(AccessToken {
            token: "ya29.fake".into(),
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        })
    }
}

/// Records every message; tokens in `rejected` get a 400, tokens in
/// `garbled` get a non-JSON reply.
#[derive(Clone, Default)]
pub struct RecordingSender {
    pub sent: Arc<Mutex<Vec<Message>>>,
    rejected: HashSet<String>,
    garbled: HashSet<String>,
}

impl RecordingSender {
    pub fn rejecting(mut self, token: &str) -> Self {
        self.rejected.insert(token.into());
        self
    }

    pub fn garbling(mut self, token: &str) -> Self {
        self.garbled.insert(token.into());
        self
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.token.clone().or_else(|| m.topic.clone()).unwrap_or_default())
            .collect()
    }
}

impl MessageSender for RecordingSender {
    async fn send(
        &self,
        auth: &ProviderAuth,
        message: &Message,
    ) -> color_eyre::eyre::Result<ProviderReply> {
        assert_eq!(auth.access_token, "ya29.fake");
        self.sent.lock().unwrap().push(message.clone());

        let target = message.token.as_deref().or(message.topic.as_deref()).unwrap_or_default();
        if self.garbled.contains(target) {
            return Ok(ProviderReply {
                status: 200,
                payload: push_core::non_json_marker(),
            });
        }
        if self.rejected.contains(target) {
            return Ok(ProviderReply {
                status: 400,
                payload: serde_json::json!({"error": {"status": "INVALID_ARGUMENT"}}),
            });
        }
        Ok(ProviderReply {
            status: 200,
            payload: serde_json::json!({
                "name": format!("projects/{}/messages/1", auth.project_id)
            }),
        })
    }
}
