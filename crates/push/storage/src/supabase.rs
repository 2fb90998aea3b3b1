//! Supabase REST storage implementation.
//!
//! Token verification goes through the GoTrue `/auth/v1/user` endpoint with
//! the anonymous key; device lookups go through PostgREST with the service
//! role key.

use color_eyre::eyre::WrapErr as _;

use crate::traits::*;

const TOKENS_TABLE: &str = "fcm_tokens";

/// Supabase-backed storage.
#[derive(Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    url: String,
    anon_key: String,
    service_role_key: String,
}

#[derive(Debug, serde::Deserialize)]
struct AuthUser {
    id: String,
}

#[derive(Debug, serde::Deserialize)]
struct TokenRow {
    token: Option<String>,
}

impl SupabaseStore {
    /// Create a new Supabase store.
    pub fn new(url: &str, anon_key: &str, service_role_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            service_role_key: service_role_key.to_string(),
        }
    }

    async fn select_tokens(
        &self,
        filters: &[(&str, &str)],
    ) -> color_eyre::eyre::Result<Vec<String>> {
        let mut query = vec![("select", "token".to_string())];
        query.extend(
            filters
                .iter()
                .map(|(column, value)| (*column, format!("eq.{value}"))),
        );

        let response = self
            .client
            .get(format!("{}/rest/v1/{}", self.url, TOKENS_TABLE))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .query(&query)
            .send()
            .await
            .wrap_err("failed to query device tokens")?
            .error_for_status()
            .wrap_err("device token query rejected")?;

        let rows: Vec<TokenRow> = response
            .json()
            .await
            .wrap_err("failed to parse device token rows")?;

        Ok(rows.into_iter().filter_map(|row| row.token).collect())
    }
}

impl IdentityStore for SupabaseStore {
    async fn verify_token(&self, bearer: &str) -> color_eyre::eyre::Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.url))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .send()
            .await
            .wrap_err("failed to reach auth service")?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "user token rejected");
            return Ok(None);
        }

        let user: AuthUser = response
            .json()
            .await
            .wrap_err("failed to parse auth user")?;

        Ok(Some(user.id))
    }
}

impl TokenStore for SupabaseStore {
    async fn owns_token(&self, owner_id: &str, token: &str) -> color_eyre::eyre::Result<bool> {
        let rows = self
            .select_tokens(&[("owner_id", owner_id), ("token", token)])
            .await?;

        Ok(!rows.is_empty())
    }

    async fn tokens_for_pet(
        &self,
        pet_id: &str,
        owner_id: Option<&str>,
    ) -> color_eyre::eyre::Result<Vec<String>> {
        let mut filters = vec![("pet_id", pet_id)];
        if let Some(owner_id) = owner_id {
            filters.push(("owner_id", owner_id));
        }

        self.select_tokens(&filters).await
    }
}
