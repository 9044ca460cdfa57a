// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{any::Any, future::Future, sync::Arc};

use moka::future::Cache;
use serde::de::Error as _;

use crate::{
    client::{ResourceClient, require_id},
    config::CachePolicy,
    error::ClientError,
    models::{Challenge, ChallengeDraft, ChallengeSummary, CheckIn, Membership, MembershipToggle, Program},
    query_keys::{QueryKey, challenges},
    session::Session,
};

type CachedValue = Arc<dyn Any + Send + Sync>;

/// Cached reads on top of [`ResourceClient`], addressed by [`QueryKey`].
///
/// Only successful results are stored. Mutations invalidate the scopes they
/// affect so the next read goes back to the server.
#[derive(Clone)]
pub struct QueryClient {
    resources: ResourceClient,
    cache: Cache<QueryKey, CachedValue>,
    policy: CachePolicy,
}

impl QueryClient {
    pub fn new(resources: ResourceClient, policy: CachePolicy) -> Self {
        let mut builder = Cache::builder().max_capacity(policy.max_capacity);
        if !policy.stale_time.is_zero() {
            builder = builder.time_to_live(policy.stale_time);
        }
        Self {
            resources,
            cache: builder.build(),
            policy,
        }
    }

    pub fn resources(&self) -> &ResourceClient {
        &self.resources
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub async fn get_cached<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let value = self.cache.get(key).await?;
        match value.downcast::<T>() {
            Ok(value) => Some(T::clone(&value)),
            Err(_) => {
                tracing::warn!("Cached value for {key} has an unexpected type");
                None
            }
        }
    }

    /// Returns the fresh cached value for `key`, or runs `fetch` and caches a
    /// successful result. Concurrent reads of a missing key share one fetch.
    pub async fn fetch_query<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, ClientError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if self.policy.stale_time.is_zero() {
            return fetch().await;
        }
        let value = self
            .cache
            .try_get_with(key.clone(), async {
                tracing::debug!("Cache miss for {key}");
                fetch().await.map(|value| Arc::new(value) as CachedValue)
            })
            .await
            .map_err(|e| ClientError::clone(&e))?;
        match value.downcast::<T>() {
            Ok(value) => Ok(T::clone(&value)),
            Err(_) => {
                self.cache.invalidate(&key).await;
                Err(ClientError::from(serde_json::Error::custom(format!(
                    "cached value for {key} has an unexpected type"
                ))))
            }
        }
    }

    /// Drops every cached entry whose key starts with `prefix`. Returns the
    /// number of entries removed.
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let stale: Vec<QueryKey> = self
            .cache
            .iter()
            .filter(|(key, _)| prefix.is_prefix_of(key))
            .map(|(key, _)| QueryKey::clone(&key))
            .collect();
        for key in &stale {
            self.cache.invalidate(key).await;
        }
        tracing::debug!("Invalidated {} cached queries under {prefix}", stale.len());
        stale.len()
    }

    pub async fn active_challenges(
        &self,
        session: Option<&Session>,
    ) -> Result<Vec<ChallengeSummary>, ClientError> {
        let token = session.and_then(Session::token);
        self.fetch_query(challenges::active(), || {
            self.resources.fetch_active_challenges(token)
        })
        .await
    }

    pub async fn challenge(&self, id: &str) -> Result<Challenge, ClientError> {
        let id = require_id("challenge id", id)?;
        self.fetch_query(challenges::detail(id), || self.resources.fetch_challenge(id))
            .await
    }

    pub async fn program(&self, id: &str) -> Result<Program, ClientError> {
        let id = require_id("challenge id", id)?;
        self.fetch_query(challenges::program(id), || self.resources.fetch_program(id))
            .await
    }

    pub async fn membership(
        &self,
        challenge_id: &str,
        session: &Session,
    ) -> Result<Option<Membership>, ClientError> {
        let challenge_id = require_id("challenge id", challenge_id)?;
        let token = session.bearer()?;
        self.fetch_query(challenges::membership(challenge_id), || {
            self.resources.fetch_membership(challenge_id, token)
        })
        .await
    }

    /// Check-ins of the session's user. The cohort segment comes from the
    /// user's membership, so the cache key stays per challenge and user.
    pub async fn check_ins(
        &self,
        challenge_id: &str,
        session: &Session,
    ) -> Result<Vec<CheckIn>, ClientError> {
        let challenge_id = require_id("challenge id", challenge_id)?;
        let user_id = require_id("user id", &session.user_id)?;
        let cohort_id = self
            .membership(challenge_id, session)
            .await?
            .and_then(|membership| membership.cohort_id);
        self.fetch_query(challenges::check_ins(challenge_id, user_id), || {
            self.resources
                .fetch_check_ins(challenge_id, user_id, session.token(), cohort_id)
        })
        .await
    }

    /// Joins or leaves a challenge, then invalidates that challenge's scope and
    /// the active list.
    pub async fn toggle_membership(
        &self,
        challenge_id: &str,
        session: &Session,
    ) -> Result<MembershipToggle, ClientError> {
        let challenge_id = require_id("challenge id", challenge_id)?;
        let toggle = self
            .resources
            .toggle_membership(challenge_id, session.bearer()?)
            .await?;
        self.invalidate(&challenges::detail(challenge_id)).await;
        self.invalidate(&challenges::active()).await;
        Ok(toggle)
    }

    pub async fn create_challenge(
        &self,
        draft: &ChallengeDraft,
        session: &Session,
    ) -> Result<Challenge, ClientError> {
        let created = self
            .resources
            .create_challenge(draft, session.bearer()?)
            .await?;
        self.invalidate(&challenges::all()).await;
        Ok(created)
    }

    /// Call after a check-in was submitted elsewhere so freshness is
    /// re-evaluated against server data.
    pub async fn check_in_recorded(&self, challenge_id: &str, session: &Session) {
        let challenge_id = challenge_id.trim();
        self.invalidate(&challenges::check_ins(challenge_id, session.user_id.trim()))
            .await;
        self.invalidate(&challenges::membership(challenge_id)).await;
    }
}
