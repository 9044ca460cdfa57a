// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use crate::{
    config::ClientConfig,
    decode::{check_status, decode_challenges, decode_check_ins, decode_json},
    error::{ClientError, ValidationError},
    models::{Challenge, ChallengeDraft, ChallengeSummary, CheckIn, Membership, MembershipToggle, Program},
    transport::{ApiRequest, ApiResponse, FormField, HttpTransport, Transport},
};

/// Authenticated access to the Trybe API. Performs no retries; every failure
/// is returned to the caller as-is.
#[derive(Clone)]
pub struct ResourceClient {
    transport: Arc<dyn Transport>,
}

pub(crate) fn require_id<'a>(
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if value
        .chars()
        .any(|c| c == '/' || c == '?' || c == '#' || c.is_whitespace())
    {
        return Err(ValidationError::InvalidIdentifier(field));
    }
    Ok(value)
}

fn require_token(token: &str) -> Result<&str, ClientError> {
    if token.trim().is_empty() {
        return Err(ClientError::Unauthenticated);
    }
    Ok(token)
}

impl ResourceClient {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let transport = HttpTransport::new(config.host.base_url(), config.timeout)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn host(&self) -> &str {
        self.transport.host()
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let path = request.path.clone();
        tracing::debug!(
            method = %request.method,
            path = %path,
            authenticated = request.bearer.is_some(),
            "Sending API request"
        );
        let response = self.transport.execute(request).await.map_err(|e| {
            tracing::warn!("Request to {path} failed without a response: {e}");
            ClientError::Network {
                host: self.host().to_string(),
                message: e.to_string(),
            }
        })?;
        check_status(response, &path).inspect_err(|e| {
            tracing::warn!("Request to {path} failed: {e}");
        })
    }

    /// Lists challenges that are currently running. The token is optional;
    /// without it no `Authorization` header is sent.
    pub async fn fetch_active_challenges(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<ChallengeSummary>, ClientError> {
        let token = token.filter(|t| !t.trim().is_empty());
        let response = self
            .send(ApiRequest::get("/api/challenges/active").bearer(token))
            .await?;
        decode_challenges(&response.body)
    }

    pub async fn fetch_challenge(&self, id: &str) -> Result<Challenge, ClientError> {
        let id = require_id("challenge id", id)?;
        let response = self
            .send(ApiRequest::get(format!("/api/challenges/v/{id}")))
            .await?;
        decode_json(&response.body)
    }

    pub async fn fetch_program(&self, id: &str) -> Result<Program, ClientError> {
        let id = require_id("challenge id", id)?;
        let response = self
            .send(ApiRequest::get(format!("/api/challenges/v/{id}/program")))
            .await?;
        let program: Option<Program> = decode_json(&response.body)?;
        Ok(program.unwrap_or_default())
    }

    /// The caller's membership in a challenge, or `None` when they have not
    /// joined it.
    pub async fn fetch_membership(
        &self,
        challenge_id: &str,
        token: &str,
    ) -> Result<Option<Membership>, ClientError> {
        let challenge_id = require_id("challenge id", challenge_id)?;
        let token = require_token(token)?;
        let request = ApiRequest::get(format!("/api/challenges/v/{challenge_id}/membership"))
            .bearer(Some(token));
        match self.send(request).await {
            Ok(response) => decode_json(&response.body),
            Err(ClientError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Joins the challenge when the caller is not a member, leaves it otherwise.
    pub async fn toggle_membership(
        &self,
        challenge_id: &str,
        token: &str,
    ) -> Result<MembershipToggle, ClientError> {
        let challenge_id = require_id("challenge id", challenge_id)?;
        let token = require_token(token)?;
        let response = self
            .send(
                ApiRequest::post(format!("/api/challenges/join-unjoin/{challenge_id}"))
                    .bearer(Some(token)),
            )
            .await?;
        let toggle: Option<MembershipToggle> = decode_json(&response.body)?;
        Ok(toggle.unwrap_or_default())
    }

    /// Check-ins of one user in a challenge, narrowed to a cohort when given.
    ///
    /// A real credential is required. Without one this fails with
    /// [`ClientError::Unauthenticated`] before anything is sent.
    pub async fn fetch_check_ins(
        &self,
        challenge_id: &str,
        user_id: &str,
        token: Option<&str>,
        cohort_id: Option<i64>,
    ) -> Result<Vec<CheckIn>, ClientError> {
        let challenge_id = require_id("challenge id", challenge_id)?;
        let user_id = require_id("user id", user_id)?;
        let token = require_token(token.unwrap_or_default())?;
        let path = match cohort_id {
            Some(cohort_id) => format!("/api/checkins/{challenge_id}/{user_id}/{cohort_id}"),
            None => format!("/api/checkins/{challenge_id}/{user_id}"),
        };
        let response = self.send(ApiRequest::get(path).bearer(Some(token))).await?;
        decode_check_ins(&response.body)
    }

    pub async fn create_challenge(
        &self,
        draft: &ChallengeDraft,
        token: &str,
    ) -> Result<Challenge, ClientError> {
        draft.validate()?;
        let token = require_token(token)?;
        let request = ApiRequest::post("/api/challenges")
            .bearer(Some(token))
            .multipart(draft_fields(draft));
        let response = self.send(request).await?;
        decode_json(&response.body)
    }
}

fn draft_fields(draft: &ChallengeDraft) -> Vec<FormField> {
    let text = |name: &str, value: String| FormField::Text {
        name: name.to_string(),
        value,
    };
    let mut fields = vec![
        text("title", draft.title.trim().to_string()),
        text("description", draft.description.trim().to_string()),
        text("selfPaced", draft.self_paced.to_string()),
    ];
    if let Some(start) = draft.start_date {
        fields.push(text("startDate", start.format("%Y-%m-%d").to_string()));
    }
    if let Some(end) = draft.end_date {
        fields.push(text("endDate", end.format("%Y-%m-%d").to_string()));
    }
    if let Some(frequency) = &draft.frequency {
        fields.push(text("frequency", frequency.clone()));
    }
    if let Some(image) = &draft.image {
        fields.push(FormField::File {
            name: "image".to_string(),
            file_name: image.file_name.clone(),
            content_type: image.content_type.clone(),
            bytes: image.bytes.clone(),
        });
    }
    fields
}
