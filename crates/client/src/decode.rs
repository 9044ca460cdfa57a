// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Response decoding shared by every endpoint.
//!
//! List-bearing responses wrap their payload in a named field that the server
//! may send as `null`. Callers always get an empty `Vec` in that case.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};

use crate::{
    error::ClientError,
    models::{ChallengeSummary, CheckIn},
    transport::ApiResponse,
};

/// Deserializes `null` (or a missing field, together with `#[serde(default)]`)
/// into an empty collection.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub(crate) struct ChallengesEnvelope {
    #[serde(deserialize_with = "null_as_empty")]
    pub challenges: Vec<ChallengeSummary>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct CheckInsEnvelope {
    #[serde(deserialize_with = "null_as_empty")]
    pub check_ins: Vec<CheckIn>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Turns a non-2xx response into the matching error. Returns the response
/// untouched on success.
pub(crate) fn check_status(response: ApiResponse, path: &str) -> Result<ApiResponse, ClientError> {
    match response.status {
        200..=299 => Ok(response),
        401 | 403 => Err(ClientError::Auth {
            status: response.status,
        }),
        404 => Err(ClientError::NotFound {
            path: path.to_string(),
        }),
        status => Err(ClientError::Server {
            status,
            message: server_message(&response.body),
        }),
    }
}

fn server_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
}

/// Decodes a JSON body. An empty body decodes as JSON `null`.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ClientError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(body)?)
}

pub(crate) fn decode_challenges(body: &[u8]) -> Result<Vec<ChallengeSummary>, ClientError> {
    let envelope: Option<ChallengesEnvelope> = decode_json(body)?;
    Ok(envelope.unwrap_or_default().challenges)
}

pub(crate) fn decode_check_ins(body: &[u8]) -> Result<Vec<CheckIn>, ClientError> {
    let envelope: Option<CheckInsEnvelope> = decode_json(body)?;
    Ok(envelope.unwrap_or_default().check_ins)
}
