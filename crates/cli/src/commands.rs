// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use trybe_client::{
    CheckInPromptController, ClientError, PromptGuard, PromptPresenter, PromptState, QueryClient,
    Session,
    links::youtube_video_id,
    models::{ChallengeDraft, ImageUpload, Membership},
    schedule::{next_reminder, program_day},
};

struct TerminalPresenter {
    challenge_title: String,
}

impl PromptPresenter for TerminalPresenter {
    fn present_check_in_prompt(&self, _membership: &Membership) {
        println!(
            "You have not checked in to \"{}\" today. Time to check in!",
            self.challenge_title
        );
    }
}

/// Logs the full error and turns it into the message shown to the user.
fn report(error: ClientError) -> anyhow::Error {
    tracing::debug!("Request failed: {error:?}");
    anyhow::anyhow!(error.user_message())
}

fn require_session(session: Option<&Session>) -> anyhow::Result<&Session> {
    session.ok_or_else(|| report(ClientError::Unauthenticated))
}

fn content_type_for(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

pub async fn list_active(client: &QueryClient, session: Option<&Session>) -> anyhow::Result<()> {
    let challenges = client.active_challenges(session).await.map_err(report)?;
    if challenges.is_empty() {
        println!("No active challenges right now.");
    }
    for challenge in challenges {
        println!(
            "{:>6}  {} ({} members)",
            challenge.id, challenge.title, challenge.member_count
        );
    }
    Ok(())
}

pub async fn show(client: &QueryClient, id: &str) -> anyhow::Result<()> {
    let challenge = client.challenge(id).await.map_err(report)?;
    let program = client.program(id).await.map_err(report)?;
    println!("{}\n\n{}", challenge.title, challenge.description);
    if let Some(video_id) = youtube_video_id(&challenge.description) {
        println!("\nVideo: {}", trybe_client::links::youtube_embed_url(&video_id));
    }
    if !program.days.is_empty() {
        println!("\nProgram:");
        for day in &program.days {
            println!("  Day {}: {}", day.day_number, day.title);
        }
    }
    Ok(())
}

pub async fn toggle(
    client: &QueryClient,
    id: &str,
    session: Option<&Session>,
) -> anyhow::Result<()> {
    let session = require_session(session)?;
    let toggle = client.toggle_membership(id, session).await.map_err(report)?;
    if toggle.joined {
        println!("Joined challenge {id}.");
    } else {
        println!("Left challenge {id}.");
    }
    Ok(())
}

pub async fn build_draft(
    title: String,
    description: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    frequency: Option<String>,
    self_paced: bool,
    image: Option<PathBuf>,
) -> anyhow::Result<ChallengeDraft> {
    let image = match image {
        Some(path) => Some(ImageUpload {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "image".to_string()),
            content_type: content_type_for(&path).to_string(),
            bytes: tokio::fs::read(&path).await?,
        }),
        None => None,
    };
    Ok(ChallengeDraft {
        title,
        description,
        start_date,
        end_date,
        frequency,
        self_paced,
        image,
    })
}

pub async fn create(
    client: &QueryClient,
    draft: &ChallengeDraft,
    session: Option<&Session>,
) -> anyhow::Result<()> {
    let session = require_session(session)?;
    let created = client.create_challenge(draft, session).await.map_err(report)?;
    println!("Created challenge {} ({}).", created.title, created.id);
    Ok(())
}

pub async fn status(
    client: &QueryClient,
    id: &str,
    session: Option<&Session>,
) -> anyhow::Result<()> {
    let session = require_session(session)?;
    let challenge = client.challenge(id).await.map_err(report)?;
    let mut controller = CheckInPromptController::new(
        TerminalPresenter {
            challenge_title: challenge.title.clone(),
        },
        PromptGuard::PerMount,
    );

    let membership = client.membership(id, session).await.map_err(report)?;
    controller.membership_changed(membership.clone());
    let Some(membership) = membership else {
        println!("You are not a member of \"{}\".", challenge.title);
        return Ok(());
    };

    let now = Local::now();
    if let Some(day) = program_day(&membership, &now) {
        println!("Day {day} of \"{}\".", challenge.title);
    }
    match next_reminder(&membership, &now) {
        Ok(Some(at)) => println!("Next reminder: {}", at.format("%Y-%m-%d %H:%M")),
        Ok(None) => {}
        Err(e) => tracing::warn!("Ignoring reminder settings: {e}"),
    }

    if !controller.wants_check_ins() {
        return Ok(());
    }
    match client.check_ins(id, session).await {
        Ok(check_ins) => {
            if controller.check_ins_loaded(&check_ins, &now).await == PromptState::Suppressed {
                println!("Already checked in today.");
            }
        }
        Err(e) => {
            controller.check_ins_failed(&e);
            return Err(report(e));
        }
    }
    Ok(())
}
