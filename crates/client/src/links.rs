// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use reqwest::Url;

const VIDEO_ID_LEN: usize = 11;

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn video_id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let candidate = match host {
        "youtu.be" => segments.next()?.to_string(),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => match segments.next()? {
            "watch" => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())?,
            "shorts" | "embed" | "live" => segments.next()?.to_string(),
            _ => return None,
        },
        _ => return None,
    };
    is_video_id(&candidate).then_some(candidate)
}

/// Id of the first YouTube video linked anywhere in `text`.
pub fn youtube_video_id(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| "<>()[]\"'.,;!".contains(c)))
        .filter(|word| word.contains("youtu"))
        .find_map(|word| {
            let url = if word.starts_with("http://") || word.starts_with("https://") {
                Url::parse(word)
            } else {
                Url::parse(&format!("https://{word}"))
            };
            url.ok().as_ref().and_then(video_id_from_url)
        })
}

pub fn youtube_embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}")
}

pub fn youtube_thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg")
}
