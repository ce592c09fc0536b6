//! Text and JSON output for command results.

use anyhow::Result;
use clap::ValueEnum;
use haloctl_core::api::{Attachment, Environment, Journal, Post, PostDetail, format_date};
use haloctl_core::releases::Release;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn posts(posts: &[Post], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(posts),
        OutputFormat::Text => Ok(posts
            .iter()
            .map(|p| {
                format!(
                    "{}\t{}\t{}\t{}",
                    p.id,
                    format_date(p.create_time),
                    p.title,
                    p.full_path
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

pub fn post_detail(detail: &PostDetail, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(detail),
        OutputFormat::Text => Ok(format!(
            "{}\n{}\n\n{}",
            detail.post.title,
            detail.post.full_path,
            detail.original_content.as_deref().unwrap_or("")
        )),
    }
}

pub fn journals(journals: &[Journal], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(journals),
        OutputFormat::Text => Ok(journals
            .iter()
            .map(|j| {
                format!(
                    "{}\t{}\t{}\t{}",
                    j.id.map(|id| id.to_string()).unwrap_or_default(),
                    j.create_time.map(format_date).unwrap_or_default(),
                    j.kind,
                    j.source_content.replace('\n', " ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

pub fn attachments(attachments: &[Attachment], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(attachments),
        OutputFormat::Text => Ok(attachments
            .iter()
            .map(|a| {
                format!(
                    "{}\t{}\t{}\t{}\n\t{}\n\t{}",
                    a.id,
                    format_date(a.create_time),
                    a.media_type.as_deref().unwrap_or("-"),
                    a.name,
                    a.markdown_link(),
                    a.html_image()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

pub fn environment(env: &Environment, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(env),
        OutputFormat::Text => Ok(format!(
            "version: {}\ndatabase: {}\nmode: {}",
            env.version,
            env.database.as_deref().unwrap_or("-"),
            env.mode.as_deref().unwrap_or("-")
        )),
    }
}

/// Lists releases; the one matching `running` is marked with `*`.
pub fn releases(releases: &[Release], running: Option<&str>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json(releases),
        OutputFormat::Text => Ok(releases
            .iter()
            .map(|r| {
                let marker = match running {
                    Some(version) if r.is_version(version) => "*",
                    _ => " ",
                };
                format!(
                    "{} {}\t{}\t{} downloads\t{}",
                    marker,
                    r.display_name(),
                    r.created_at.format("%Y-%m-%d"),
                    r.download_count(),
                    r.html_url
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}
