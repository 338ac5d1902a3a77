use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use uuid::Uuid;

use vitrine::content::Post;

use crate::PostArgs;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

fn get_author(args: &PostArgs) -> String {
    if let Some(ref name) = args.name {
        return name.clone();
    }

    let name = whoami::realname();
    if name.is_empty() {
        return whoami::username();
    }
    name
}

fn slug_from_title(title: &str) -> String {
    let ascii = unidecode::unidecode(title).to_lowercase();
    NON_SLUG_CHARS.replace_all(&ascii, "-").trim_matches('-').to_string()
}

fn render_post(id: &str, title: &str, author: &str, categories: &[&str], date: &DateTime<Utc>) -> Value {
    let categories: Vec<Value> = categories.iter()
        .map(|title| json!({ "title": title }))
        .collect();

    json!({
        "_id": id,
        "_updatedAt": date.to_rfc3339_opts(SecondsFormat::Secs, true),
        "title": title,
        "slug": { "current": slug_from_title(title) },
        "publishedAt": date.to_rfc3339_opts(SecondsFormat::Secs, true),
        "excerpt": "Replace with a short summary of the post",
        "author": { "name": author },
        "categories": categories,
        "body": [
            {
                "_type": "block",
                "style": "normal",
                "markDefs": [],
                "children": [
                    { "_type": "span", "text": "This is a body example. Please remove it and replace with your content.", "marks": [] }
                ]
            }
        ]
    })
}

fn append_to_snapshot(snapshot: &Path, post: Value) -> Result<()> {
    let raw = fs::read_to_string(snapshot)
        .with_context(|| format!("Error reading snapshot {}", snapshot.display()))?;
    let mut posts: Vec<Value> = serde_json::from_str(&raw)
        .with_context(|| format!("Snapshot {} is not a JSON array of posts", snapshot.display()))?;

    let slug = post.pointer("/slug/current").and_then(Value::as_str).unwrap_or_default();
    let slug_taken = posts.iter()
        .filter_map(|p| serde_json::from_value::<Post>(p.clone()).ok())
        .any(|p| p.slug == slug);
    if slug_taken {
        bail!("A post with slug {} already exists in {}", slug, snapshot.display());
    }

    posts.push(post);
    fs::write(snapshot, serde_json::to_string_pretty(&posts)?)?;
    Ok(())
}

pub fn post_cmd(args: PostArgs) -> Result<()> {
    let id = Uuid::new_v4().to_string();
    let author = get_author(&args);
    let categories: Vec<&str> = args.categories.as_deref()
        .map(|c| c.split(',').map(str::trim).filter(|c| !c.is_empty()).collect())
        .unwrap_or_default();

    let post = render_post(&id, &args.title, &author, &categories, &Utc::now());

    match args.snapshot {
        None => println!("{}", serde_json::to_string_pretty(&post)?),
        Some(ref snapshot) => {
            append_to_snapshot(snapshot, post)?;
            println!("Post {} added to {}", id, snapshot.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::TimeZone;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_slug_from_title() {
        assert_eq!(slug_from_title("Post title of mine Ábaco - dir2"), "post-title-of-mine-abaco-dir2");
        assert_eq!(slug_from_title("  SEO & You!  "), "seo-you");
    }

    #[test]
    fn test_render_post_is_readable() {
        let date = Utc.with_ymd_and_hms(2024, 2, 27, 6, 20, 53).unwrap();
        let value = render_post("bcfc427f", "This is a title", "Ada", &["SEO"], &date);
        let post: Post = serde_json::from_value(value).unwrap();

        assert_eq!(post.slug, "this-is-a-title");
        assert_eq!(post.published_at, Some(date));
        assert_eq!(post.author.as_ref().map(|a| a.name.as_str()), Some("Ada"));
        assert!(post.has_category("SEO"));
        assert_eq!(post.body.len(), 1);
    }

    #[test]
    fn test_append_to_snapshot() {
        let mut snapshot = NamedTempFile::new().unwrap();
        snapshot.write_all(b"[]").unwrap();
        let date = Utc.with_ymd_and_hms(2024, 2, 27, 6, 20, 53).unwrap();

        append_to_snapshot(snapshot.path(), render_post("1", "First", "Ada", &[], &date)).unwrap();
        let again = append_to_snapshot(snapshot.path(), render_post("2", "First", "Ada", &[], &date));
        assert!(again.is_err());

        let posts: Vec<Post> = serde_json::from_str(&fs::read_to_string(snapshot.path()).unwrap()).unwrap();
        assert_eq!(posts.len(), 1);
    }
}
