use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Site {
    pub name: String,
    pub base_url: String,
    pub description: String,
    pub default_author: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct Paths {
    pub template_dir: PathBuf,
    pub public_dir: PathBuf,
}

#[derive(Deserialize, Clone)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

#[derive(Deserialize, Copy, Clone, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CmsKind {
    Sanity,
    File,
}

#[derive(Deserialize, Clone)]
pub struct Cms {
    pub kind: CmsKind,
    pub project_id: Option<String>,
    pub dataset: Option<String>,
    pub api_version: Option<String>,
    pub token: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub cache_ttl_secs: Option<i64>,
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Clone)]
pub struct Blog {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_excerpt_length")]
    pub excerpt_length: usize,
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: usize,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Default for Blog {
    fn default() -> Self {
        Blog {
            page_size: default_page_size(),
            excerpt_length: default_excerpt_length(),
            words_per_minute: default_words_per_minute(),
            categories: vec![],
        }
    }
}

fn default_page_size() -> usize {
    6
}

fn default_excerpt_length() -> usize {
    200
}

fn default_words_per_minute() -> usize {
    200
}

#[derive(Deserialize, Clone)]
pub struct Forms {
    pub email_relay_url: String,
    pub email_service_id: String,
    pub email_template_id: String,
    pub email_user_id: String,
    pub newsletter_url: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Clone)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Clone)]
pub struct Config {
    pub site: Site,
    pub paths: Paths,
    pub server: Server,
    pub cms: Cms,
    #[serde(default)]
    pub blog: Blog,
    pub forms: Forms,
    pub log: Option<Log>,
}

fn parse_path(path: PathBuf) -> PathBuf {
    if !path.starts_with("${exe_dir}") {
        return path;
    }

    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    match (exe_dir, path.to_str()) {
        (Some(exe_dir), Some(str_path)) => {
            PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy()))
        }
        _ => path,
    }
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        template_dir: parse_path(cfg.paths.template_dir),
        public_dir: parse_path(cfg.paths.public_dir),
    };
    cfg.cms.snapshot_path = cfg.cms.snapshot_path.map(parse_path);

    if cfg.cms.kind == CmsKind::Sanity && (cfg.cms.project_id.is_none() || cfg.cms.dataset.is_none()) {
        return Err(io::Error::new(
            ErrorKind::InvalidData, "Sanity content store needs cms.project_id and cms.dataset"));
    }
    if cfg.cms.kind == CmsKind::File && cfg.cms.snapshot_path.is_none() {
        return Err(io::Error::new(
            ErrorKind::InvalidData, "File content store needs cms.snapshot_path"));
    }

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::CONFIG_DATA;

    #[test]
    fn test_parse_config() {
        let cfg = parse_config(CONFIG_DATA).unwrap();
        assert_eq!(cfg.site.name, "Acme Studio");
        assert_eq!(cfg.cms.kind, CmsKind::File);
        assert_eq!(cfg.blog.page_size, 6);
        assert_eq!(cfg.blog.words_per_minute, 200);
        assert_eq!(cfg.blog.categories, ["Web Development", "SEO"]);
        assert!(cfg.log.is_none());
    }

    #[test]
    fn test_blog_defaults() {
        let without_blog = CONFIG_DATA.replace("[blog]\ncategories = [\"Web Development\", \"SEO\"]\n", "");
        let cfg = parse_config(&without_blog).unwrap();
        assert_eq!(cfg.blog.page_size, 6);
        assert_eq!(cfg.blog.excerpt_length, 200);
        assert!(cfg.blog.categories.is_empty());
    }

    #[test]
    fn test_sanity_needs_project() {
        let sanity = CONFIG_DATA.replace("kind = \"file\"", "kind = \"sanity\"");
        let err = parse_config(&sanity).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_exe_dir_prefix() {
        let path = parse_path(PathBuf::from("${exe_dir}/template"));
        assert!(!path.starts_with("${exe_dir}"));
        assert!(path.ends_with("template"));
    }
}
