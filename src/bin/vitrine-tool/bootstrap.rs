use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::decompress::decompress_files;
use crate::BootstrapArgs;

const SAMPLE_CFG: &str = include_str!("../../../vitrine.toml");

lazy_static! {
    static ref RES_PATH: Regex = Regex::new(r#""res/([\w./-]+)""#).unwrap();
}

fn write_vitrine_cfg(out_dir: &Path) -> Result<()> {
    let file = File::create(out_dir.join("vitrine.toml"))?;
    let mut writer = BufWriter::new(file);

    let sample_cfg = replace_paths(out_dir, SAMPLE_CFG);
    writer.write_all(sample_cfg.as_bytes())?;
    writer.flush()?;
    Ok(())
}

// Points every `res/...` path of the sample configuration to the unpacked copy.
fn replace_paths(prefix: &Path, config_data: &str) -> String {
    let prefix = prefix.to_string_lossy();
    let prefix = prefix.trim_end_matches('/');

    RES_PATH.replace_all(config_data, |captures: &Captures| {
        format!("\"{}/{}\"", prefix, &captures[1])
    }).to_string()
}

pub fn bootstrap_cmd(args: BootstrapArgs) -> Result<()> {
    let out_path = fs::canonicalize(&args.out_dir)
        .with_context(|| format!("Error converting path to absolute: {}", &args.out_dir))?;

    if !out_path.is_dir() {
        bail!("Output path must be a directory: {}", out_path.display());
    }

    decompress_files(&out_path).context("Error bootstrapping")?;
    write_vitrine_cfg(&out_path).context("Error writing Vitrine configuration")?;

    println!("Site bootstrapped in {}", out_path.display());
    println!("Run: vitrine --config-path {}", out_path.join("vitrine.toml").display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use vitrine::config::parse_config;

    use super::*;

    #[test]
    fn test_sample_cfg() {
        let res = replace_paths(&PathBuf::from("/abs/path/"), SAMPLE_CFG);
        assert!(res.contains(r##"template_dir = "/abs/path/template""##));
        assert!(res.contains(r##"public_dir = "/abs/path/public""##));
        assert!(res.contains(r##"snapshot_path = "/abs/path/content/posts.json""##));
        assert!(!res.contains("\"res/"));
    }

    #[test]
    fn test_sample_cfg_is_valid() {
        let cfg = parse_config(SAMPLE_CFG).unwrap();
        assert_eq!(cfg.blog.page_size, 6);
    }
}
