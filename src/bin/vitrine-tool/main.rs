use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::bootstrap::bootstrap_cmd;
use crate::post::post_cmd;

mod bootstrap;
mod decompress;
mod post;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
enum Args {
    /// Creates a post entry for a file content store
    Post(PostArgs),
    /// Bootstrap a new site
    Bootstrap(BootstrapArgs),
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct PostArgs {
    /// Name of the author. If empty, OS user real name is being used
    #[arg(short, long)]
    name: Option<String>,

    /// Title of the post
    #[arg(short, long)]
    title: String,

    /// Comma separated category titles
    #[arg(short, long)]
    categories: Option<String>,

    /// Snapshot file to append the post to. Prints to stdout when absent
    #[arg(short, long)]
    snapshot: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct BootstrapArgs {
    /// Directory where the new site will be generated
    #[arg(short, long)]
    out_dir: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args {
        Args::Post(args) => post_cmd(args),
        Args::Bootstrap(args) => bootstrap_cmd(args),
    }
}
