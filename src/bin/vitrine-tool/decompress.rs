use std::io;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

const RESOURCES: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/res.tar.gz"));

/// Unpacks the bundled templates, public files and sample posts.
pub fn decompress_files(output: &Path) -> io::Result<()> {
    let tar = GzDecoder::new(RESOURCES);
    let mut archive = Archive::new(tar);
    archive.unpack(output)?;

    Ok(())
}
