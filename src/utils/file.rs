use log::debug;
use std::io;
use std::path::Path;
use std::time::Instant;

/// Reads a sysfs text attribute and splits it into lines without their terminators.
/// The file handle is closed before this returns, on success and on error.
pub async fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let start = Instant::now();
    let contents = tokio::fs::read_to_string(path).await?;
    let lines = contents.lines().map(|l| l.to_string()).collect();
    debug!("read_lines({}) took: {} ms", path.display(), start.elapsed().as_millis());
    Ok(lines)
}
