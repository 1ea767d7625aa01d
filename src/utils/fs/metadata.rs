//! File content digests.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Calculates the SHA-256 checksum of a file's contents as lowercase hex.
///
/// # Examples
///
/// ```rust,no_run
/// use pspack::utils::fs::calculate_checksum;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let checksum = calculate_checksum(Path::new("Main.ps1"))?;
/// assert_eq!(checksum.len(), 64);
/// # Ok(())
/// # }
/// ```
pub fn calculate_checksum(path: &Path) -> Result<String> {
    let content = fs::read(path)
        .with_context(|| format!("Failed to read file for checksum: {}", path.display()))?;

    Ok(checksum_bytes(&content))
}

/// SHA-256 of an in-memory buffer as lowercase hex.
#[must_use]
pub fn checksum_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            checksum_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_file_checksum_matches_buffer() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.ps1");
        fs::write(&file, "Write-Host 'hi'").unwrap();

        assert_eq!(calculate_checksum(&file).unwrap(), checksum_bytes(b"Write-Host 'hi'"));
        assert!(calculate_checksum(&temp.path().join("missing.ps1")).is_err());
    }
}
