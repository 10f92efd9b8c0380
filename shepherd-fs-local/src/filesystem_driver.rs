//! `LocalFilesystemDriver` — a reference `FilesystemDriver` over the local
//! POSIX filesystem. Addresses are plain paths.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use shepherd_core::errors::DriverError;
use shepherd_core::traits::{DataItemStub, FilesystemDriver, QueryPredicate, Stat};

const DEFAULT_MAX_CONCURRENCY: u32 = 8;

/// Stats and walks paths on the local disk. `query` requires exactly one
/// enumeration seed (`Root` or `Fofn`) among its criteria; every other
/// predicate narrows that seed's results.
pub struct LocalFilesystemDriver {
    max_concurrency: u32,
}

impl Default for LocalFilesystemDriver {
    fn default() -> Self {
        Self { max_concurrency: DEFAULT_MAX_CONCURRENCY }
    }
}

impl LocalFilesystemDriver {
    pub fn new(max_concurrency: u32) -> Self {
        Self { max_concurrency }
    }

    async fn seed(criteria: &[QueryPredicate]) -> Result<Vec<DataItemStub>, DriverError> {
        for predicate in criteria {
            match predicate {
                QueryPredicate::Root(root) => return Self::walk(root).await,
                QueryPredicate::Fofn(path) => return Self::read_fofn(path).await,
                _ => continue,
            }
        }
        Err(DriverError::UnsupportedPredicate {
            driver: "local".to_string(),
            predicate: "query requires a Root or Fofn seed".to_string(),
        })
    }

    async fn walk(root: &str) -> Result<Vec<DataItemStub>, DriverError> {
        let root = root.to_string();
        tokio::task::spawn_blocking(move || {
            let mut stubs = Vec::new();
            for entry in walkdir::WalkDir::new(&root).into_iter() {
                let entry = entry.map_err(|e| DriverError::Io { address: root.clone(), message: e.to_string() })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let size = entry.metadata().ok().map(|m| m.len());
                stubs.push(DataItemStub { address: entry.path().display().to_string(), size });
            }
            Ok(stubs)
        })
        .await
        .map_err(|e| DriverError::Io { address: root, message: e.to_string() })?
    }

    async fn read_fofn(path: &str) -> Result<Vec<DataItemStub>, DriverError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DriverError::Io { address: path.to_string(), message: e.to_string() })?;
        let mut stubs = Vec::new();
        for line in contents.lines() {
            let address = line.trim();
            if address.is_empty() {
                continue;
            }
            let size = tokio::fs::metadata(address).await.ok().map(|m| m.len());
            stubs.push(DataItemStub { address: address.to_string(), size });
        }
        Ok(stubs)
    }

    fn apply_filters(stubs: Vec<DataItemStub>, criteria: &[QueryPredicate]) -> Vec<DataItemStub> {
        stubs
            .into_iter()
            .filter(|stub| {
                criteria.iter().all(|predicate| match predicate {
                    QueryPredicate::Root(_) | QueryPredicate::Fofn(_) => true,
                    QueryPredicate::SizeGreaterThan(n) => stub.size.is_some_and(|size| size > *n),
                    QueryPredicate::SizeLessThan(n) => stub.size.is_some_and(|size| size < *n),
                    QueryPredicate::NameGlob(pattern) => glob::Pattern::new(pattern)
                        .map(|p| p.matches(&stub.address))
                        .unwrap_or(false),
                    QueryPredicate::ModifiedAfter(t) => mtime(&stub.address).is_some_and(|mtime| mtime > *t),
                    QueryPredicate::ModifiedBefore(t) => mtime(&stub.address).is_some_and(|mtime| mtime < *t),
                })
            })
            .collect()
    }
}

fn mtime(address: &str) -> Option<i64> {
    let metadata = std::fs::metadata(address).ok()?;
    let modified = metadata.modified().ok()?;
    modified.duration_since(std::time::UNIX_EPOCH).ok().map(|d| d.as_millis() as i64)
}

#[async_trait]
impl FilesystemDriver for LocalFilesystemDriver {
    async fn query(&self, criteria: &[QueryPredicate]) -> Result<Vec<DataItemStub>, DriverError> {
        let seeded = Self::seed(criteria).await?;
        Ok(Self::apply_filters(seeded, criteria))
    }

    async fn stat(&self, address: &str) -> Result<Stat, DriverError> {
        let path = Path::new(address).to_path_buf();
        tokio::task::spawn_blocking(move || stat_blocking(&path))
            .await
            .map_err(|e| DriverError::Io { address: address.to_string(), message: e.to_string() })?
    }

    fn max_concurrency_default(&self) -> u32 {
        self.max_concurrency
    }
}

#[cfg(unix)]
fn stat_blocking(path: &Path) -> Result<Stat, DriverError> {
    use std::os::unix::fs::MetadataExt;

    let metadata = std::fs::metadata(path)
        .map_err(|e| DriverError::Io { address: path.display().to_string(), message: e.to_string() })?;

    let to_ms = |secs: i64| secs * 1000;
    let mut meta = HashMap::new();
    meta.insert("uid".to_string(), metadata.uid().to_string());
    meta.insert("gid".to_string(), metadata.gid().to_string());

    Ok(Stat {
        size: Some(metadata.len()),
        mtime: Some(to_ms(metadata.mtime())),
        ctime: Some(to_ms(metadata.ctime())),
        atime: Some(to_ms(metadata.atime())),
        owner: None,
        group: None,
        metadata: meta,
    })
}

#[cfg(not(unix))]
fn stat_blocking(path: &Path) -> Result<Stat, DriverError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| DriverError::Io { address: path.display().to_string(), message: e.to_string() })?;
    Ok(Stat { size: Some(metadata.len()), ..Default::default() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn walk_root_enumerates_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"world!").unwrap();

        let driver = LocalFilesystemDriver::default();
        let stubs = driver
            .query(&[QueryPredicate::Root(dir.path().display().to_string())])
            .await
            .unwrap();
        assert_eq!(stubs.len(), 2);
    }

    #[tokio::test]
    async fn size_filter_narrows_results() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("small.txt"), b"hi").unwrap();
        std::fs::write(dir.path().join("big.txt"), vec![0u8; 1024]).unwrap();

        let driver = LocalFilesystemDriver::default();
        let stubs = driver
            .query(&[
                QueryPredicate::Root(dir.path().display().to_string()),
                QueryPredicate::SizeGreaterThan(100),
            ])
            .await
            .unwrap();
        assert_eq!(stubs.len(), 1);
        assert!(stubs[0].address.ends_with("big.txt"));
    }

    #[tokio::test]
    async fn query_without_seed_fails() {
        let driver = LocalFilesystemDriver::default();
        let err = driver.query(&[QueryPredicate::SizeGreaterThan(1)]).await.unwrap_err();
        assert!(matches!(err, DriverError::UnsupportedPredicate { .. }));
    }

    #[tokio::test]
    async fn fofn_reads_listed_addresses() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("x.bam");
        std::fs::write(&target, b"data").unwrap();

        let fofn = dir.path().join("list.fofn");
        let mut f = std::fs::File::create(&fofn).unwrap();
        writeln!(f, "{}", target.display()).unwrap();

        let driver = LocalFilesystemDriver::default();
        let stubs = driver
            .query(&[QueryPredicate::Fofn(fofn.display().to_string())])
            .await
            .unwrap();
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].size, Some(4));
    }

    #[tokio::test]
    async fn stat_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, b"12345").unwrap();

        let driver = LocalFilesystemDriver::default();
        let stat = driver.stat(&path.display().to_string()).await.unwrap();
        assert_eq!(stat.size, Some(5));
    }
}
