//! Region registry: resolves logical names to region instances.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Result, StoreError};

use super::{MemRegion, MmapRegion, Region, RegionKind};

const MANIFEST_FILE: &str = "regions.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    regions: BTreeMap<String, RegionKind>,
}

/// Hands out [`Region`] instances by logical name under one root
/// directory.
///
/// Each name resolves to at most one instance per directory: a second
/// [`RegionDirectory::find`] for the same name is refused. The chosen
/// backing kind per name is recorded in a manifest so a later process
/// re-creates the region with the same backing regardless of the
/// directory's default kind.
pub struct RegionDirectory {
    root: PathBuf,
    default_kind: RegionKind,
    scheme: BTreeMap<String, RegionKind>,
    live: HashSet<String>,
}

impl RegionDirectory {
    /// Opens (creating if needed) a directory rooted at `root`, reading
    /// the persisted backing scheme when one exists.
    pub fn open(root: impl Into<PathBuf>, default_kind: RegionKind) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let manifest_path = root.join(MANIFEST_FILE);
        let scheme = if manifest_path.exists() {
            let text = fs::read_to_string(&manifest_path)?;
            let manifest: Manifest = toml::from_str(&text)
                .map_err(|_| StoreError::Corruption("unreadable region manifest"))?;
            manifest.regions
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            root,
            default_kind,
            scheme,
            live: HashSet::new(),
        })
    }

    /// The backing kind used for names the manifest does not mention.
    pub fn default_kind(&self) -> RegionKind {
        self.default_kind
    }

    /// Resolves `name` to a region, creating the instance with the
    /// manifest-recorded backing kind or the directory default.
    ///
    /// The returned region is unattached; the caller decides between
    /// [`Region::create_new`] and [`Region::load_existing`].
    pub fn find(&mut self, name: &str) -> Result<Box<dyn Region>> {
        validate_name(name)?;
        if !self.live.insert(name.to_owned()) {
            return Err(StoreError::Invalid("region name already handed out"));
        }
        let kind = *self.scheme.entry(name.to_owned()).or_insert(self.default_kind);
        debug!(name, ?kind, "resolved region");
        let region: Box<dyn Region> = match kind {
            RegionKind::InMemory => Box::new(MemRegion::new(name)),
            RegionKind::MemoryMapped => Box::new(MmapRegion::new(name, self.root.join(name))),
        };
        Ok(region)
    }

    /// Persists the name-to-backing scheme to the manifest file.
    pub fn flush(&self) -> Result<()> {
        let manifest = Manifest {
            regions: self.scheme.clone(),
        };
        let text = toml::to_string_pretty(&manifest)
            .map_err(|_| StoreError::Invalid("unencodable region manifest"))?;
        fs::write(self.root.join(MANIFEST_FILE), text)?;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name != MANIFEST_FILE
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !name.starts_with('.');
    if !ok {
        return Err(StoreError::Invalid("invalid region name"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn one_instance_per_name() {
        let dir = tempdir().unwrap();
        let mut registry = RegionDirectory::open(dir.path(), RegionKind::InMemory).unwrap();
        registry.find("attrs").unwrap();
        assert!(matches!(
            registry.find("attrs"),
            Err(StoreError::Invalid("region name already handed out"))
        ));
        registry.find("other").unwrap();
    }

    #[test]
    fn rejects_hostile_names() {
        let dir = tempdir().unwrap();
        let mut registry = RegionDirectory::open(dir.path(), RegionKind::InMemory).unwrap();
        assert!(registry.find("").is_err());
        assert!(registry.find("../escape").is_err());
        assert!(registry.find("a/b").is_err());
        assert!(registry.find(".hidden").is_err());
        assert!(registry.find("regions.toml").is_err());
    }

    #[test]
    fn scheme_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let mut registry =
                RegionDirectory::open(dir.path(), RegionKind::MemoryMapped).unwrap();
            let region = registry.find("attrs").unwrap();
            assert_eq!(region.kind(), RegionKind::MemoryMapped);
            registry.flush().unwrap();
        }
        // different default, same recorded backing
        let mut registry = RegionDirectory::open(dir.path(), RegionKind::InMemory).unwrap();
        let region = registry.find("attrs").unwrap();
        assert_eq!(region.kind(), RegionKind::MemoryMapped);
        let fresh = registry.find("new").unwrap();
        assert_eq!(fresh.kind(), RegionKind::InMemory);
    }
}
