//! On-disk config directories for tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// `app.yaml` with development and production overrides.
pub const SAMPLE_APP: &str = r"default:
  log_level: INFO
  model_type: gpt-like
  features:
    enable_feature_x: false
development:
  log_level: DEBUG
  features:
    enable_feature_x: true
    debug_toolbar: true
production:
  log_level: WARNING
  features:
    enable_feature_x: true
";

/// `cloud.yaml` describing one domain.
pub const SAMPLE_CLOUD: &str = r"default:
  cloud_details:
    sample_domain:
      provider: aws
      region: us-east-1
      model: gpt-like
production:
  cloud_details:
    sample_domain:
      region: eu-west-1
";

/// `database.yaml` for the same domain.
pub const SAMPLE_DATABASE: &str = r"default:
  database:
    sample_domain:
      host: localhost
      port: 5432
      name: sample
production:
  database:
    sample_domain:
      host: db.prod.internal
";

/// `secrets.yaml`; only production carries a real key.
pub const SAMPLE_SECRETS: &str = r"default:
  cloud_secrets:
    sample_domain:
      api_key: REPLACE_ME
production:
  cloud_secrets:
    sample_domain:
      api_key: sk-prod-4f9a8b7c6d5e
";

/// A temporary config directory, removed on drop.
#[derive(Debug)]
pub struct ConfigFixture {
    dir: TempDir,
}

impl ConfigFixture {
    /// An empty directory.
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    /// The standard app/cloud/database/secrets stack for `sample_domain`.
    pub fn sample() -> Self {
        let fixture = Self::empty();
        fixture.write("app.yaml", SAMPLE_APP);
        fixture.write("cloud.yaml", SAMPLE_CLOUD);
        fixture.write("database.yaml", SAMPLE_DATABASE);
        fixture.write("secrets.yaml", SAMPLE_SECRETS);
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name`, creating parent directories.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("dir");
        }
        fs::write(&path, contents).expect("write");
        path
    }

    pub fn remove(&self, name: &str) {
        fs::remove_file(self.dir.path().join(name)).expect("remove");
    }
}
