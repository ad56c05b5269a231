use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

use crate::error::{CoreError, CoreResult};

/// Environment variable the signing secret is read from at boot.
pub const SIGNING_SECRET_ENV: &str = "UNIPAY_SIGNING_SECRET";

// ---------------------------------------------------------------------------
// SigningSecret — the process-wide HMAC key
//
// Read-only after startup. Rotating it invalidates every outstanding
// unredeemed QR token, so rotation and redemption are operationally exclusive.
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    pub const MIN_LEN: usize = 32;

    /// Validate and wrap raw secret bytes. An empty secret is treated the
    /// same as an absent one: fatal at boot.
    pub fn from_bytes(bytes: Vec<u8>) -> CoreResult<Self> {
        if bytes.is_empty() {
            return Err(CoreError::MissingSigningSecret);
        }
        if bytes.len() < Self::MIN_LEN {
            return Err(CoreError::WeakSigningSecret {
                minimum: Self::MIN_LEN,
            });
        }
        Ok(Self(Zeroizing::new(bytes)))
    }

    /// Read the secret from `UNIPAY_SIGNING_SECRET`.
    pub fn from_env() -> CoreResult<Self> {
        let raw = std::env::var(SIGNING_SECRET_ENV)
            .map_err(|_| CoreError::MissingSigningSecret)?;
        Self::from_bytes(raw.into_bytes())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret({} bytes)", self.0.len())
    }
}

// ---------------------------------------------------------------------------
// UniPayConfig — runtime knobs for the payment core
// ---------------------------------------------------------------------------

/// Configuration for the payment core.
///
/// Loaded from a TOML file. TTL knobs set to `None` mean the corresponding
/// requests never expire; expiry is expressed entirely through the request's
/// own timestamp, there is no separate flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniPayConfig {
    /// Lifetime of a student-generated QR request, in minutes.
    #[serde(default = "default_qr_ttl_minutes")]
    pub qr_ttl_minutes: Option<u64>,

    /// Lifetime of a bulk-posted request, in days.
    #[serde(default = "default_bulk_ttl_days")]
    pub bulk_ttl_days: Option<u64>,
}

fn default_qr_ttl_minutes() -> Option<u64> {
    Some(15)
}

fn default_bulk_ttl_days() -> Option<u64> {
    Some(30)
}

impl Default for UniPayConfig {
    fn default() -> Self {
        Self {
            qr_ttl_minutes: default_qr_ttl_minutes(),
            bulk_ttl_days: default_bulk_ttl_days(),
        }
    }
}

impl UniPayConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: UniPayConfig = toml::from_str(&contents)
            .map_err(|e| CoreError::Config(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.qr_ttl_minutes == Some(0) {
            return Err(CoreError::Config("qr_ttl_minutes must be > 0".into()));
        }
        if self.bulk_ttl_days == Some(0) {
            return Err(CoreError::Config("bulk_ttl_days must be > 0".into()));
        }
        Ok(())
    }

    /// QR request lifetime in seconds, `None` when QR requests never expire.
    pub fn qr_ttl_seconds(&self) -> Option<u64> {
        self.qr_ttl_minutes.map(|m| m * 60)
    }

    /// Bulk-posted request lifetime in seconds, `None` when they never expire.
    pub fn bulk_ttl_seconds(&self) -> Option<u64> {
        self.bulk_ttl_days.map(|d| d * 86_400)
    }
}
