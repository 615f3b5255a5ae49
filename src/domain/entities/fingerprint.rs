use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const FINGERPRINT_LEN: usize = 32;

/// Client attributes a fingerprint is derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEnvironment {
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub screen_resolution: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub canvas: String,
}

/// Capability that reads the client's environment. Swapped for a stub in tests.
pub trait EnvironmentProbe {
    fn probe(&self) -> ClientEnvironment;
}

/// Always reports the same environment.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe(pub ClientEnvironment);

impl EnvironmentProbe for StaticProbe {
    fn probe(&self) -> ClientEnvironment {
        self.0.clone()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProbe;

impl EnvironmentProbe for NoopProbe {
    fn probe(&self) -> ClientEnvironment {
        ClientEnvironment::default()
    }
}

/// Opaque per-session identifier for log correlation. Never used to gate a submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionFingerprint(String);

impl SessionFingerprint {
    pub fn derive(env: &ClientEnvironment) -> Self {
        // Field order of ClientEnvironment fixes the canonical form
        let canonical = serde_json::to_vec(env).unwrap_or_default();
        let digest = hex::encode(Sha256::digest(&canonical));
        SessionFingerprint(digest[..FINGERPRINT_LEN].to_string())
    }

    pub fn from_probe<P: EnvironmentProbe + ?Sized>(probe: &P) -> Self {
        SessionFingerprint::derive(&probe.probe())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
