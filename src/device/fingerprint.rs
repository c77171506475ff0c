// src/device/fingerprint.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::DeviceError;

/// Separator placed between serialized components.
const COMPONENT_SEPARATOR: &str = "###";

/// Environment attributes a fingerprint is derived from.
///
/// Field order is part of the hash input. Reordering fields changes every
/// fingerprint ever produced, so append new attributes at the end only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintComponents {
    /// Empty string when unknown.
    pub user_agent: String,

    /// BCP 47 tag such as `en-US`. Empty string when unknown.
    pub locale: String,

    /// Minutes behind UTC (UTC+7 is `-420`), same sign convention as
    /// `Date.prototype.getTimezoneOffset`.
    pub timezone_offset: i32,

    /// `0` when unknown.
    pub color_depth: u32,

    /// `0` when unknown.
    pub screen_width: u32,

    /// `0` when unknown.
    pub screen_height: u32,

    /// Logical core count, `0` when unknown (rendered empty).
    pub hardware_concurrency: u32,

    /// Approximate device memory in GiB; rendered as an empty string when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_memory: Option<f64>,
}

impl FingerprintComponents {
    /// Renders the components in hash order.
    ///
    /// Joins the values with `###` the way a browser joins its attribute
    /// array, where an unknown core count or memory size is `undefined` and
    /// renders empty. Screen and color depth are always present in a browser,
    /// so their `0` sentinels only appear in fingerprints made off-browser and
    /// never match a web client's.
    pub fn serialize(&self) -> String {
        let memory = self
            .device_memory
            .map(|m| m.to_string())
            .unwrap_or_default();
        let cores = match self.hardware_concurrency {
            0 => String::new(),
            n => n.to_string(),
        };

        [
            self.user_agent.clone(),
            self.locale.clone(),
            self.timezone_offset.to_string(),
            self.color_depth.to_string(),
            format!("{}x{}", self.screen_width, self.screen_height),
            cores,
            memory,
        ]
        .join(COMPONENT_SEPARATOR)
    }

    /// SHA-256 over the serialized components.
    pub fn fingerprint(&self) -> DeviceFingerprint {
        let mut hasher = Sha256::new();
        hasher.update(self.serialize().as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();

        DeviceFingerprint(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }
}

/// Lowercase hex SHA-256 digest identifying a device.
///
/// Not unique: two identically configured machines share a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceFingerprint(String);

impl DeviceFingerprint {
    pub const HEX_LEN: usize = 64;

    /// Wraps an existing digest, e.g. one read back from storage.
    pub fn parse(value: &str) -> Result<Self, DeviceError> {
        let is_hex = value.chars().all(|c| c.is_ascii_hexdigit());
        if value.len() != Self::HEX_LEN || !is_hex {
            return Err(DeviceError::InvalidFingerprint(value.to_string()));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the attributes describing the current device.
pub trait EnvironmentProbe: Send + Sync {
    /// Collects the current attributes. Missing values are filled with
    /// sentinels; an error means the environment cannot be inspected at all.
    fn components(&self) -> Result<FingerprintComponents, DeviceError>;
}

/// Probe returning components collected elsewhere (for example sent by a browser).
#[derive(Debug, Clone)]
pub struct StaticProbe(pub FingerprintComponents);

impl EnvironmentProbe for StaticProbe {
    fn components(&self) -> Result<FingerprintComponents, DeviceError> {
        Ok(self.0.clone())
    }
}

/// Probe reading attributes of the machine the process runs on.
///
/// A headless process has no display, so color depth and resolution are
/// always the `0` sentinels.
#[derive(Debug, Clone, Default)]
pub struct HostProbe;

impl EnvironmentProbe for HostProbe {
    fn components(&self) -> Result<FingerprintComponents, DeviceError> {
        let user_agent = format!(
            "{}/{} ({}; {})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        );

        let locale = std::env::var("LC_ALL")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| std::env::var("LANG").ok())
            .map(|raw| normalize_locale(&raw))
            .unwrap_or_default();

        let utc_offset_secs = chrono::Local::now().offset().local_minus_utc();

        let hardware_concurrency = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(0);

        Ok(FingerprintComponents {
            user_agent,
            locale,
            timezone_offset: -utc_offset_secs / 60,
            color_depth: 0,
            screen_width: 0,
            screen_height: 0,
            hardware_concurrency,
            device_memory: None,
        })
    }
}

/// Turns a POSIX locale (`en_US.UTF-8`) into a BCP 47 tag (`en-US`).
fn normalize_locale(raw: &str) -> String {
    let base = raw.split(['.', '@']).next().unwrap_or_default();
    match base {
        "C" | "POSIX" => String::new(),
        other => other.replace('_', "-"),
    }
}

/// Computes the fingerprint of whatever device `probe` describes.
pub fn generate_fingerprint(probe: &dyn EnvironmentProbe) -> Result<DeviceFingerprint, DeviceError> {
    Ok(probe.components()?.fingerprint())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> FingerprintComponents {
        FingerprintComponents {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
            locale: "en-US".to_string(),
            timezone_offset: -420,
            color_depth: 24,
            screen_width: 1920,
            screen_height: 1080,
            hardware_concurrency: 8,
            device_memory: Some(8.0),
        }
    }

    #[test]
    fn serialization_matches_browser_join() {
        assert_eq!(
            desktop().serialize(),
            "Mozilla/5.0 (X11; Linux x86_64)###en-US###-420###24###1920x1080###8###8"
        );

        let mut no_memory = desktop();
        no_memory.device_memory = None;
        assert!(no_memory.serialize().ends_with("###8###"));

        let mut half = desktop();
        half.device_memory = Some(0.5);
        assert!(half.serialize().ends_with("###0.5"));

        let mut unknown_cores = desktop();
        unknown_cores.hardware_concurrency = 0;
        unknown_cores.device_memory = None;
        assert_eq!(
            unknown_cores.serialize(),
            "Mozilla/5.0 (X11; Linux x86_64)###en-US###-420###24###1920x1080######"
        );
    }

    #[test]
    fn fingerprint_is_sha256_hex() {
        assert_eq!(
            desktop().fingerprint().as_str(),
            "3758d22a62c9ccd46b3a8e5c16c00ba5507d9bc0ae24f6e162f85a48ad6cf07a"
        );

        let mut no_memory = desktop();
        no_memory.device_memory = None;
        assert_eq!(
            no_memory.fingerprint().as_str(),
            "e3740e4dc3fe6cf5f87b2b4af15ee4af195adeed6d5169bec733fa7661900f44"
        );
    }

    #[test]
    fn same_inputs_same_fingerprint() {
        let probe = StaticProbe(desktop());
        let a = generate_fingerprint(&probe).unwrap();
        let b = generate_fingerprint(&probe).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), DeviceFingerprint::HEX_LEN);
    }

    #[test]
    fn any_single_attribute_change_alters_fingerprint() {
        let base = desktop().fingerprint();

        let variants: Vec<Box<dyn Fn(&mut FingerprintComponents)>> = vec![
            Box::new(|c| c.user_agent.push('!')),
            Box::new(|c| c.locale = "th-TH".to_string()),
            Box::new(|c| c.timezone_offset = 0),
            Box::new(|c| c.color_depth = 30),
            Box::new(|c| c.screen_width = 2560),
            Box::new(|c| c.screen_height = 1440),
            Box::new(|c| c.hardware_concurrency = 4),
            Box::new(|c| c.device_memory = Some(4.0)),
            Box::new(|c| c.device_memory = None),
        ];

        for mutate in variants {
            let mut changed = desktop();
            mutate(&mut changed);
            assert_ne!(changed.fingerprint(), base, "{:?}", changed);
        }
    }

    #[test]
    fn parse_accepts_digest_and_rejects_garbage() {
        let fp = desktop().fingerprint();
        assert_eq!(DeviceFingerprint::parse(&fp.as_str().to_uppercase()).unwrap(), fp);
        assert!(DeviceFingerprint::parse("abcd").is_err());
        assert!(DeviceFingerprint::parse(&"z".repeat(64)).is_err());
    }

    #[test]
    fn host_probe_is_stable() {
        let a = generate_fingerprint(&HostProbe).unwrap();
        let b = generate_fingerprint(&HostProbe).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn locale_normalization() {
        assert_eq!(normalize_locale("en_US.UTF-8"), "en-US");
        assert_eq!(normalize_locale("th_TH@calendar=buddhist"), "th-TH");
        assert_eq!(normalize_locale("C"), "");
    }
}
