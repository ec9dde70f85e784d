//! Shared fixtures: a scratch deploy-folder builder, a standalone zip
//! reader used to check encoder output from the outside, and a mock
//! Azure backend that stands in for ARM, blob storage, and Entra.

use std::io::Read;
use std::path::Path;

use flate2::read::DeflateDecoder;
use httpmock::MockServer;
use tempfile::TempDir;

use siteship::config::Config;

// =============================================================================
// Deploy folder builder
// =============================================================================

pub struct DeployFolder {
    dir: TempDir,
}

impl DeployFolder {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Write a file under the folder, creating parent directories.
    pub fn file(self, rel: &str, content: &[u8]) -> Self {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, content).expect("write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

// =============================================================================
// Standalone zip reader
// =============================================================================
//
// Deliberately independent of the production encoder: it locates the end of
// central directory record from the back of the buffer and trusts only
// offsets found in the file itself.

const LOCAL_SIG: u32 = 0x0403_4B50;
const CENTRAL_SIG: u32 = 0x0201_4B50;
const EOCD_SIG: u32 = 0x0605_4B50;

pub struct ZipEntry {
    pub name: String,
    pub method: u16,
    pub crc: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub local_offset: u32,
    /// Raw bytes of the compressed stream, pulled from the local section.
    pub data: Vec<u8>,
}

pub struct ParsedZip {
    pub entries: Vec<ZipEntry>,
    pub eocd_total: u16,
}

pub fn u16_at(bytes: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([bytes[pos], bytes[pos + 1]])
}

pub fn u32_at(bytes: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}

pub fn parse_zip(bytes: &[u8]) -> ParsedZip {
    assert!(bytes.len() >= 22, "too short to hold an end record");
    let eocd_pos = (0..=bytes.len() - 22)
        .rev()
        .find(|&i| u32_at(bytes, i) == EOCD_SIG)
        .expect("end of central directory record");

    let eocd_total = u16_at(bytes, eocd_pos + 10);
    let cd_size = u32_at(bytes, eocd_pos + 12) as usize;
    let cd_offset = u32_at(bytes, eocd_pos + 16) as usize;
    assert_eq!(
        cd_offset + cd_size,
        eocd_pos,
        "central directory must end where the end record starts"
    );

    let mut entries = Vec::new();
    let mut pos = cd_offset;
    for _ in 0..eocd_total {
        assert_eq!(u32_at(bytes, pos), CENTRAL_SIG, "central header signature");
        let method = u16_at(bytes, pos + 10);
        let crc = u32_at(bytes, pos + 16);
        let compressed_size = u32_at(bytes, pos + 20);
        let uncompressed_size = u32_at(bytes, pos + 24);
        let name_len = u16_at(bytes, pos + 28) as usize;
        let extra_len = u16_at(bytes, pos + 30) as usize;
        let comment_len = u16_at(bytes, pos + 32) as usize;
        let local_offset = u32_at(bytes, pos + 42) as usize;
        let name = std::str::from_utf8(&bytes[pos + 46..pos + 46 + name_len])
            .expect("utf-8 entry name")
            .to_string();

        assert_eq!(
            u32_at(bytes, local_offset),
            LOCAL_SIG,
            "central offset must land on a local header"
        );
        let local_name_len = u16_at(bytes, local_offset + 26) as usize;
        let local_extra_len = u16_at(bytes, local_offset + 28) as usize;
        let data_start = local_offset + 30 + local_name_len + local_extra_len;
        let data = bytes[data_start..data_start + compressed_size as usize].to_vec();

        entries.push(ZipEntry {
            name,
            method,
            crc,
            compressed_size,
            uncompressed_size,
            local_offset: u32::try_from(local_offset).expect("offset fits in u32"),
            data,
        });
        pos += 46 + name_len + extra_len + comment_len;
    }

    ParsedZip {
        entries,
        eocd_total,
    }
}

/// Decompress one entry's raw deflate stream. Empty entries come back
/// empty without touching the decoder.
pub fn inflate(entry: &ZipEntry) -> Vec<u8> {
    if entry.data.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    DeflateDecoder::new(&entry.data[..])
        .read_to_end(&mut out)
        .expect("valid raw deflate stream");
    out
}

pub fn crc_of(bytes: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(bytes);
    crc.amount()
}

// =============================================================================
// Mock Azure backend
// =============================================================================

pub const TENANT_ID: &str = "11111111-2222-3333-4444-555555555555";
pub const SUBSCRIPTION_ID: &str = "sub-123";
pub const RESOURCE_GROUP: &str = "rg-test";

/// Base64 of "secret-signing-key".
pub const DELEGATION_KEY_B64: &str = "c2VjcmV0LXNpZ25pbmcta2V5";

pub struct AzureFixture {
    pub server: MockServer,
    pub config: Config,
}

impl AzureFixture {
    pub fn new() -> Self {
        let server = MockServer::start();
        let mut config = Config::default();
        config.azure.tenant_id = TENANT_ID.to_string();
        config.azure.client_id = "client-abc".to_string();
        config.azure.subscription_id = SUBSCRIPTION_ID.to_string();
        config.azure.resource_group = RESOURCE_GROUP.to_string();
        config.azure.arm_endpoint = server.base_url();
        config.azure.entra_endpoint = server.base_url();
        config.storage.account = "teststore".to_string();
        config.storage.endpoint = Some(server.base_url());
        Self { server, config }
    }

    pub fn site_path(&self, slug: &str) -> String {
        format!(
            "/subscriptions/{SUBSCRIPTION_ID}/resourceGroups/{RESOURCE_GROUP}/providers/Microsoft.Web/staticSites/{slug}"
        )
    }

    /// ARM representation of a static site resource.
    pub fn site_body(&self, slug: &str, name: &str, description: &str) -> serde_json::Value {
        serde_json::json!({
            "id": self.site_path(slug),
            "name": slug,
            "location": "westeurope",
            "properties": { "defaultHostname": format!("{slug}.azurestaticapps.net") },
            "tags": { "appName": name, "appDescription": description },
        })
    }

    pub fn delegation_key_xml(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <UserDelegationKey>\
             <SignedOid>oid-123</SignedOid>\
             <SignedTid>{TENANT_ID}</SignedTid>\
             <SignedStart>2026-01-01T00:00:00Z</SignedStart>\
             <SignedExpiry>2026-01-02T00:00:00Z</SignedExpiry>\
             <SignedService>b</SignedService>\
             <SignedVersion>2024-11-04</SignedVersion>\
             <Value>{DELEGATION_KEY_B64}</Value>\
             </UserDelegationKey>"
        )
    }
}
