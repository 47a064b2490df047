//! Fingerprint feature extraction from nmap host script output.

use iotvas_core::DeviceFeatures;

use crate::nmap_xml::{NmapHost, NmapRun, Script, ScriptElem};

/// Id of the NSE script that emits the feature table.
pub const FEATURES_SCRIPT_ID: &str = "iotvas-features";

/// A scanned host with the features collected for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFeatures {
    pub address: String,
    pub features: DeviceFeatures,
}

/// Collect features for every host that has an IPv4 address and ran the
/// features script. Other hosts are skipped.
pub fn extract_host_features(nmap_run: &NmapRun) -> Vec<HostFeatures> {
    nmap_run
        .hosts
        .iter()
        .filter_map(host_features)
        .collect()
}

fn host_features(host: &NmapHost) -> Option<HostFeatures> {
    let Some(address) = host.ipv4() else {
        tracing::debug!("Skipping host without IPv4 address");
        return None;
    };
    let Some(script) = host.script(FEATURES_SCRIPT_ID) else {
        tracing::debug!(address = %address, "No {FEATURES_SCRIPT_ID} output for host");
        return None;
    };

    Some(HostFeatures {
        address: address.to_string(),
        features: features_from_script(script),
    })
}

/// Read the script's first table, or its top-level elements when the script
/// emitted no table.
fn features_from_script(script: &Script) -> DeviceFeatures {
    let elems: &[ScriptElem] = match script.tables.first() {
        Some(table) => &table.elems,
        None => &script.elems,
    };

    let mut features = DeviceFeatures::default();
    for elem in elems {
        let (Some(key), Some(value)) = (elem.key.as_deref(), elem.value.as_deref()) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        if !features.set(key, value) {
            tracing::trace!(key = %key, "Ignoring unknown feature key");
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmap_xml::parse_nmap_xml;

    const SCAN_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nmaprun scanner="nmap">
  <host>
    <status state="up"/>
    <address addr="192.168.1.64" addrtype="ipv4"/>
    <hostscript>
      <script id="smb-os-discovery" output="n/a"/>
      <script id="iotvas-features" output="">
        <table>
          <elem key="snmp_sysoid">1.3.6.1.4.1.39165.1.1</elem>
          <elem key="upnp_response">SERVER: Linux/3.0 UPnP/1.0 IpCam/1.0</elem>
          <elem key="ssh_banner">SSH-2.0-dropbear</elem>
          <elem key="telnet_banner"></elem>
        </table>
      </script>
    </hostscript>
  </host>
  <host>
    <status state="up"/>
    <address addr="fe80::1" addrtype="ipv6"/>
    <hostscript>
      <script id="iotvas-features" output="">
        <table><elem key="hostname">v6-only</elem></table>
      </script>
    </hostscript>
  </host>
  <host>
    <status state="up"/>
    <address addr="192.168.1.70" addrtype="ipv4"/>
  </host>
  <host>
    <status state="up"/>
    <address addr="192.168.1.71" addrtype="ipv4"/>
    <hostscript>
      <script id="iotvas-features" output="">
        <elem key="ftp_banner">220 FTP server ready</elem>
      </script>
    </hostscript>
  </host>
</nmaprun>"#;

    #[test]
    fn test_extract_host_features() {
        let run = parse_nmap_xml(SCAN_XML.as_bytes()).unwrap();
        let hosts = extract_host_features(&run);
        assert_eq!(hosts.len(), 2);

        let cam = &hosts[0];
        assert_eq!(cam.address, "192.168.1.64");
        assert_eq!(cam.features.snmp_sysoid, "1.3.6.1.4.1.39165.1.1");
        assert_eq!(
            cam.features.upnp_response,
            "SERVER: Linux/3.0 UPnP/1.0 IpCam/1.0"
        );
        assert_eq!(cam.features.telnet_banner, "");
        assert_eq!(cam.features.hostname, "");

        let ftp = &hosts[1];
        assert_eq!(ftp.address, "192.168.1.71");
        assert_eq!(ftp.features.ftp_banner, "220 FTP server ready");
    }
}
