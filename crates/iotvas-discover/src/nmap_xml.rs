//! Nmap XML output deserialization.
//!
//! Nmap's `-oX -` flag outputs structured XML to stdout.
//! This module provides typed Rust structs that deserialize from that XML
//! using `quick-xml` with serde. Only what the fingerprinting pipeline reads
//! is modelled: host status, addresses, and host script output.

use serde::Deserialize;

use crate::error::{DiscoverError, Result};

/// Root element: `<nmaprun>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "nmaprun")]
pub struct NmapRun {
    #[serde(rename = "@scanner")]
    pub scanner: Option<String>,
    #[serde(rename = "@args")]
    pub args: Option<String>,
    #[serde(rename = "host", default)]
    pub hosts: Vec<NmapHost>,
}

/// A single host from scan results.
#[derive(Debug, Clone, Deserialize)]
pub struct NmapHost {
    pub status: Option<HostStatus>,
    #[serde(rename = "address", default)]
    pub addresses: Vec<Address>,
    pub hostscript: Option<HostScript>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostStatus {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    #[serde(rename = "@addr")]
    pub addr: String,
    #[serde(rename = "@addrtype")]
    pub addr_type: String,
}

/// `<hostscript>`: output of host-level NSE scripts.
#[derive(Debug, Clone, Deserialize)]
pub struct HostScript {
    #[serde(rename = "script", default)]
    pub scripts: Vec<Script>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@output")]
    pub output: Option<String>,
    #[serde(rename = "table", default)]
    pub tables: Vec<ScriptTable>,
    #[serde(rename = "elem", default)]
    pub elems: Vec<ScriptElem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptTable {
    #[serde(rename = "@key")]
    pub key: Option<String>,
    #[serde(rename = "elem", default)]
    pub elems: Vec<ScriptElem>,
}

/// `<elem key="...">value</elem>`
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptElem {
    #[serde(rename = "@key")]
    pub key: Option<String>,
    #[serde(rename = "$text")]
    pub value: Option<String>,
}

impl NmapHost {
    /// Extract the IPv4 address, if present.
    pub fn ipv4(&self) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.addr_type == "ipv4")
            .map(|a| a.addr.as_str())
    }

    /// Check if the host is up.
    pub fn is_up(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.state == "up")
    }

    /// Find a host script result by script id.
    pub fn script(&self, id: &str) -> Option<&Script> {
        self.hostscript
            .as_ref()
            .and_then(|hs| hs.scripts.iter().find(|s| s.id == id))
    }
}

/// Parse nmap XML bytes into a structured `NmapRun`.
pub fn parse_nmap_xml(xml: &[u8]) -> Result<NmapRun> {
    quick_xml::de::from_reader(xml).map_err(|e| DiscoverError::XmlParse(format!("{e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURES_SCAN_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<nmaprun scanner="nmap" args="nmap -sSU -p U:161,T:- --top-ports 1000 --script iotvas-features.nse -oX - 10.0.1.0/24" startstr="Mon Feb 24 10:00:00 2026">
  <host>
    <status state="up" reason="arp-response"/>
    <address addr="10.0.1.20" addrtype="ipv4"/>
    <address addr="AA:BB:CC:DD:EE:20" addrtype="mac" vendor="Hikvision"/>
    <hostscript>
      <script id="iotvas-features" output="features">
        <table>
          <elem key="snmp_sysdescr">Linux IPCamera 3.0.8</elem>
          <elem key="hostname">cam-lobby</elem>
          <elem key="http_response">HTTP/1.1 200 OK&#xd;&#xa;Server: App-webs/</elem>
          <elem key="nic_mac">AA:BB:CC:DD:EE:20</elem>
          <elem key="ftp_banner"></elem>
        </table>
      </script>
    </hostscript>
  </host>
  <host>
    <status state="up" reason="syn-ack"/>
    <address addr="10.0.1.30" addrtype="ipv4"/>
  </host>
  <host>
    <status state="down" reason="no-response"/>
    <address addr="10.0.1.99" addrtype="ipv4"/>
  </host>
  <runstats>
    <finished time="1740400000" elapsed="42.50"/>
    <hosts up="2" down="1" total="3"/>
  </runstats>
</nmaprun>"#;

    #[test]
    fn test_parse_features_scan() {
        let result = parse_nmap_xml(FEATURES_SCAN_XML.as_bytes()).unwrap();
        assert_eq!(result.hosts.len(), 3);

        let up_hosts: Vec<_> = result.hosts.iter().filter(|h| h.is_up()).collect();
        assert_eq!(up_hosts.len(), 2);

        let cam = &result.hosts[0];
        assert_eq!(cam.ipv4(), Some("10.0.1.20"));
        let script = cam.script("iotvas-features").unwrap();
        assert_eq!(script.tables.len(), 1);
        let elems = &script.tables[0].elems;
        assert_eq!(elems.len(), 5);
        assert_eq!(elems[0].key.as_deref(), Some("snmp_sysdescr"));
        assert_eq!(elems[0].value.as_deref(), Some("Linux IPCamera 3.0.8"));
        assert!(elems[2].value.as_deref().unwrap().contains("Server: App-webs/"));

        assert!(result.hosts[1].script("iotvas-features").is_none());
        assert!(!result.hosts[2].is_up());
    }

    #[test]
    fn test_parse_empty_scan() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<nmaprun scanner="nmap" args="nmap -sSU 192.168.99.0/24">
  <runstats>
    <finished elapsed="1.00"/>
    <hosts up="0" down="256" total="256"/>
  </runstats>
</nmaprun>"#;

        let result = parse_nmap_xml(xml.as_bytes()).unwrap();
        assert_eq!(result.hosts.len(), 0);
    }

    #[test]
    fn test_parse_hosts_interleaved_with_hints() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<nmaprun scanner="nmap">
  <taskbegin task="ARP Ping Scan" time="1740400000"/>
  <hosthint>
    <status state="up" reason="arp-response"/>
    <address addr="10.0.0.1" addrtype="ipv4"/>
  </hosthint>
  <taskend task="ARP Ping Scan" time="1740400001"/>
  <host>
    <status state="up"/>
    <address addr="10.0.0.1" addrtype="ipv4"/>
  </host>
  <hosthint>
    <status state="up" reason="arp-response"/>
    <address addr="10.0.0.2" addrtype="ipv4"/>
  </hosthint>
  <taskprogress task="SYN Stealth Scan" percent="50.00"/>
  <host>
    <status state="up"/>
    <address addr="10.0.0.2" addrtype="ipv4"/>
  </host>
</nmaprun>"#;

        let result = parse_nmap_xml(xml.as_bytes()).unwrap();
        let addrs: Vec<_> = result.hosts.iter().filter_map(|h| h.ipv4()).collect();
        assert_eq!(addrs, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_parse_truncated_output() {
        let xml = r#"<?xml version="1.0"?><nmaprun scanner="nmap"><host><status state="up"/>"#;
        assert!(matches!(
            parse_nmap_xml(xml.as_bytes()),
            Err(DiscoverError::XmlParse(_))
        ));
    }

    #[test]
    fn test_host_without_scripts() {
        let host = NmapHost {
            status: Some(HostStatus {
                state: "up".to_string(),
            }),
            addresses: vec![Address {
                addr: "10.0.1.5".to_string(),
                addr_type: "ipv4".to_string(),
            }],
            hostscript: None,
        };

        assert_eq!(host.ipv4(), Some("10.0.1.5"));
        assert!(host.script("iotvas-features").is_none());
        assert!(host.is_up());
    }
}
