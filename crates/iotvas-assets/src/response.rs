//! QPS `<ServiceResponse>` deserialization.
//!
//! Only the fields the tag sync reads are modelled; everything else in the
//! (large) Tag and HostAsset records is skipped by serde.

use serde::Deserialize;

use iotvas_core::{AssetId, HostAsset, Tag, TagId};

use crate::client::AssetError;

/// Root element: `<ServiceResponse>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "ServiceResponse")]
pub struct ServiceResponse {
    #[serde(rename = "responseCode")]
    pub response_code: Option<String>,
    pub count: Option<u32>,
    pub data: Option<ResponseData>,
    #[serde(rename = "responseErrorDetails")]
    pub error_details: Option<ErrorDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseData {
    #[serde(rename = "Tag", default)]
    pub tags: Vec<TagRecord>,
    #[serde(rename = "HostAsset", default)]
    pub host_assets: Vec<HostAssetRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagRecord {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostAssetRecord {
    pub id: String,
    pub address: Option<String>,
    pub tags: Option<AssetTags>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetTags {
    pub list: Option<TagSimpleList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagSimpleList {
    #[serde(rename = "TagSimple", default)]
    pub items: Vec<TagRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetails {
    #[serde(rename = "errorMessage")]
    pub message: Option<String>,
}

/// Parse a response body.
pub fn parse_response(xml: &str) -> Result<ServiceResponse, AssetError> {
    quick_xml::de::from_str(xml).map_err(|e| AssetError::Parse(format!("{e}")))
}

impl ServiceResponse {
    /// Fail unless the API reported `SUCCESS` (or no code at all).
    pub fn ensure_success(self, operation: &'static str) -> Result<Self, AssetError> {
        match self.response_code.as_deref() {
            None | Some("SUCCESS") => Ok(self),
            Some(code) => Err(AssetError::Api {
                operation,
                code: code.to_string(),
                message: self
                    .error_details
                    .and_then(|d| d.message)
                    .unwrap_or_default(),
            }),
        }
    }

    /// The tag id when the search matched exactly one tag.
    pub fn single_tag_id(&self) -> Option<TagId> {
        if self.count != Some(1) {
            return None;
        }
        self.first_tag_id()
    }

    /// Id of the first `<Tag>` in `<data>`.
    pub fn first_tag_id(&self) -> Option<TagId> {
        self.data
            .as_ref()
            .and_then(|d| d.tags.first())
            .map(|t| TagId(t.id.clone()))
    }

    /// The first `<HostAsset>` in `<data>` with its attached tags.
    pub fn first_host_asset(&self) -> Option<HostAsset> {
        let record = self.data.as_ref()?.host_assets.first()?;
        let tags = record
            .tags
            .as_ref()
            .and_then(|t| t.list.as_ref())
            .map(|list| {
                list.items
                    .iter()
                    .filter_map(|item| {
                        Some(Tag {
                            id: TagId(item.id.clone()),
                            name: item.name.clone()?,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(HostAsset {
            id: AssetId(record.id.clone()),
            address: record.address.clone(),
            tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG_SEARCH_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ServiceResponse xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="https://qualysapi.qualys.com/qps/xsd/2.0/am/tag.xsd">
  <responseCode>SUCCESS</responseCode>
  <count>1</count>
  <hasMoreRecords>false</hasMoreRecords>
  <data>
    <Tag>
      <id>8812345</id>
      <name>Vendor: Acme &amp; Sons</name>
      <created>2021-03-01T10:00:00Z</created>
      <color>#FFFFFF</color>
      <children>
        <list>
          <TagSimple><id>1</id><name>child</name></TagSimple>
        </list>
      </children>
    </Tag>
  </data>
</ServiceResponse>"#;

    const HOST_ASSET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ServiceResponse>
  <responseCode>SUCCESS</responseCode>
  <count>1</count>
  <hasMoreRecords>false</hasMoreRecords>
  <data>
    <HostAsset>
      <id>2233445</id>
      <name>cam-01</name>
      <address>10.0.0.5</address>
      <dnsHostName>cam-01.local</dnsHostName>
      <tags>
        <list>
          <TagSimple><id>7</id><name>Vendor: OldCo</name></TagSimple>
          <TagSimple><id>3</id><name>Discontinued</name></TagSimple>
        </list>
      </tags>
    </HostAsset>
  </data>
</ServiceResponse>"#;

    #[test]
    fn test_parse_tag_search() {
        let resp = parse_response(TAG_SEARCH_XML).unwrap();
        let resp = resp.ensure_success("search tag").unwrap();
        assert_eq!(resp.count, Some(1));
        assert_eq!(resp.single_tag_id(), Some(TagId("8812345".to_string())));
        let name = resp.data.as_ref().unwrap().tags[0].name.as_deref();
        assert_eq!(name, Some("Vendor: Acme & Sons"));
    }

    #[test]
    fn test_tag_search_ambiguous_or_empty() {
        let none = r#"<ServiceResponse><responseCode>SUCCESS</responseCode><count>0</count></ServiceResponse>"#;
        assert_eq!(parse_response(none).unwrap().single_tag_id(), None);

        let two = r#"<ServiceResponse><responseCode>SUCCESS</responseCode><count>2</count>
            <data><Tag><id>1</id><name>A</name></Tag><Tag><id>2</id><name>A</name></Tag></data>
            </ServiceResponse>"#;
        let resp = parse_response(two).unwrap();
        assert_eq!(resp.single_tag_id(), None);
        assert_eq!(resp.first_tag_id(), Some(TagId("1".to_string())));
    }

    #[test]
    fn test_parse_host_asset() {
        let resp = parse_response(HOST_ASSET_XML).unwrap();
        let asset = resp.first_host_asset().unwrap();
        assert_eq!(asset.id, AssetId("2233445".to_string()));
        assert_eq!(asset.address.as_deref(), Some("10.0.0.5"));
        assert_eq!(asset.tags.len(), 2);
        assert_eq!(asset.tags[0].name, "Vendor: OldCo");
        assert_eq!(asset.tags[0].id, TagId("7".to_string()));
        assert!(asset.has_tag("Discontinued"));
    }

    #[test]
    fn test_host_asset_without_tags() {
        let xml = r#"<ServiceResponse><responseCode>SUCCESS</responseCode><count>1</count>
            <data><HostAsset><id>9</id><address>10.0.0.9</address></HostAsset></data>
            </ServiceResponse>"#;
        let asset = parse_response(xml).unwrap().first_host_asset().unwrap();
        assert!(asset.tags.is_empty());
    }

    #[test]
    fn test_no_host_asset() {
        let xml = r#"<ServiceResponse><responseCode>SUCCESS</responseCode><count>0</count></ServiceResponse>"#;
        assert!(parse_response(xml).unwrap().first_host_asset().is_none());
    }

    #[test]
    fn test_error_response() {
        let xml = r#"<ServiceResponse>
  <responseCode>INVALID_REQUEST</responseCode>
  <responseErrorDetails>
    <errorMessage>Tag name already exists</errorMessage>
  </responseErrorDetails>
</ServiceResponse>"#;
        let err = parse_response(xml)
            .unwrap()
            .ensure_success("create tag")
            .unwrap_err();
        match err {
            AssetError::Api { code, message, .. } => {
                assert_eq!(code, "INVALID_REQUEST");
                assert_eq!(message, "Tag name already exists");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_response() {
        assert!(matches!(
            parse_response("<ServiceResponse><count>1</ServiceResponse>"),
            Err(AssetError::Parse(_))
        ));
    }
}
