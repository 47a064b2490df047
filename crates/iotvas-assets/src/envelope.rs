//! QPS `<ServiceRequest>` bodies and endpoint paths.
//!
//! Request bodies are fixed templates. Every caller-supplied value is
//! XML-escaped before it is spliced in, so tag names such as `FW: <none> & co`
//! reach the API verbatim.

use quick_xml::escape::escape;

use iotvas_core::TagId;

pub const SEARCH_TAG: &str = "/qps/rest/2.0/search/am/tag";
pub const CREATE_TAG: &str = "/qps/rest/2.0/create/am/tag";
pub const UPDATE_TAG: &str = "/qps/rest/2.0/update/am/tag";
pub const SEARCH_HOST_ASSET: &str = "/qps/rest/2.0/search/am/hostasset";
pub const UPDATE_HOST_ASSET: &str = "/qps/rest/2.0/update/am/hostasset";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>"#;

/// Direction of an asset tag change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagChange {
    Add,
    Remove,
}

impl TagChange {
    fn element(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

/// Search filter matching `field` exactly against `value`.
pub fn search_equals(field: &str, value: &str) -> String {
    format!(
        "{XML_DECL}<ServiceRequest><filters>\
         <Criteria field=\"{}\" operator=\"EQUALS\">{}</Criteria>\
         </filters></ServiceRequest>",
        escape(field),
        escape(value)
    )
}

/// Create a tag definition with the given name.
pub fn create_tag(name: &str) -> String {
    format!(
        "{XML_DECL}<ServiceRequest><data><Tag>\
         <name>{}</name>\
         </Tag></data></ServiceRequest>",
        escape(name)
    )
}

/// Nest an existing tag under the tag being updated.
pub fn add_child_tag(child: &TagId) -> String {
    format!(
        "{XML_DECL}<ServiceRequest><data><Tag><children><add>\
         <TagSimple><id>{}</id></TagSimple>\
         </add></children></Tag></data></ServiceRequest>",
        escape(child.0.as_str())
    )
}

/// Attach or detach a tag on the host asset being updated.
pub fn update_asset_tag(change: TagChange, tag: &TagId) -> String {
    let op = change.element();
    format!(
        "{XML_DECL}<ServiceRequest><data><HostAsset><tags><{op}>\
         <TagSimple><id>{}</id></TagSimple>\
         </{op}></tags></HostAsset></data></ServiceRequest>",
        escape(tag.0.as_str())
    )
}
