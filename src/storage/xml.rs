//! `AccessControlPolicy` XML documents.
//!
//! See [PutObjectAcl] for the document layout.
//!
//! [PutObjectAcl]: https://docs.aws.amazon.com/AmazonS3/latest/API/API_PutObjectAcl.html

use std::io;

use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::Error;
use crate::storage::api::{AccessControlPolicy, Grant, Grantee, GranteeFields, Owner};

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Render a policy as an `AccessControlPolicy` document.
///
/// Text and attribute values are escaped; grants are written in order.
/// Values holding characters XML 1.0 cannot carry are rejected.
pub fn to_xml(policy: &AccessControlPolicy) -> Result<Vec<u8>, Error> {
    check_text("Owner ID", &policy.owner.id)?;
    check_text("Owner DisplayName", &policy.owner.display_name)?;
    for grant in &policy.grants {
        for (name, value) in grant.grantee.fields() {
            check_text(name, value)?;
        }
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .create_element("AccessControlPolicy")
        .write_inner_content(|writer| -> io::Result<()> {
            writer
                .create_element("Owner")
                .write_inner_content(|writer| -> io::Result<()> {
                    writer
                        .create_element("ID")
                        .write_text_content(BytesText::new(&policy.owner.id))?;
                    writer
                        .create_element("DisplayName")
                        .write_text_content(BytesText::new(&policy.owner.display_name))?;
                    Ok(())
                })?;
            writer
                .create_element("AccessControlList")
                .write_inner_content(|writer| -> io::Result<()> {
                    for grant in &policy.grants {
                        write_grant(writer, grant)?;
                    }
                    Ok(())
                })?;
            Ok(())
        })?;
    Ok(writer.into_inner())
}

/// XML 1.0 `Char` production, minus what `char` already excludes.
fn check_text(element: &str, value: &str) -> Result<(), Error> {
    let invalid = value.chars().find(|c| {
        matches!(
            *c,
            '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
        )
    });
    match invalid {
        Some(c) => Err(Error::Xml(format!(
            "{} contains {:?}, which XML cannot represent",
            element, c
        ))),
        None => Ok(()),
    }
}

fn write_grant(writer: &mut Writer<Vec<u8>>, grant: &Grant) -> io::Result<()> {
    writer
        .create_element("Grant")
        .write_inner_content(|writer| -> io::Result<()> {
            writer
                .create_element("Grantee")
                .with_attribute(("xmlns:xsi", XSI_NAMESPACE))
                .with_attribute(("xsi:type", grant.grantee.type_name()))
                .write_inner_content(|writer| -> io::Result<()> {
                    for (name, value) in grant.grantee.fields() {
                        writer
                            .create_element(name)
                            .write_text_content(BytesText::new(value))?;
                    }
                    Ok(())
                })?;
            writer
                .create_element("Permission")
                .write_text_content(BytesText::new(grant.permission.as_str()))?;
            Ok(())
        })?;
    Ok(())
}

/// Parse an `AccessControlPolicy` document, such as the body of a
/// GetObjectAcl response.
///
/// The grantee type is inferred from the child elements and, when an
/// `xsi:type` attribute is present, checked against it.
pub fn from_xml(xml: &str) -> Result<AccessControlPolicy, Error> {
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<String> = Vec::new();
    let mut document = Document::default();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                if name == "Grantee" {
                    document.grantee = GranteeFields::default();
                    document.grantee_type = match start.try_get_attribute("xsi:type")? {
                        Some(attribute) => Some(attribute.unescape_value()?.into_owned()),
                        None => None,
                    };
                }
                path.push(name);
                if let Some(slot) = document.slot(&path) {
                    *slot = Some(String::new());
                }
            }
            Event::Empty(empty) => {
                let name = String::from_utf8_lossy(empty.local_name().as_ref()).into_owned();
                path.push(name);
                if let Some(slot) = document.slot(&path) {
                    *slot = Some(String::new());
                }
                path.pop();
            }
            Event::Text(text) => {
                if let Some(slot) = document.slot(&path) {
                    slot.get_or_insert_with(String::new)
                        .push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(slot) = document.slot(&path) {
                    let value = std::str::from_utf8(&data)
                        .map_err(|err| Error::Xml(err.to_string()))?;
                    slot.get_or_insert_with(String::new).push_str(value);
                }
            }
            Event::End(_) => {
                if path.pop().as_deref() == Some("Grant") {
                    document.finish_grant()?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    document.finish()
}

#[derive(Default)]
struct Document {
    owner_id: Option<String>,
    owner_display_name: Option<String>,
    grantee: GranteeFields,
    grantee_type: Option<String>,
    permission: Option<String>,
    grants: Vec<Grant>,
}

impl Document {
    /// The value slot for the innermost element of `path`, if it is a field.
    fn slot(&mut self, path: &[String]) -> Option<&mut Option<String>> {
        let (leaf, parent) = match path {
            [.., parent, leaf] => (leaf.as_str(), parent.as_str()),
            _ => return None,
        };
        match (parent, leaf) {
            ("Owner", "ID") => Some(&mut self.owner_id),
            ("Owner", "DisplayName") => Some(&mut self.owner_display_name),
            ("Grantee", "ID") => Some(&mut self.grantee.id),
            ("Grantee", "DisplayName") => Some(&mut self.grantee.display_name),
            ("Grantee", "EmailAddress") => Some(&mut self.grantee.email),
            ("Grantee", "URI") => Some(&mut self.grantee.uri),
            ("Grant", "Permission") => Some(&mut self.permission),
            _ => None,
        }
    }

    fn finish_grant(&mut self) -> Result<(), Error> {
        let grantee = Grantee::try_from(std::mem::take(&mut self.grantee))?;
        if let Some(declared) = self.grantee_type.take() {
            if declared != grantee.type_name() {
                return Err(Error::Xml(format!(
                    "grantee declared as {} but has the fields of {}",
                    declared,
                    grantee.type_name()
                )));
            }
        }
        let permission = self
            .permission
            .take()
            .ok_or_else(|| Error::Xml("Grant without a Permission".to_string()))?
            .parse()?;
        self.grants.push(Grant::new(grantee, permission));
        Ok(())
    }

    fn finish(self) -> Result<AccessControlPolicy, Error> {
        let id = self
            .owner_id
            .ok_or_else(|| Error::Xml("AccessControlPolicy without an Owner ID".to_string()))?;
        Ok(AccessControlPolicy {
            owner: Owner::new(id, self.owner_display_name.unwrap_or_default()),
            grants: self.grants,
        })
    }
}
