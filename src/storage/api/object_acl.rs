use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::storage::xml;

/// The owner of a bucket or object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "DisplayName")]
    pub display_name: String,
}

impl Owner {
    /// Create an owner from its canonical ID and display name.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Owner {
        Owner {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// The principal receiving a permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GranteeFields", into = "GranteeFields")]
pub enum Grantee {
    /// An account identified by its canonical ID.
    CanonicalUser { id: String, display_name: String },
    /// An account identified by the email address it was registered with.
    AmazonCustomerByEmail { email: String },
    /// A predefined group of users.
    Group { uri: String },
}

impl Grantee {
    /// Value: "http://acs.amazonaws.com/groups/global/AllUsers"
    pub const ALL_USERS: &'static str = "http://acs.amazonaws.com/groups/global/AllUsers";
    /// Value: "http://acs.amazonaws.com/groups/global/AuthenticatedUsers"
    pub const AUTHENTICATED_USERS: &'static str =
        "http://acs.amazonaws.com/groups/global/AuthenticatedUsers";
    /// Value: "http://acs.amazonaws.com/groups/s3/LogDelivery"
    pub const LOG_DELIVERY: &'static str = "http://acs.amazonaws.com/groups/s3/LogDelivery";

    pub fn canonical_user(id: impl Into<String>, display_name: impl Into<String>) -> Grantee {
        Grantee::CanonicalUser {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    pub fn email(email: impl Into<String>) -> Grantee {
        Grantee::AmazonCustomerByEmail {
            email: email.into(),
        }
    }

    pub fn group(uri: impl Into<String>) -> Grantee {
        Grantee::Group { uri: uri.into() }
    }

    /// The `xsi:type` discriminator of this grantee.
    pub fn type_name(&self) -> &'static str {
        match self {
            Grantee::CanonicalUser { .. } => "CanonicalUser",
            Grantee::AmazonCustomerByEmail { .. } => "AmazonCustomerByEmail",
            Grantee::Group { .. } => "Group",
        }
    }

    /// The populated fields as `(element name, value)` pairs, in declaration order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Grantee::CanonicalUser { id, display_name } => {
                vec![("ID", id.as_str()), ("DisplayName", display_name.as_str())]
            }
            Grantee::AmazonCustomerByEmail { email } => vec![("EmailAddress", email.as_str())],
            Grantee::Group { uri } => vec![("URI", uri.as_str())],
        }
    }
}

/// Loosely-shaped grantee input, as found in JSON documents or untyped callers.
///
/// Exactly one of the shapes `{ID, DisplayName}`, `{EmailAddress}` or `{URI}`
/// must be populated for the conversion into [`Grantee`] to succeed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GranteeFields {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "DisplayName", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "EmailAddress", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "URI", default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl GranteeFields {
    fn present(&self) -> Vec<String> {
        [
            ("ID", self.id.is_some()),
            ("DisplayName", self.display_name.is_some()),
            ("EmailAddress", self.email.is_some()),
            ("URI", self.uri.is_some()),
        ]
        .iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

impl TryFrom<GranteeFields> for Grantee {
    type Error = Error;

    fn try_from(fields: GranteeFields) -> Result<Grantee, Error> {
        let present = fields.present();
        match fields {
            GranteeFields {
                id: Some(id),
                display_name: Some(display_name),
                email: None,
                uri: None,
            } => Ok(Grantee::CanonicalUser { id, display_name }),
            GranteeFields {
                id: None,
                display_name: None,
                email: Some(email),
                uri: None,
            } => Ok(Grantee::AmazonCustomerByEmail { email }),
            GranteeFields {
                id: None,
                display_name: None,
                email: None,
                uri: Some(uri),
            } => Ok(Grantee::Group { uri }),
            _ => Err(Error::InvalidGranteeShape { fields: present }),
        }
    }
}

impl From<Grantee> for GranteeFields {
    fn from(grantee: Grantee) -> GranteeFields {
        match grantee {
            Grantee::CanonicalUser { id, display_name } => GranteeFields {
                id: Some(id),
                display_name: Some(display_name),
                ..GranteeFields::default()
            },
            Grantee::AmazonCustomerByEmail { email } => GranteeFields {
                email: Some(email),
                ..GranteeFields::default()
            },
            Grantee::Group { uri } => GranteeFields {
                uri: Some(uri),
                ..GranteeFields::default()
            },
        }
    }
}

/// An ACL permission level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    FullControl,
    Write,
    WriteAcp,
    Read,
    ReadAcp,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::FullControl,
        Permission::Write,
        Permission::WriteAcp,
        Permission::Read,
        Permission::ReadAcp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::FullControl => "FULL_CONTROL",
            Permission::Write => "WRITE",
            Permission::WriteAcp => "WRITE_ACP",
            Permission::Read => "READ",
            Permission::ReadAcp => "READ_ACP",
        }
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Permission, Error> {
        Permission::ALL
            .iter()
            .copied()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| Error::InvalidPermission {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single permission given to a grantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    #[serde(rename = "Grantee")]
    pub grantee: Grantee,
    #[serde(rename = "Permission")]
    pub permission: Permission,
}

impl Grant {
    pub fn new(grantee: Grantee, permission: Permission) -> Grant {
        Grant {
            grantee,
            permission,
        }
    }
}

/// An explicit access control policy: an owner and an ordered list of grants.
///
/// Grants are kept in the order they were given, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlPolicy {
    #[serde(rename = "Owner")]
    pub owner: Owner,
    #[serde(rename = "AccessControlList", default)]
    pub grants: Vec<Grant>,
}

impl AccessControlPolicy {
    pub fn new(owner: Owner) -> AccessControlPolicy {
        AccessControlPolicy {
            owner,
            grants: Vec::new(),
        }
    }

    /// Append a grant to the policy.
    pub fn grant(mut self, grantee: Grantee, permission: Permission) -> AccessControlPolicy {
        self.grants.push(Grant::new(grantee, permission));
        self
    }

    /// Render the policy as the XML document sent to the service.
    pub fn to_xml(&self) -> Result<Vec<u8>, Error> {
        xml::to_xml(self)
    }

    /// Parse a policy from an `AccessControlPolicy` XML document.
    pub fn from_xml(input: &str) -> Result<AccessControlPolicy, Error> {
        xml::from_xml(input)
    }

    /// Parse a policy from its JSON form:
    ///
    /// ```json
    /// {
    ///   "Owner": { "ID": "1", "DisplayName": "me" },
    ///   "AccessControlList": [
    ///     { "Grantee": { "URI": "http://acs.amazonaws.com/groups/global/AllUsers" }, "Permission": "READ" }
    ///   ]
    /// }
    /// ```
    ///
    /// Grantee shapes and permissions are validated before anything else
    /// happens, so a malformed grant surfaces as
    /// [`Error::InvalidGranteeShape`] or [`Error::InvalidPermission`].
    pub fn from_json(input: &str) -> Result<AccessControlPolicy, Error> {
        let raw: RawPolicy = json::from_str(input)?;
        let grants = raw
            .grants
            .into_iter()
            .map(|grant| {
                Ok(Grant {
                    grantee: Grantee::try_from(grant.grantee)?,
                    permission: grant.permission.parse()?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(AccessControlPolicy {
            owner: raw.owner,
            grants,
        })
    }
}

#[derive(Deserialize)]
struct RawPolicy {
    #[serde(rename = "Owner")]
    owner: Owner,
    #[serde(rename = "AccessControlList", default)]
    grants: Vec<RawGrant>,
}

#[derive(Deserialize)]
struct RawGrant {
    #[serde(rename = "Grantee")]
    grantee: GranteeFields,
    #[serde(rename = "Permission")]
    permission: String,
}

/// A predefined access control policy applied through the `x-amz-acl` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CannedAcl {
    /// Owner gets FULL_CONTROL. No one else has access rights.
    Private,
    /// Owner gets FULL_CONTROL. The AllUsers group gets READ access.
    PublicRead,
    /// Owner gets FULL_CONTROL. The AllUsers group gets READ and WRITE access.
    PublicReadWrite,
    /// Owner gets FULL_CONTROL. The AuthenticatedUsers group gets READ access.
    AuthenticatedRead,
}

impl CannedAcl {
    pub const ALL: [CannedAcl; 4] = [
        CannedAcl::Private,
        CannedAcl::PublicRead,
        CannedAcl::PublicReadWrite,
        CannedAcl::AuthenticatedRead,
    ];

    /// Get the S3 ACL header value.
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::PublicReadWrite => "public-read-write",
            CannedAcl::AuthenticatedRead => "authenticated-read",
        }
    }
}

impl FromStr for CannedAcl {
    type Err = Error;

    fn from_str(s: &str) -> Result<CannedAcl, Error> {
        CannedAcl::ALL
            .iter()
            .copied()
            .find(|acl| acl.as_str() == s)
            .ok_or_else(|| Error::InvalidAclKeyword {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The access control to apply: either an explicit policy or a canned ACL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acl {
    Policy(AccessControlPolicy),
    Canned(CannedAcl),
}

impl TryFrom<AccessControlPolicy> for Acl {
    type Error = Error;

    fn try_from(policy: AccessControlPolicy) -> Result<Acl, Error> {
        Ok(Acl::Policy(policy))
    }
}

impl TryFrom<CannedAcl> for Acl {
    type Error = Error;

    fn try_from(canned: CannedAcl) -> Result<Acl, Error> {
        Ok(Acl::Canned(canned))
    }
}

impl TryFrom<&str> for Acl {
    type Error = Error;

    fn try_from(keyword: &str) -> Result<Acl, Error> {
        keyword.parse().map(Acl::Canned)
    }
}

impl TryFrom<String> for Acl {
    type Error = Error;

    fn try_from(keyword: String) -> Result<Acl, Error> {
        Acl::try_from(keyword.as_str())
    }
}

/// Optional parameters of an ACL request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclRequestOptions {
    /// Apply the ACL to a specific version of the object.
    pub version_id: Option<String>,
}

impl AclRequestOptions {
    pub fn version(version_id: impl Into<String>) -> AclRequestOptions {
        AclRequestOptions {
            version_id: Some(version_id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn it_accepts_every_canned_keyword() {
        for keyword in ["private", "public-read", "public-read-write", "authenticated-read"] {
            let acl: CannedAcl = keyword.parse().unwrap();
            assert_eq!(acl.as_str(), keyword);
            assert_eq!(acl.to_string(), keyword);
        }
    }

    #[test]
    fn it_rejects_unknown_canned_keywords() {
        for keyword in ["", "PUBLIC-READ", "public_read", "bucket-owner-read", " private"] {
            match keyword.parse::<CannedAcl>() {
                Err(Error::InvalidAclKeyword { value }) => assert_eq!(value, keyword),
                other => panic!("unexpected result for {:?}: {:?}", keyword, other),
            }
        }
    }

    #[test]
    fn it_infers_grantee_variant_from_fields() {
        let user = GranteeFields {
            id: Some("abc".into()),
            display_name: Some("me".into()),
            ..GranteeFields::default()
        };
        assert_eq!(
            Grantee::try_from(user).unwrap(),
            Grantee::canonical_user("abc", "me")
        );

        let email = GranteeFields {
            email: Some("me@example.com".into()),
            ..GranteeFields::default()
        };
        assert_eq!(
            Grantee::try_from(email).unwrap(),
            Grantee::email("me@example.com")
        );

        let group = GranteeFields {
            uri: Some(Grantee::ALL_USERS.into()),
            ..GranteeFields::default()
        };
        assert_eq!(
            Grantee::try_from(group).unwrap(),
            Grantee::group(Grantee::ALL_USERS)
        );
    }

    #[test]
    fn it_rejects_ambiguous_or_partial_grantees() {
        let cases = vec![
            (GranteeFields::default(), vec![]),
            (
                GranteeFields {
                    id: Some("abc".into()),
                    ..GranteeFields::default()
                },
                vec!["ID"],
            ),
            (
                GranteeFields {
                    email: Some("me@example.com".into()),
                    uri: Some("AllUsers".into()),
                    ..GranteeFields::default()
                },
                vec!["EmailAddress", "URI"],
            ),
        ];
        for (fields, expected) in cases {
            match Grantee::try_from(fields) {
                Err(Error::InvalidGranteeShape { fields }) => assert_eq!(fields, expected),
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn it_parses_permissions() {
        for permission in Permission::ALL.iter() {
            assert_eq!(permission.as_str().parse::<Permission>().unwrap(), *permission);
        }
        assert!(matches!(
            "read".parse::<Permission>(),
            Err(Error::InvalidPermission { .. })
        ));
    }

    #[test]
    fn it_reads_policies_from_json() {
        let policy = AccessControlPolicy::from_json(
            r#"{
                "Owner": { "ID": "1", "DisplayName": "me" },
                "AccessControlList": [
                    { "Grantee": { "URI": "AllUsers" }, "Permission": "READ" },
                    { "Grantee": { "EmailAddress": "a@b.c" }, "Permission": "WRITE_ACP" }
                ]
            }"#,
        )
        .unwrap();

        let expected = AccessControlPolicy::new(Owner::new("1", "me"))
            .grant(Grantee::group("AllUsers"), Permission::Read)
            .grant(Grantee::email("a@b.c"), Permission::WriteAcp);
        assert_eq!(policy, expected);
    }

    #[test]
    fn it_reports_bad_grants_in_json() {
        let err = AccessControlPolicy::from_json(
            r#"{
                "Owner": { "ID": "1", "DisplayName": "me" },
                "AccessControlList": [
                    { "Grantee": { "ID": "2" }, "Permission": "READ" }
                ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidGranteeShape { .. }));

        let err = AccessControlPolicy::from_json(
            r#"{
                "Owner": { "ID": "1", "DisplayName": "me" },
                "AccessControlList": [
                    { "Grantee": { "URI": "AllUsers" }, "Permission": "EVERYTHING" }
                ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPermission { value } if value == "EVERYTHING"));
    }

    #[test]
    fn it_converts_inputs_into_acl() {
        assert_eq!(
            Acl::try_from("private").unwrap(),
            Acl::Canned(CannedAcl::Private)
        );
        assert!(matches!(
            Acl::try_from(String::from("world-writable")),
            Err(Error::InvalidAclKeyword { .. })
        ));
    }

    #[test]
    fn it_round_trips_policies_through_serde() {
        let policy = AccessControlPolicy::new(Owner::new("1", "me"))
            .grant(Grantee::canonical_user("2", "you"), Permission::FullControl)
            .grant(Grantee::email("a@b.c"), Permission::WriteAcp)
            .grant(Grantee::group(Grantee::LOG_DELIVERY), Permission::Write);

        let encoded = json::to_string(&policy).unwrap();
        assert!(encoded.contains(r#""Grantee":{"EmailAddress":"a@b.c"}"#));
        assert!(encoded.contains(r#""Permission":"WRITE_ACP""#));

        let decoded: AccessControlPolicy = json::from_str(&encoded).unwrap();
        assert_eq!(decoded, policy);
        assert_eq!(AccessControlPolicy::from_json(&encoded).unwrap(), policy);
    }

    #[test]
    fn it_rejects_bad_grantees_through_serde() {
        let err = json::from_str::<Grantee>(r#"{ "ID": "1" }"#).unwrap_err();
        assert!(err.to_string().contains("invalid grantee"));

        let err = json::from_str::<AccessControlPolicy>(
            r#"{
                "Owner": { "ID": "1", "DisplayName": "me" },
                "AccessControlList": [
                    { "Grantee": { "EmailAddress": "a@b.c", "URI": "AllUsers" }, "Permission": "READ" }
                ]
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid grantee"));
    }

    proptest! {
        #[test]
        fn it_rejects_any_other_keyword(keyword in any::<String>()) {
            prop_assume!(!CannedAcl::ALL.iter().any(|acl| acl.as_str() == keyword));
            match Acl::try_from(keyword.as_str()) {
                Err(Error::InvalidAclKeyword { value }) => prop_assert_eq!(value, keyword),
                other => prop_assert!(false, "unexpected result: {:?}", other),
            }
        }
    }
}
