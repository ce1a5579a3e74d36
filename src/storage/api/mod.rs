mod object_acl;

pub use self::object_acl::*;
