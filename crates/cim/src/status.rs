//! Standard CIM status codes (DSP0200)

use std::fmt;

/// `CIM_ERR_*` status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum StatusCode {
    Success = 0,
    Failed = 1,
    AccessDenied = 2,
    InvalidNamespace = 3,
    InvalidParameter = 4,
    InvalidClass = 5,
    NotFound = 6,
    NotSupported = 7,
    ClassHasChildren = 8,
    ClassHasInstances = 9,
    InvalidSuperclass = 10,
    AlreadyExists = 11,
    NoSuchProperty = 12,
    TypeMismatch = 13,
    QueryLanguageNotSupported = 14,
    InvalidQuery = 15,
    MethodNotAvailable = 16,
    MethodNotFound = 17,
}

impl StatusCode {
    const ALL: [StatusCode; 18] = [
        Self::Success,
        Self::Failed,
        Self::AccessDenied,
        Self::InvalidNamespace,
        Self::InvalidParameter,
        Self::InvalidClass,
        Self::NotFound,
        Self::NotSupported,
        Self::ClassHasChildren,
        Self::ClassHasInstances,
        Self::InvalidSuperclass,
        Self::AlreadyExists,
        Self::NoSuchProperty,
        Self::TypeMismatch,
        Self::QueryLanguageNotSupported,
        Self::InvalidQuery,
        Self::MethodNotAvailable,
        Self::MethodNotFound,
    ];

    /// Numeric code as carried in `<ERROR CODE="...">`
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Symbolic name, e.g. `CIM_ERR_NOT_FOUND`
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "CIM_ERR_SUCCESS",
            Self::Failed => "CIM_ERR_FAILED",
            Self::AccessDenied => "CIM_ERR_ACCESS_DENIED",
            Self::InvalidNamespace => "CIM_ERR_INVALID_NAMESPACE",
            Self::InvalidParameter => "CIM_ERR_INVALID_PARAMETER",
            Self::InvalidClass => "CIM_ERR_INVALID_CLASS",
            Self::NotFound => "CIM_ERR_NOT_FOUND",
            Self::NotSupported => "CIM_ERR_NOT_SUPPORTED",
            Self::ClassHasChildren => "CIM_ERR_CLASS_HAS_CHILDREN",
            Self::ClassHasInstances => "CIM_ERR_CLASS_HAS_INSTANCES",
            Self::InvalidSuperclass => "CIM_ERR_INVALID_SUPERCLASS",
            Self::AlreadyExists => "CIM_ERR_ALREADY_EXISTS",
            Self::NoSuchProperty => "CIM_ERR_NO_SUCH_PROPERTY",
            Self::TypeMismatch => "CIM_ERR_TYPE_MISMATCH",
            Self::QueryLanguageNotSupported => "CIM_ERR_QUERY_LANGUAGE_NOT_SUPPORTED",
            Self::InvalidQuery => "CIM_ERR_INVALID_QUERY",
            Self::MethodNotAvailable => "CIM_ERR_METHOD_NOT_AVAILABLE",
            Self::MethodNotFound => "CIM_ERR_METHOD_NOT_FOUND",
        }
    }

    /// Human readable description
    pub fn description(self) -> &'static str {
        match self {
            Self::Success => "successful",
            Self::Failed => "A general error occurred that is not covered by a more specific error code",
            Self::AccessDenied => "Access to a CIM resource was not available to the client",
            Self::InvalidNamespace => "The target namespace does not exist",
            Self::InvalidParameter => "One or more parameter values passed to the method were invalid",
            Self::InvalidClass => "The specified class does not exist",
            Self::NotFound => "The requested object could not be found",
            Self::NotSupported => "The requested operation is not supported",
            Self::ClassHasChildren => "Operation cannot be carried out on this class since it has subclasses",
            Self::ClassHasInstances => "Operation cannot be carried out on this class since it has instances",
            Self::InvalidSuperclass => "Operation cannot be carried out since the specified superclass does not exist",
            Self::AlreadyExists => "Operation cannot be carried out because an object already exists",
            Self::NoSuchProperty => "The specified property does not exist",
            Self::TypeMismatch => "The value supplied is incompatible with the type",
            Self::QueryLanguageNotSupported => "The query language is not recognized or supported",
            Self::InvalidQuery => "The query is not valid for the specified query language",
            Self::MethodNotAvailable => "The extrinsic method could not be executed",
            Self::MethodNotFound => "The specified extrinsic method does not exist",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_round_trip() {
        for code in StatusCode::ALL {
            assert_eq!(StatusCode::from_u32(code.as_u32()), Some(code));
        }
        assert_eq!(StatusCode::from_u32(18), None);
        assert_eq!(StatusCode::AlreadyExists.as_u32(), 11);
    }
}
