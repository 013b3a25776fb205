//! Compiler message catalog
//!
//! Every user-visible diagnostic is built from a [`MessageCode`] and its
//! positional arguments. Templates refer to arguments as `$0`, `$1`, ...

use std::fmt;

/// Identifies a compiler message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCode {
    ParserSyntaxError,
    LocaleNotImplementedWarning,
    PragmaNotImplementedWarning,
    IncludeNotFound,
    IncludeTooDeep,

    AddQualifier,
    AddClass,
    AddInstance,
    TabOk,

    ClassExistsWarning,
    ClassNotUpdated,
    InstanceExistsWarning,
    PropertyAlreadyExistsWarning,
    InstancePropertyExistsWarning,
    MethodAlreadyExistsWarning,

    AddQualifierError,
    AddClassError,
    AddInstanceError,
    NewClassError,
    NewPropertyError,
    NewParameterError,
    ApplyingPropertyError,
    ApplyMethodError,
    ApplyParameterError,
    ApplyInstancePropertyError,
    ApplyQualifierError,
    GetQualifierDeclError,
    GetClassError,
    NamespaceCreateError,

    ClassAliasFound,
    InstanceAliasClassNotFound,
    InstanceAliasExists,
    InstanceAliasNotFound,
    InvalidLiteralValue,

    NoClassUpdate,
    NoExperimentalUpdate,
    NoVersionUpdate,
    SameVersion,
    InvalidVersionFormat,
}

impl MessageCode {
    /// Stable identifier, used when one message is embedded in another
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParserSyntaxError => "PARSER_SYNTAX_ERROR",
            Self::LocaleNotImplementedWarning => "LOCALE_NOT_IMPLEMENTED_WARNING",
            Self::PragmaNotImplementedWarning => "PRAGMA_NOT_IMPLEMENTED_WARNING",
            Self::IncludeNotFound => "INCLUDE_NOT_FOUND",
            Self::IncludeTooDeep => "INCLUDE_TOO_DEEP",
            Self::AddQualifier => "ADD_QUALIFIER",
            Self::AddClass => "ADD_CLASS",
            Self::AddInstance => "ADD_INSTANCE",
            Self::TabOk => "TAB_OK",
            Self::ClassExistsWarning => "CLASS_EXISTS_WARNING",
            Self::ClassNotUpdated => "CLASS_NOT_UPDATED",
            Self::InstanceExistsWarning => "INSTANCE_EXISTS_WARNING",
            Self::PropertyAlreadyExistsWarning => "PROPERTY_ALREADY_EXISTS_WARNING",
            Self::InstancePropertyExistsWarning => "INSTANCE_PROPERTY_EXISTS_WARNING",
            Self::MethodAlreadyExistsWarning => "METHOD_ALREADY_EXISTS_WARNING",
            Self::AddQualifierError => "ADD_QUALIFIER_ERROR",
            Self::AddClassError => "ADD_CLASS_ERROR",
            Self::AddInstanceError => "ADD_INSTANCE_ERROR",
            Self::NewClassError => "NEW_CLASS_ERROR",
            Self::NewPropertyError => "NEW_PROPERTY_ERROR",
            Self::NewParameterError => "NEW_PARAMETER_ERROR",
            Self::ApplyingPropertyError => "APPLYING_PROPERTY_ERROR",
            Self::ApplyMethodError => "APPLY_METHOD_ERROR",
            Self::ApplyParameterError => "APPLY_PARAMETER_ERROR",
            Self::ApplyInstancePropertyError => "APPLY_INSTANCE_PROPERTY_ERROR",
            Self::ApplyQualifierError => "APPLY_QUALIFIER_ERROR",
            Self::GetQualifierDeclError => "GET_QUALIFIER_DECL_ERROR",
            Self::GetClassError => "GET_CLASS_ERROR",
            Self::NamespaceCreateError => "NAMESPACE_CREATE_ERROR",
            Self::ClassAliasFound => "CLASS_ALIAS_FOUND",
            Self::InstanceAliasClassNotFound => "INSTANCE_ALIAS_CLASS_NOT_FOUND",
            Self::InstanceAliasExists => "INSTANCE_ALIAS_EXISTS",
            Self::InstanceAliasNotFound => "INSTANCE_ALIAS_NOT_FOUND",
            Self::InvalidLiteralValue => "INVALID_LITERAL_VALUE",
            Self::NoClassUpdate => "NO_CLASS_UPDATE",
            Self::NoExperimentalUpdate => "NO_EXPERIMENTAL_UPDATE",
            Self::NoVersionUpdate => "NO_VERSION_UPDATE",
            Self::SameVersion => "SAME_VERSION",
            Self::InvalidVersionFormat => "INVALID_VERSION_FORMAT",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::ParserSyntaxError => "Syntax error in file $0, line $1: $2 (near \"$3\")",
            Self::LocaleNotImplementedWarning => {
                "Warning: locale \"$0\" is not supported; only en_US is accepted"
            }
            Self::PragmaNotImplementedWarning => "Warning: pragma \"$0\" is not implemented",
            Self::IncludeNotFound => "Could not open include file $0",
            Self::IncludeTooDeep => "Include file $0 nested too deeply",
            Self::AddQualifier => "Compiling qualifier declaration",
            Self::AddClass => "Compiling class declaration",
            Self::AddInstance => "Compiling instance",
            Self::TabOk => "\t-- OK",
            Self::ClassExistsWarning => "Warning: class $0 already exists",
            Self::ClassNotUpdated => "Warning: class $0 was not updated: $1",
            Self::InstanceExistsWarning => "Warning: instance already exists: $0",
            Self::PropertyAlreadyExistsWarning => {
                "Warning: property $1 already exists in class $0"
            }
            Self::InstancePropertyExistsWarning => {
                "Warning: property $1 already set in instance of class $0"
            }
            Self::MethodAlreadyExistsWarning => "Warning: method $0 already exists in class $1",
            Self::AddQualifierError => "Error adding qualifier declaration $0: $1",
            Self::AddClassError => "Error adding class $0 to the repository: $1",
            Self::AddInstanceError => "Error adding an instance: $0",
            Self::NewClassError => "Error creating class $0: $1",
            Self::NewPropertyError => "Error creating property $0: $1",
            Self::NewParameterError => "Error creating parameter $0: $1",
            Self::ApplyingPropertyError => "Error applying property $1 to class $0: $2",
            Self::ApplyMethodError => "Error applying method $0 to class $1: $2",
            Self::ApplyParameterError => "Error applying parameter $0 to method $1: $2",
            Self::ApplyInstancePropertyError => {
                "Error applying property $1 to an instance of class $0: $2"
            }
            Self::ApplyQualifierError => "Error applying qualifier $0: $1",
            Self::GetQualifierDeclError => "Error getting declaration of qualifier $0: $1",
            Self::GetClassError => "Error getting class $0 from namespace $1: $2",
            Self::NamespaceCreateError => "Error creating namespace $0: $1",
            Self::ClassAliasFound => "Alias $0 declared on class $1; class aliases are not supported",
            Self::InstanceAliasClassNotFound => "Class $1 of instance alias $0 was not found",
            Self::InstanceAliasExists => "Instance alias $0 already exists",
            Self::InstanceAliasNotFound => "Instance alias $0 was not found",
            Self::InvalidLiteralValue => "Invalid $0 value: $1",
            Self::NoClassUpdate => "class update not enabled",
            Self::NoExperimentalUpdate => "experimental class changes not enabled",
            Self::NoVersionUpdate => "version change not enabled",
            Self::SameVersion => "same version",
            Self::InvalidVersionFormat => "invalid version format",
        }
    }

    /// Message text with `$n` replaced by `args[n]`
    ///
    /// Placeholders without a matching argument are left as written.
    pub fn format(self, args: &[&str]) -> String {
        let template = self.template();
        let mut out = String::with_capacity(template.len() + 32);
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '$' {
                if let Some(index) = chars.peek().and_then(|d| d.to_digit(10)) {
                    chars.next();
                    match args.get(index as usize) {
                        Some(arg) => out.push_str(arg),
                        None => {
                            out.push('$');
                            out.push_str(&index.to_string());
                        }
                    }
                    continue;
                }
            }
            out.push(c);
        }
        out
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a recorded diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A warning or error produced while compiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: MessageCode,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
