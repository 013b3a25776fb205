//! Compiler driver
//!
//! [`MofCompiler`] owns the repository, the options and the parser
//! context. The parser calls back into it as each production completes;
//! the driver turns literals into typed values, applies the class update
//! policy, and either stores the result, echoes it as CIM-XML, or both.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};
use tracing::{debug, error, info, warn};

use cim::{
    CimError, CimName, CimType, CimValue, Class, Instance, Method, NamespaceName, ObjectPath,
    Parameter, Property, PropertyList, Qualifier, QualifierDecl, StatusCode,
};
use cim_xml::writer::{
    append_class_element, append_instance_element, append_qualifier_decl_element, to_xml_string,
};
use cim_xml::{indented_print, DEFAULT_INDENT_CHARS};

use crate::context::{ParserContext, MAX_INCLUDE_DEPTH};
use crate::error::{MofError, Result};
use crate::lexer::Lexer;
use crate::messages::{Diagnostic, MessageCode, Severity};
use crate::options::CompilerOptions;
use crate::parser::Parser;
use crate::repository::Repository;
use crate::update::{self, UpdateDecision};
use crate::value::{create_value, Initializer, Shape};

const XML_PROLOGUE: &str = "<?xml version=\"1.0\"?>\n";
const XML_EPILOGUE: &str = "</DECLGROUP>\n</DECLARATION>\n</CIM>\n";

/// Superclass chain length followed when typing instance properties
const MAX_CLASS_DEPTH: usize = 64;

/// Declarations compiled in a mode that does not write the repository
#[derive(Debug, Default)]
struct Session {
    qualifiers: HashMap<CimName, QualifierDecl>,
    classes: HashMap<CimName, Class>,
}

/// MOF compiler bound to one repository and one target namespace
pub struct MofCompiler<R: Repository> {
    repository: R,
    options: CompilerOptions,
    namespace: NamespaceName,
    pub(crate) context: ParserContext,
    output: BytesMut,
    diagnostics: Vec<Diagnostic>,
    session: Session,
    started: bool,
}

impl<R: Repository> MofCompiler<R> {
    pub fn new(repository: R, options: CompilerOptions) -> Result<Self> {
        options.validate()?;
        let namespace = NamespaceName::new(&options.namespace)?;
        Ok(Self {
            repository,
            options,
            namespace,
            context: ParserContext::new(),
            output: BytesMut::new(),
            diagnostics: Vec::new(),
            session: Session::default(),
            started: false,
        })
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn namespace(&self) -> &NamespaceName {
        &self.namespace
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn into_repository(self) -> R {
        self.repository
    }

    /// Warnings and errors recorded so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// CIM-XML or trace text produced so far
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn take_output(&mut self) -> BytesMut {
        self.output.split()
    }

    /// Create the target namespace and open the XML document
    ///
    /// Runs once; compiling calls it implicitly.
    pub fn begin(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        if self.options.uses_repository() {
            match self.repository.create_namespace(&self.namespace) {
                Ok(()) => info!(namespace = %self.namespace, "created namespace"),
                Err(e) if e.code() == StatusCode::AlreadyExists => {}
                Err(e) => {
                    let ns = self.namespace.to_string();
                    return Err(self.fatal(MessageCode::NamespaceCreateError, &[&ns, &e.message()]));
                }
            }
        }

        if self.options.xml() {
            self.output.put_slice(XML_PROLOGUE.as_bytes());
            self.output.put_slice(
                format!("<!-- Generated by cimmof {} -->\n", env!("CARGO_PKG_VERSION")).as_bytes(),
            );
            self.output
                .put_slice(b"<CIM CIMVERSION=\"2.0\" DTDVERSION=\"2.0\">\n<DECLARATION>\n<DECLGROUP>\n");
        }
        Ok(())
    }

    /// Close the XML document and let the repository flush
    pub fn finish(&mut self) -> Result<()> {
        self.begin()?;
        if self.options.xml() {
            self.output.put_slice(XML_EPILOGUE.as_bytes());
        }
        self.repository.finish()?;
        Ok(())
    }

    /// Compile each file in order, then [`finish`](Self::finish)
    pub fn compile_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        self.begin()?;
        for path in paths {
            self.compile_file(path.as_ref())?;
        }
        self.finish()
    }

    pub fn compile_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|e| MofError::io(path, e))?;
        let dir = path.parent().map(Path::to_path_buf);
        self.compile_source(&path.display().to_string(), dir, &text)
    }

    /// Compile MOF text; `name` is used in diagnostics
    pub fn compile_str(&mut self, name: &str, text: &str) -> Result<()> {
        self.compile_source(name, None, text)
    }

    fn compile_source(&mut self, name: &str, dir: Option<PathBuf>, text: &str) -> Result<()> {
        self.begin()?;
        info!(file = name, "compiling");

        let tokens = match Lexer::new(text).tokenize() {
            Ok(tokens) => tokens,
            Err(e) => {
                let e = e.in_file(name);
                self.record(Severity::Error, MessageCode::ParserSyntaxError, e.to_string());
                return Err(e);
            }
        };

        self.context.push_file(name, dir);
        let result = Parser::new(self, tokens).parse_file();
        self.context.pop_file();
        result
    }

    // --- diagnostics ---

    fn record(&mut self, severity: Severity, code: MessageCode, message: String) {
        match severity {
            Severity::Warning => {
                if self.options.suppress_warnings || self.options.suppress_all_messages {
                    return;
                }
                warn!(code = %code, "{message}");
            }
            Severity::Error => {
                if !self.options.suppress_all_messages {
                    error!(code = %code, "{message}");
                }
            }
        }
        self.diagnostics.push(Diagnostic {
            severity,
            code,
            message,
        });
    }

    fn warning(&mut self, code: MessageCode, args: &[&str]) {
        self.record(Severity::Warning, code, code.format(args));
    }

    /// Record an error and build the fatal parse error for it
    pub(crate) fn fatal(&mut self, code: MessageCode, args: &[&str]) -> MofError {
        let message = code.format(args);
        self.record(Severity::Error, code, message.clone());
        self.context.error(message)
    }

    pub(crate) fn syntax_error(&mut self, message: &str) -> MofError {
        let err = self.context.error(message);
        self.record(Severity::Error, MessageCode::ParserSyntaxError, err.to_string());
        err
    }

    /// Turn an object model failure into a fatal error; the failure text
    /// becomes the last template argument
    pub(crate) fn or_fatal<T>(
        &mut self,
        result: cim::Result<T>,
        code: MessageCode,
        args: &[&str],
    ) -> Result<T> {
        result.map_err(|e| {
            let detail = e.message();
            let mut args = args.to_vec();
            args.push(&detail);
            self.fatal(code, &args)
        })
    }

    // --- output ---

    fn emit(
        &mut self,
        header: MessageCode,
        write: impl FnOnce(&mut BytesMut) -> cim_xml::Result<()>,
    ) -> Result<()> {
        if !self.options.xml() && !self.options.trace {
            return Ok(());
        }
        let xml = to_xml_string(write)?;
        let pretty = indented_print(&xml, DEFAULT_INDENT_CHARS)?;

        if self.options.xml() {
            self.output.put_slice(b"<VALUE.OBJECT>\n");
            self.output.put_slice(pretty.as_bytes());
            self.output.put_slice(b"</VALUE.OBJECT>\n\n");
        } else {
            debug!(stage = %header, "{}", pretty.trim_end());
            self.output.put_slice(header.format(&[]).as_bytes());
            self.output.put_u8(b'\n');
            self.output.put_slice(pretty.as_bytes());
            self.output.put_slice(MessageCode::TabOk.format(&[]).as_bytes());
            self.output.put_u8(b'\n');
        }
        Ok(())
    }

    // --- lookups ---

    fn lookup_qualifier_decl(&mut self, name: &CimName) -> Result<Option<QualifierDecl>> {
        match self.repository.get_qualifier_decl(&self.namespace, name) {
            Ok(decl) => Ok(Some(decl)),
            Err(e) if is_missing(&e) => Ok(self.session.qualifiers.get(name).cloned()),
            Err(e) => {
                let name = name.to_string();
                Err(self.fatal(MessageCode::GetQualifierDeclError, &[&name, &e.message()]))
            }
        }
    }

    fn lookup_class(&mut self, name: &CimName) -> Result<Option<Class>> {
        match self.repository.get_class(&self.namespace, name) {
            Ok(class) => Ok(Some(class)),
            Err(e) if is_missing(&e) => Ok(self.session.classes.get(name).cloned()),
            Err(e) => {
                let (name, ns) = (name.to_string(), self.namespace.to_string());
                Err(self.fatal(MessageCode::GetClassError, &[&name, &ns, &e.message()]))
            }
        }
    }

    /// Class an instance declaration names; fatal when unknown
    pub(crate) fn class_for(&mut self, name: &CimName) -> Result<Class> {
        match self.lookup_class(name)? {
            Some(class) => Ok(class),
            None => {
                let (name, ns) = (name.to_string(), self.namespace.to_string());
                Err(self.fatal(MessageCode::GetClassError, &[&name, &ns, "not found"]))
            }
        }
    }

    /// Declared shape of `name` in `class` or its superclasses
    ///
    /// An undeclared property is typed as a `false` boolean.
    pub(crate) fn property_template(&mut self, class: &Class, name: &CimName) -> Result<Property> {
        let mut current = Some(class.clone());
        let mut depth = 0;
        while let Some(class) = current {
            if let Some(property) = class.property(name)? {
                return Ok(property);
            }
            depth += 1;
            current = match class.super_class_name()? {
                Some(super_class) if depth < MAX_CLASS_DEPTH => self.lookup_class(&super_class)?,
                _ => None,
            };
        }
        debug!(property = %name, "undeclared instance property");
        Ok(Property::new(name.clone(), false)?)
    }

    // --- values ---

    /// Typed value for an initializer; fatal on a literal that does not fit
    pub(crate) fn literal_value(
        &mut self,
        cim_type: CimType,
        shape: Shape,
        init: &Initializer,
    ) -> Result<CimValue> {
        create_value(cim_type, shape, init).map_err(|e| {
            let ty = e.cim_type.to_string();
            self.fatal(MessageCode::InvalidLiteralValue, &[&ty, &e.reason])
        })
    }

    /// Value and declared flavor for a qualifier use
    ///
    /// A qualifier given without a value takes `true` when it is a scalar
    /// boolean and its declared default otherwise.
    pub(crate) fn qualifier_value(
        &mut self,
        name: &CimName,
        init: Option<&Initializer>,
    ) -> Result<(CimValue, cim::Flavor)> {
        let Some(decl) = self.lookup_qualifier_decl(name)? else {
            let name = name.to_string();
            return Err(self.fatal(MessageCode::GetQualifierDeclError, &[&name, "not declared"]));
        };
        let cim_type = decl.cim_type()?;
        let is_array = decl.is_array()?;
        let value = match init {
            None if cim_type == CimType::Boolean && !is_array => CimValue::from(true),
            None => decl.value()?,
            Some(init) => {
                let shape = if is_array {
                    Shape::Array(decl.array_size()?)
                } else {
                    Shape::Scalar
                };
                self.literal_value(cim_type, shape, init)?
            }
        };
        Ok((value, decl.flavor()?))
    }

    pub(crate) fn alias_path(&mut self, alias: &str) -> Result<ObjectPath> {
        match self.context.alias(alias) {
            Some(path) => Ok(path.clone()),
            None => Err(self.fatal(MessageCode::InstanceAliasNotFound, &[alias])),
        }
    }

    pub(crate) fn class_alias(&mut self, alias: &str, class: &CimName) -> MofError {
        let class = class.to_string();
        self.fatal(MessageCode::ClassAliasFound, &[alias, &class])
    }

    pub(crate) fn add_instance_alias(&mut self, alias: &str, instance: &Instance) -> Result<()> {
        let class_name = instance.class_name()?;
        let Some(class) = self.lookup_class(&class_name)? else {
            let class_name = class_name.to_string();
            return Err(self.fatal(MessageCode::InstanceAliasClassNotFound, &[alias, &class_name]));
        };
        let path = self.or_fatal(instance.build_path(&class), MessageCode::AddInstanceError, &[])?;
        if !self.context.add_alias(alias, path) {
            return Err(self.fatal(MessageCode::InstanceAliasExists, &[alias]));
        }
        Ok(())
    }

    // --- building ---

    pub(crate) fn apply_qualifiers(
        &mut self,
        qualifiers: Vec<Qualifier>,
        mut add: impl FnMut(Qualifier) -> cim::Result<()>,
    ) -> Result<()> {
        for qualifier in qualifiers {
            let name = qualifier.name()?.to_string();
            let result = add(qualifier);
            self.or_fatal(result, MessageCode::ApplyQualifierError, &[&name])?;
        }
        Ok(())
    }

    pub(crate) fn apply_property(&mut self, class: &Class, property: Property) -> Result<()> {
        let name = property.name()?.to_string();
        match class.add_property(property) {
            Ok(()) => Ok(()),
            Err(CimError::AlreadyExists(_)) => {
                let class = class.class_name()?.to_string();
                self.warning(MessageCode::PropertyAlreadyExistsWarning, &[&class, &name]);
                Ok(())
            }
            Err(e) => {
                let class = class.class_name()?.to_string();
                Err(self.fatal(MessageCode::ApplyingPropertyError, &[&class, &name, &e.message()]))
            }
        }
    }

    pub(crate) fn apply_method(&mut self, class: &Class, method: Method) -> Result<()> {
        let name = method.name()?.to_string();
        match class.add_method(method) {
            Ok(()) => Ok(()),
            Err(CimError::AlreadyExists(_)) => {
                let class = class.class_name()?.to_string();
                self.warning(MessageCode::MethodAlreadyExistsWarning, &[&name, &class]);
                Ok(())
            }
            Err(e) => {
                let class = class.class_name()?.to_string();
                Err(self.fatal(MessageCode::ApplyMethodError, &[&name, &class, &e.message()]))
            }
        }
    }

    pub(crate) fn apply_parameter(&mut self, method: &Method, parameter: Parameter) -> Result<()> {
        let name = parameter.name()?.to_string();
        let method_name = method.name()?.to_string();
        let result = method.add_parameter(parameter);
        self.or_fatal(result, MessageCode::ApplyParameterError, &[&name, &method_name])
    }

    pub(crate) fn apply_instance_property(
        &mut self,
        instance: &Instance,
        property: Property,
    ) -> Result<()> {
        let name = property.name()?.to_string();
        match instance.add_property(property) {
            Ok(()) => Ok(()),
            Err(CimError::AlreadyExists(_)) => {
                let class = instance.class_name()?.to_string();
                self.warning(MessageCode::InstancePropertyExistsWarning, &[&class, &name]);
                Ok(())
            }
            Err(e) => {
                let class = instance.class_name()?.to_string();
                Err(self.fatal(
                    MessageCode::ApplyInstancePropertyError,
                    &[&class, &name, &e.message()],
                ))
            }
        }
    }

    // --- completed declarations ---

    pub(crate) fn pragma(&mut self, name: &str, value: &str) -> Result<()> {
        if name.eq_ignore_ascii_case("include") {
            return self.include(value);
        }
        if name.eq_ignore_ascii_case("locale") {
            if value != "en_US" {
                self.warning(MessageCode::LocaleNotImplementedWarning, &[value]);
            }
            return Ok(());
        }
        self.warning(MessageCode::PragmaNotImplementedWarning, &[name]);
        Ok(())
    }

    /// Compile an included file, searching the including file's directory
    /// and then the configured include paths
    fn include(&mut self, file: &str) -> Result<()> {
        if self.context.depth() >= MAX_INCLUDE_DEPTH {
            return Err(self.fatal(MessageCode::IncludeTooDeep, &[file]));
        }

        let requested = Path::new(file);
        let mut candidates = Vec::new();
        if requested.is_absolute() {
            candidates.push(requested.to_path_buf());
        } else {
            match self.context.current_dir() {
                Some(dir) => candidates.push(dir.join(requested)),
                None => candidates.push(requested.to_path_buf()),
            }
            candidates.extend(self.options.include_paths.iter().map(|p| p.join(requested)));
        }

        let Some(path) = candidates.into_iter().find(|p| p.is_file()) else {
            return Err(self.fatal(MessageCode::IncludeNotFound, &[file]));
        };
        debug!(path = %path.display(), "including");
        self.compile_file(&path)
    }

    pub(crate) fn add_qualifier_decl(&mut self, decl: QualifierDecl) -> Result<()> {
        self.emit(MessageCode::AddQualifier, |out| {
            append_qualifier_decl_element(out, &decl)
        })?;
        let name = decl.name()?;

        if self.options.uses_repository() {
            let result = self.repository.add_qualifier(&self.namespace, &decl);
            let name = name.to_string();
            self.or_fatal(result, MessageCode::AddQualifierError, &[&name])?;
        } else {
            self.session.qualifiers.insert(name, decl);
        }
        Ok(())
    }

    pub(crate) fn add_class(&mut self, class: Class) -> Result<()> {
        let name = class.class_name()?;

        // Update policy only applies to repository contents
        if !self.options.uses_repository() {
            self.emit(MessageCode::AddClass, |out| append_class_element(out, &class))?;
            self.session.classes.insert(name, class);
            return Ok(());
        }

        let existing = self.lookup_class(&name)?;
        let decision = update::decide(&class, existing.as_ref(), &self.options)?;
        debug!(class = %name, ?decision, "class update decision");

        match decision {
            UpdateDecision::Reject(MessageCode::NoClassUpdate) => {
                self.warning(MessageCode::ClassExistsWarning, &[name.as_str()]);
                return Ok(());
            }
            UpdateDecision::Reject(reason) => {
                let message =
                    MessageCode::ClassNotUpdated.format(&[name.as_str(), &reason.format(&[])]);
                self.record(Severity::Warning, reason, message);
                return Ok(());
            }
            UpdateDecision::Create | UpdateDecision::Modify => {}
        }

        self.emit(MessageCode::AddClass, |out| append_class_element(out, &class))?;

        let result = match decision {
            UpdateDecision::Modify => self.repository.modify_class(&self.namespace, &class),
            _ => self.repository.add_class(&self.namespace, &class),
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.code() == StatusCode::AlreadyExists => {
                self.warning(MessageCode::ClassExistsWarning, &[name.as_str()]);
                Ok(())
            }
            Err(e) => Err(self.fatal(MessageCode::AddClassError, &[name.as_str(), &e.message()])),
        }
    }

    pub(crate) fn add_instance(&mut self, instance: Instance) -> Result<()> {
        self.emit(MessageCode::AddInstance, |out| {
            append_instance_element(out, &instance, true, true, &PropertyList::all())
        })?;

        if !self.options.uses_repository() {
            return Ok(());
        }
        match self.repository.add_instance(&self.namespace, &instance) {
            Ok(path) => {
                debug!(path = %path, "added instance");
                Ok(())
            }
            Err(e) if e.code() == StatusCode::AlreadyExists => {
                self.warning(MessageCode::InstanceExistsWarning, &[&e.message()]);
                Ok(())
            }
            Err(e) => Err(self.fatal(MessageCode::AddInstanceError, &[&e.message()])),
        }
    }
}

fn is_missing(e: &CimError) -> bool {
    matches!(e.code(), StatusCode::NotFound | StatusCode::InvalidNamespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OperationMode;
    use crate::repository::MemoryRepository;

    const QUALIFIERS: &str = r#"
        qualifier Key : boolean = false, scope(property, reference), flavor(DisableOverride, ToSubclass);
        qualifier Description : string = null, scope(any), flavor(Translatable);
        qualifier Version : string = null, scope(class);
        qualifier Experimental : boolean = false, scope(any), flavor(Restricted);
    "#;

    fn ns() -> NamespaceName {
        NamespaceName::new("root/cimv2").unwrap()
    }

    fn compiler(options: CompilerOptions) -> MofCompiler<MemoryRepository> {
        let mut compiler = MofCompiler::new(MemoryRepository::new(), options).unwrap();
        compiler.compile_str("qualifiers.mof", QUALIFIERS).unwrap();
        compiler
    }

    fn name(s: &str) -> CimName {
        CimName::new(s).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_namespace() {
        let options = CompilerOptions::default().with_namespace("root//x");
        assert!(MofCompiler::new(MemoryRepository::new(), options).is_err());
    }

    #[test]
    fn test_compiles_into_repository() {
        let mut c = compiler(CompilerOptions::default());
        c.compile_str(
            "test.mof",
            r#"
            [Description("A thing")]
            class Thing {
                [Key] string Name;
                uint32 Size = 5;
            };
            instance of Thing { Name = "one"; Size = 7; };
            "#,
        )
        .unwrap();

        let repo = c.repository();
        assert_eq!(repo.qualifier_count(&ns()), 4);
        let class = repo.get_class(&ns(), &name("Thing")).unwrap();
        assert_eq!(class.key_names().unwrap(), vec![name("Name")]);
        let instances = repo.instances(&ns()).unwrap();
        assert_eq!(instances.len(), 1);
        let size = instances[0].property(&name("Size")).unwrap().unwrap();
        assert_eq!(size.value().unwrap(), CimValue::from(7u32));
        assert!(c.diagnostics().is_empty());
    }

    #[test]
    fn test_unknown_qualifier_is_fatal() {
        let mut c = compiler(CompilerOptions::default());
        let err = c
            .compile_str("bad.mof", "[Bogus] class A { };")
            .unwrap_err();
        assert!(matches!(err, MofError::Parse { ref file, .. } if file == "bad.mof"));
        assert_eq!(c.diagnostics()[0].code, MessageCode::GetQualifierDeclError);
        assert!(c.has_errors());
    }

    #[test]
    fn test_duplicate_class_warns() {
        let mut c = compiler(CompilerOptions::default());
        c.compile_str("a.mof", "class A { };").unwrap();
        c.compile_str("a.mof", "class A { };").unwrap();
        assert_eq!(c.diagnostics().len(), 1);
        assert_eq!(c.diagnostics()[0].code, MessageCode::ClassExistsWarning);
        assert_eq!(c.diagnostics()[0].severity, Severity::Warning);
    }

    #[test]
    fn test_suppressed_warnings_are_not_recorded() {
        let mut options = CompilerOptions::default();
        options.suppress_warnings = true;
        let mut c = compiler(options);
        c.compile_str("a.mof", "class A { }; class A { };").unwrap();
        assert!(c.diagnostics().is_empty());
    }

    #[test]
    fn test_version_update_policy() {
        let mut c = compiler(CompilerOptions::default().with_update_class(true));
        c.compile_str("v1.mof", r#"[Version("2.7.0")] class X { };"#).unwrap();

        c.compile_str("v1.mof", r#"[Version("2.7.0")] class X { };"#).unwrap();
        assert_eq!(c.diagnostics().last().unwrap().code, MessageCode::SameVersion);

        c.compile_str("v2.mof", r#"[Version("2.8.0")] class X { uint8 New; };"#).unwrap();
        assert_eq!(c.diagnostics().last().unwrap().code, MessageCode::NoVersionUpdate);
        let stored = c.repository().get_class(&ns(), &name("X")).unwrap();
        assert_eq!(stored.property_count().unwrap(), 0);
    }

    #[test]
    fn test_allow_version_modifies() {
        let options = CompilerOptions::default()
            .with_update_class(true)
            .with_allow_version(true);
        let mut c = compiler(options);
        c.compile_str("v1.mof", r#"[Version("2.7.0")] class X { };"#).unwrap();
        c.compile_str("v2.mof", r#"[Version("2.8.0")] class X { uint8 New; };"#).unwrap();
        assert!(c.diagnostics().is_empty());
        let stored = c.repository().get_class(&ns(), &name("X")).unwrap();
        assert_eq!(stored.property_count().unwrap(), 1);
    }

    #[test]
    fn test_xml_mode_writes_document() {
        let mut c = compiler(CompilerOptions::xml_output());
        c.compile_str("a.mof", "class A { string S = \"x\"; };").unwrap();
        c.finish().unwrap();

        let text = String::from_utf8(c.output().to_vec()).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\"?>\n"));
        assert!(text.contains("<CIM CIMVERSION=\"2.0\" DTDVERSION=\"2.0\">"));
        assert!(text.contains("<VALUE.OBJECT>\n"));
        assert!(text.contains("<CLASS NAME=\"A\">\n"));
        assert!(text.ends_with("</DECLGROUP>\n</DECLARATION>\n</CIM>\n"));
        assert!(!c.repository().has_namespace(&ns()));
    }

    #[test]
    fn test_xml_mode_resolves_session_classes() {
        let mut c = compiler(CompilerOptions::xml_output());
        c.compile_str(
            "a.mof",
            "class A { [Key] uint32 Id; }; instance of A { Id = 1; };",
        )
        .unwrap();
        let text = String::from_utf8(c.take_output().to_vec()).unwrap();
        assert!(text.contains("<INSTANCE CLASSNAME=\"A\">\n"));
        assert!(c.output().is_empty());
    }

    #[test]
    fn test_trace_mode_echoes_and_stores() {
        let mut c = compiler(CompilerOptions::default().with_trace(true));
        c.take_output();
        c.compile_str("a.mof", "class A { };").unwrap();
        let text = String::from_utf8(c.output().to_vec()).unwrap();
        assert!(text.starts_with("Compiling class declaration\n"));
        assert!(text.ends_with("\t-- OK\n"));
        assert!(c.repository().get_class(&ns(), &name("A")).is_ok());
    }

    #[test]
    fn test_syntax_only_stores_nothing() {
        let mut c = compiler(CompilerOptions::default().with_mode(OperationMode::SyntaxOnly));
        c.compile_str("a.mof", "class A { };").unwrap();
        assert!(c.output().is_empty());
        assert!(!c.repository().has_namespace(&ns()));
    }

    #[test]
    fn test_experimental_class_written_without_repository() {
        let mut c = compiler(CompilerOptions::xml_output());
        c.compile_str("e.mof", "[Experimental] class A { };").unwrap();
        let text = String::from_utf8(c.take_output().to_vec()).unwrap();
        assert!(text.contains("<CLASS NAME=\"A\">\n"));
        assert!(c.diagnostics().is_empty());

        let mut c = compiler(CompilerOptions::default().with_mode(OperationMode::SyntaxOnly));
        c.compile_str("e.mof", "[Experimental] class A { };").unwrap();
        assert!(c.diagnostics().is_empty());

        // A repository still needs experimental updates enabled
        let mut c = compiler(CompilerOptions::default());
        c.compile_str("e.mof", "[Experimental] class A { };").unwrap();
        assert_eq!(c.diagnostics()[0].code, MessageCode::NoExperimentalUpdate);
        assert!(c.repository().get_class(&ns(), &name("A")).is_err());
    }

    #[test]
    fn test_pragmas() {
        let mut c = compiler(CompilerOptions::default());
        c.compile_str("p.mof", "#pragma locale(\"en_US\")").unwrap();
        assert!(c.diagnostics().is_empty());
        c.compile_str("p.mof", "#pragma locale(\"fr_FR\")").unwrap();
        c.compile_str("p.mof", "#pragma namespace(\"root/x\")").unwrap();
        let codes: Vec<_> = c.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                MessageCode::LocaleNotImplementedWarning,
                MessageCode::PragmaNotImplementedWarning
            ]
        );
    }

    #[test]
    fn test_missing_include_is_fatal() {
        let mut c = compiler(CompilerOptions::default());
        let err = c
            .compile_str("i.mof", "#pragma include(\"does-not-exist.mof\")")
            .unwrap_err();
        assert!(err.to_string().contains("does-not-exist.mof"));
        assert_eq!(c.diagnostics()[0].code, MessageCode::IncludeNotFound);
    }

    #[test]
    fn test_lexer_error_is_recorded() {
        let mut c = compiler(CompilerOptions::default());
        let err = c.compile_str("l.mof", "class A { string S = \"open; };").unwrap_err();
        assert!(matches!(err, MofError::Lexer { ref file, .. } if file == "l.mof"));
        assert_eq!(c.diagnostics()[0].code, MessageCode::ParserSyntaxError);
    }
}
