//! MOF Compile Tests - Source to Repository and CIM-XML
//!
//! These tests drive the compiler end to end:
//! - A small schema with inheritance, associations and aliases
//! - The class update policy across compilations
//! - CIM-XML output documents
//! - Include files and error reporting

mod common;

use std::sync::Arc;

use cim::{CimType, CimValue, KeyType, StatusCode};
use cimmof::{
    CompilerOptions, MemoryRepository, MessageCode, MofCompiler, MofError, OperationMode,
    Repository, Severity,
};

use common::*;

/// Test: the whole schema lands in the repository
#[test]
fn test_schema_compiles_into_repository() {
    init_logging();

    let mut c = compiler();
    c.compile_str("schema.mof", SCHEMA_MOF).unwrap();
    c.finish().unwrap();
    assert!(c.diagnostics().is_empty(), "{:?}", c.diagnostics());

    let repo = c.repository();
    let ns = namespace();
    assert_eq!(repo.qualifier_count(&ns), 11);

    let mut classes: Vec<String> = repo
        .class_names(&ns)
        .iter()
        .map(|n| n.to_string())
        .collect();
    classes.sort();
    assert_eq!(
        classes,
        ["Test_Disk", "Test_ManagedElement", "Test_System", "Test_SystemDisk"]
    );

    let system = repo.get_class(&ns, &name("Test_System")).unwrap();
    assert_eq!(system.super_class_name().unwrap(), Some(name("Test_ManagedElement")));
    assert_eq!(system.method_count().unwrap(), 1);

    let caption = system.property(&name("Caption")).unwrap().unwrap();
    assert!(caption.propagated().unwrap());
    assert_eq!(caption.class_origin().unwrap(), Some(name("Test_ManagedElement")));
    let status = system.property(&name("Status")).unwrap().unwrap();
    assert!(!status.propagated().unwrap());
    assert_eq!(status.class_origin().unwrap(), Some(name("Test_System")));
    assert_eq!(status.value().unwrap(), CimValue::from(0u16));

    let link = repo.get_class(&ns, &name("Test_SystemDisk")).unwrap();
    assert!(link.is_association().unwrap());
    let abstract_root = repo.get_class(&ns, &name("Test_ManagedElement")).unwrap();
    assert!(abstract_root.is_abstract().unwrap());

    println!("\n=== Schema Compile Test: PASSED ===");
}

/// Test: instances are typed from their classes and aliases resolve
#[test]
fn test_instances_and_aliases() {
    init_logging();

    let mut c = compiler();
    c.compile_str("schema.mof", SCHEMA_MOF).unwrap();

    let instances = c.repository().instances(&namespace()).unwrap();
    assert_eq!(instances.len(), 3);

    let system = &instances[0];
    let install = system.property(&name("InstallDate")).unwrap().unwrap();
    assert_eq!(install.cim_type().unwrap(), CimType::DateTime);
    let status = system.property(&name("Status")).unwrap().unwrap();
    assert_eq!(status.value().unwrap(), CimValue::from(1u16));

    let disk = &instances[1];
    let capacity = disk.property(&name("Capacity")).unwrap().unwrap();
    assert_eq!(capacity.value().unwrap(), CimValue::from(0x10_0000_0000u64));
    let temperature = disk.property(&name("Temperature")).unwrap().unwrap();
    assert_eq!(temperature.value().unwrap(), CimValue::from(41.5f32));
    let partitions = disk.property(&name("Partitions")).unwrap().unwrap();
    assert_eq!(partitions.value().unwrap(), CimValue::from(vec!["boot", "root"]));

    let link = &instances[2];
    let owner = link.property(&name("Owner")).unwrap().unwrap();
    assert_eq!(owner.reference_class_name().unwrap(), Some(name("Test_System")));
    assert_eq!(owner.value().unwrap().cim_type(), CimType::Reference);

    let class = c
        .repository()
        .get_class(&namespace(), &name("Test_SystemDisk"))
        .unwrap();
    let path = link.build_path(&class).unwrap();
    let bindings = path.key_bindings();
    assert_eq!(bindings.len(), 2);
    assert!(bindings.iter().all(|b| b.key_type() == KeyType::Reference));
    assert_eq!(bindings[0].name(), &name("Owner"));
    assert!(bindings[0].value().contains("alpha"));

    let stored = c.repository().get_instance(&namespace(), &path).unwrap();
    assert!(stored.property(&name("Part")).unwrap().is_some());

    println!("\n=== Instances And Aliases Test: PASSED ===");
}

/// Test: recompiling a class follows the version policy
#[test]
fn test_class_version_updates() {
    init_logging();

    let repo = Arc::new(MemoryRepository::new());
    let base = r#"[Version("2.7.0")] class Test_Versioned { [Key] string Id; };"#;
    let same = r#"[Version("2.7.0")] class Test_Versioned { [Key] string Id; string Extra; };"#;
    let newer = r#"[Version("2.8.0")] class Test_Versioned { [Key] string Id; string Extra; };"#;

    let mut first = MofCompiler::new(Arc::clone(&repo), CompilerOptions::default()).unwrap();
    first.compile_str("qualifiers.mof", QUALIFIERS_MOF).unwrap();
    first.compile_str("v1.mof", base).unwrap();

    // Without update_class an existing class is left alone
    let mut plain = MofCompiler::new(Arc::clone(&repo), CompilerOptions::default()).unwrap();
    plain.compile_str("v2.mof", newer).unwrap();
    assert_eq!(plain.diagnostics()[0].code, MessageCode::ClassExistsWarning);

    let updating = CompilerOptions::default().with_update_class(true);
    let mut c = MofCompiler::new(Arc::clone(&repo), updating.clone()).unwrap();
    c.compile_str("same.mof", same).unwrap();
    c.compile_str("newer.mof", newer).unwrap();
    let codes: Vec<MessageCode> = c.diagnostics().iter().map(|d| d.code).collect();
    assert_eq!(codes, [MessageCode::SameVersion, MessageCode::NoVersionUpdate]);
    assert_eq!(
        c.diagnostics()[1].message,
        "Warning: class Test_Versioned was not updated: version change not enabled"
    );

    let class = repo.get_class(&namespace(), &name("Test_Versioned")).unwrap();
    assert_eq!(class.property_count().unwrap(), 1);

    let mut c = MofCompiler::new(Arc::clone(&repo), updating.with_allow_version(true)).unwrap();
    c.compile_str("newer.mof", newer).unwrap();
    assert!(c.diagnostics().is_empty());
    let class = repo.get_class(&namespace(), &name("Test_Versioned")).unwrap();
    assert_eq!(class.property_count().unwrap(), 2);

    println!("\n=== Class Version Update Test: PASSED ===");
}

/// Test: XML mode produces one declaration document and leaves the
/// repository empty
#[test]
fn test_xml_output_document() {
    init_logging();

    let mut c = compiler_with(CompilerOptions::xml_output());
    c.compile_str("schema.mof", SCHEMA_MOF).unwrap();
    c.finish().unwrap();

    let xml = String::from_utf8(c.output().to_vec()).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\"?>\n"));
    assert!(xml.contains("<CIM CIMVERSION=\"2.0\" DTDVERSION=\"2.0\">\n<DECLARATION>\n<DECLGROUP>\n"));
    assert!(xml.ends_with("</DECLGROUP>\n</DECLARATION>\n</CIM>\n"));

    // 11 qualifier declarations, 4 classes, 3 instances
    assert_eq!(xml.matches("<VALUE.OBJECT>").count(), 18);
    assert_eq!(xml.matches("<QUALIFIER.DECLARATION").count(), 11);
    assert!(xml.contains("<CLASS NAME=\"Test_System\" SUPERCLASS=\"Test_ManagedElement\">"));
    assert!(xml.contains("<INSTANCE CLASSNAME=\"Test_Disk\">"));
    assert!(xml.contains("<VALUE.ARRAY>\n"));
    assert!(xml.contains("  boot\n"));

    assert!(c.repository().class_names(&namespace()).is_empty());
    assert!(!c.repository().has_namespace(&namespace()));

    println!("\n=== XML Output Document Test: PASSED ===");
}

/// Test: syntax-only mode builds every object and stores none
#[test]
fn test_syntax_only() {
    init_logging();

    let options = CompilerOptions::default().with_mode(OperationMode::SyntaxOnly);
    let mut c = compiler_with(options);
    c.compile_str("schema.mof", SCHEMA_MOF).unwrap();
    c.finish().unwrap();
    assert!(c.output().is_empty());
    assert!(c.diagnostics().is_empty());
    assert!(!c.repository().has_namespace(&namespace()));
}

/// Test: includes resolve relative to the including file, then the
/// include paths
#[test]
fn test_include_search() {
    init_logging();

    let root = scratch_dir("include");
    let shared = scratch_dir("shared");
    std::fs::write(root.join("qualifiers.mof"), QUALIFIERS_MOF).unwrap();
    std::fs::write(
        shared.join("base.mof"),
        "class Test_Base { [Key] string Id; };",
    )
    .unwrap();
    std::fs::write(
        root.join("main.mof"),
        "#pragma include(\"qualifiers.mof\")\n\
         #pragma include(\"base.mof\")\n\
         class Test_Derived : Test_Base { uint8 Level; };\n",
    )
    .unwrap();

    let options = CompilerOptions::default().with_include_path(&shared);
    let mut c = MofCompiler::new(MemoryRepository::new(), options).unwrap();
    c.compile_files(&[root.join("main.mof")]).unwrap();

    let derived = c
        .repository()
        .get_class(&namespace(), &name("Test_Derived"))
        .unwrap();
    assert_eq!(derived.key_names().unwrap(), vec![name("Id")]);

    let mut missing = MofCompiler::new(MemoryRepository::new(), CompilerOptions::default()).unwrap();
    let err = missing.compile_files(&[root.join("main.mof")]).unwrap_err();
    assert!(matches!(err, MofError::Parse { line: 2, .. }), "{err}");
    assert_eq!(missing.diagnostics()[0].code, MessageCode::IncludeNotFound);

    let _ = std::fs::remove_dir_all(&root);
    let _ = std::fs::remove_dir_all(&shared);

    println!("\n=== Include Search Test: PASSED ===");
}

/// Test: the first error stops the compilation and names its position
#[test]
fn test_errors_stop_compilation() {
    init_logging();

    let mut c = compiler();
    let err = c
        .compile_str(
            "broken.mof",
            "class Test_A { [Key] string Id; };\n\
             instance of Test_A { Id = 7; };\n\
             class Test_B { };\n",
        )
        .unwrap_err();

    match &err {
        MofError::Parse { file, line, .. } => {
            assert_eq!(file, "broken.mof");
            assert_eq!(*line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    let d = &c.diagnostics()[0];
    assert_eq!(d.severity, Severity::Error);
    assert_eq!(d.code, MessageCode::InvalidLiteralValue);
    assert!(c.has_errors());

    let repo = c.repository();
    assert!(repo.get_class(&namespace(), &name("Test_A")).is_ok());
    let missing = repo.get_class(&namespace(), &name("Test_B")).unwrap_err();
    assert_eq!(missing.code(), StatusCode::NotFound);
}

/// Test: duplicate instances warn and keep the first
#[test]
fn test_duplicate_instance_warns() {
    init_logging();

    let mut c = compiler();
    c.compile_str(
        "dup.mof",
        r#"
        class Test_Item { [Key] uint32 Id; string Label; };
        instance of Test_Item { Id = 1; Label = "first"; };
        instance of Test_Item { Id = 1; Label = "second"; };
        "#,
    )
    .unwrap();

    let d = &c.diagnostics()[0];
    assert_eq!(d.severity, Severity::Warning);
    assert_eq!(d.code, MessageCode::InstanceExistsWarning);

    let instances = c.repository().instances(&namespace()).unwrap();
    assert_eq!(instances.len(), 1);
    let label = instances[0].property(&name("Label")).unwrap().unwrap();
    assert_eq!(label.value().unwrap(), CimValue::from("first"));
}
