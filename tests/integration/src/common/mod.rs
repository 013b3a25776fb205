//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use cim::{CimName, NamespaceName};
use cimmof::{CompilerOptions, MemoryRepository, MofCompiler};

/// Qualifier declarations every test schema starts from
pub const QUALIFIERS_MOF: &str = r#"
qualifier Abstract : boolean = false, scope(class, association, indication), flavor(Restricted);
qualifier Association : boolean = false, scope(class, association), flavor(DisableOverride);
qualifier Key : boolean = false, scope(property, reference), flavor(DisableOverride, ToSubclass);
qualifier Description : string = null, scope(any), flavor(Translatable);
qualifier Version : string = null, scope(class, association, indication), flavor(Restricted, Translatable);
qualifier Experimental : boolean = false, scope(any), flavor(Restricted);
qualifier In : boolean = true, scope(parameter), flavor(DisableOverride);
qualifier Out : boolean = false, scope(parameter), flavor(DisableOverride);
qualifier MaxLen : uint32 = null, scope(property, method, parameter);
qualifier ValueMap : string[], scope(property, method, parameter);
qualifier Values : string[], scope(property, method, parameter), flavor(Translatable);
"#;

/// A small managed-element schema with inheritance, an association and
/// aliased instances
pub const SCHEMA_MOF: &str = r#"
[Abstract, Version("2.7.0"), Description("Root of the managed element hierarchy")]
class Test_ManagedElement {
    string Caption;
    [MaxLen(1024)] string Description;
};

[Version("2.7.0")]
class Test_System : Test_ManagedElement {
    [Key, MaxLen(256)] string Name;
    [ValueMap{"0", "1", "2"}, Values{"Unknown", "Up", "Down"}] uint16 Status = 0;
    datetime InstallDate;
    uint32 Reboot([In] boolean Force, [In, Out] string Reason);
};

[Version("2.7.0")]
class Test_Disk : Test_ManagedElement {
    [Key] string DeviceId;
    uint64 Capacity;
    real32 Temperature;
    string Partitions[];
};

[Association, Version("2.7.0")]
class Test_SystemDisk {
    [Key] Test_System REF Owner;
    [Key] Test_Disk REF Part;
};

instance of Test_System as $Sys {
    Name = "alpha";
    Caption = "Build host";
    Status = 1;
    InstallDate = "20240115093000.000000+060";
};

instance of Test_Disk as $Disk0 {
    DeviceId = "disk0";
    Capacity = 0x1000000000;
    Temperature = 41.5;
    Partitions = {"boot", "root"};
};

instance of Test_SystemDisk {
    Owner = $Sys;
    Part = $Disk0;
};
"#;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn name(s: &str) -> CimName {
    CimName::new(s).expect("valid name")
}

pub fn namespace() -> NamespaceName {
    NamespaceName::new(cimmof::DEFAULT_NAMESPACE).expect("valid namespace")
}

/// Compiler over a fresh repository that has already seen [`QUALIFIERS_MOF`]
pub fn compiler_with(options: CompilerOptions) -> MofCompiler<MemoryRepository> {
    let mut compiler =
        MofCompiler::new(MemoryRepository::new(), options).expect("valid options");
    compiler
        .compile_str("qualifiers.mof", QUALIFIERS_MOF)
        .expect("qualifiers compile");
    compiler
}

pub fn compiler() -> MofCompiler<MemoryRepository> {
    compiler_with(CompilerOptions::default())
}

/// Fresh scratch directory under the system temp dir
pub fn scratch_dir(tag: &str) -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let dir = std::env::temp_dir().join(format!(
        "cimmof-{tag}-{}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
