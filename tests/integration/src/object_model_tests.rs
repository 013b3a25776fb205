//! Object Model Tests - Shared Handles Across Containers
//!
//! These tests exercise the object model the way the compiler and the
//! writers use it together:
//! - Handles sharing one representation across threads and containers
//! - Deep copies that stay independent
//! - Renames while a member is held by a container
//! - Paths built from class keys and parsed back

mod common;

use std::sync::Arc;
use std::thread;

use cim::{
    CimDateTime, CimError, CimType, CimValue, Class, Flavor, Instance, Method, ObjectPath,
    Parameter, Property, Qualifier, StatusCode,
};

use common::*;

fn keyed_class() -> Class {
    let class = Class::new(name("Test_Host"), None);
    let id = Property::new(name("Id"), "none").unwrap();
    id.add_qualifier(Qualifier::new(name("Key"), true, Flavor::DEFAULTS))
        .unwrap();
    class.add_property(id).unwrap();
    class
        .add_property(Property::new(name("Load"), 0u32).unwrap())
        .unwrap();
    class
}

/// Test: a value written through one handle is seen through every other
#[test]
fn test_shared_representation_across_threads() {
    init_logging();

    let instance = Instance::new(name("Test_Host"));
    instance
        .add_property(Property::new(name("Load"), 0u32).unwrap())
        .unwrap();
    let shared = Arc::new(instance.clone());

    let workers: Vec<_> = (0..4u32)
        .map(|i| {
            let handle = Arc::clone(&shared);
            thread::spawn(move || {
                let load = handle.property(&name("Load")).unwrap().unwrap();
                load.set_value(CimValue::from(i)).unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let load = instance.property(&name("Load")).unwrap().unwrap();
    let value = load.value().unwrap();
    assert!((0..4u32).any(|i| value == CimValue::from(i)), "{value:?}");
    assert!(instance.identical(&shared));

    println!("\n=== Shared Representation Test: PASSED ===");
}

/// Test: a deep copy does not see later changes to the original
#[test]
fn test_deep_clone_is_independent() {
    init_logging();

    let class = keyed_class();
    let copy = class.deep_clone().unwrap();
    assert!(class.identical(&copy));

    class
        .add_property(Property::new(name("Extra"), true).unwrap())
        .unwrap();
    let id = class.property(&name("Id")).unwrap().unwrap();
    id.set_value(CimValue::from("changed")).unwrap();

    assert_eq!(copy.property_count().unwrap(), 2);
    let copied_id = copy.property(&name("Id")).unwrap().unwrap();
    assert_eq!(copied_id.value().unwrap(), CimValue::from("none"));
    assert!(!class.identical(&copy));

    println!("\n=== Deep Clone Test: PASSED ===");
}

/// Test: members held by a container are renamed through the container
#[test]
fn test_rename_inside_container() {
    init_logging();

    let class = keyed_class();
    let load = class.property(&name("Load")).unwrap().unwrap();
    let err = load.set_name(name("Weight")).unwrap_err();
    assert!(matches!(err, CimError::InContainer(_)));

    let index = class.find_property(&name("Load")).unwrap().unwrap();
    class.rename_property(index, name("Weight")).unwrap();
    assert!(class.property(&name("Load")).unwrap().is_none());
    assert_eq!(load.name().unwrap(), name("Weight"));
    assert_eq!(class.find_property(&name("weight")).unwrap(), Some(index));

    let err = class
        .add_property(Property::new(name("WEIGHT"), 1u8).unwrap())
        .unwrap_err();
    assert!(matches!(err, CimError::AlreadyExists(_)));

    let method = Method::new(name("Reset"), CimType::Boolean);
    method
        .add_parameter(Parameter::new(name("Mode"), CimType::String, false, 0, None).unwrap())
        .unwrap();
    method.rename_parameter(0, name("Level")).unwrap();
    assert_eq!(method.get_parameter(0).unwrap().name().unwrap(), name("Level"));
}

/// Test: instance paths come from the class keys and survive a parse
#[test]
fn test_instance_path_round_trip() {
    init_logging();

    let class = keyed_class();
    let instance = Instance::new(name("Test_Host"));
    instance
        .add_property(Property::new(name("Id"), "web \"01\"").unwrap())
        .unwrap();
    instance
        .add_property(Property::new(name("Load"), 12u32).unwrap())
        .unwrap();

    let path = instance
        .build_path(&class)
        .unwrap()
        .with_host("server")
        .with_namespace(namespace());
    let text = path.to_string();
    assert_eq!(text, r#"//server/root/cimv2:Test_Host.Id="web \"01\"""#);

    let parsed = ObjectPath::parse(&text).unwrap();
    assert_eq!(parsed, path);
    assert!(parsed.identical(&path));

    let bare = Instance::new(name("Test_Host"));
    let err = bare.build_path(&class).unwrap_err();
    assert_eq!(err.code(), StatusCode::NotFound);
}

/// Test: uninitialized handles fail on every access
#[test]
fn test_uninitialized_handles() {
    let property = Property::default();
    assert!(property.is_uninitialized());
    assert!(matches!(property.name(), Err(CimError::UninitializedObject)));

    let class = Class::default();
    assert!(matches!(class.property_count(), Err(CimError::UninitializedObject)));
    assert!(matches!(
        class.add_property(Property::new(name("P"), 1u8).unwrap()),
        Err(CimError::UninitializedObject)
    ));
}

/// Test: typed values keep their shape
#[test]
fn test_value_shapes() {
    let stamp = CimDateTime::new("20240115093000.000000+060").unwrap();
    let value = CimValue::from(stamp);
    assert_eq!(value.cim_type(), CimType::DateTime);
    assert!(!value.is_array());

    let null = CimValue::null(CimType::Uint16, true, 4);
    assert!(null.is_null());
    assert!(null.is_array());
    assert_eq!(null.array_size(), 4);

    let property = Property::with_details(name("Slots"), null, 4, None, None, false).unwrap();
    assert_eq!(property.array_size().unwrap(), 4);

    let too_big = CimValue::from(vec![1u16, 2, 3, 4, 5]);
    assert!(Property::with_details(name("Slots"), too_big, 4, None, None, false).is_err());

    assert!(CimDateTime::new("not a date").is_err());
    assert!(CimDateTime::new("00000001020304.000000:000").unwrap().is_interval());
}
