//! Integration tests for configured runtimes
//!
//! Security policy, assertion settings, resources and package metadata.

use std::io::Read;

use jreflect::{
    ClassDescriptor, ClassHandle, ConfigError, FieldDescriptor, Modifiers, Package,
    ProtectionDomain, ReflectError, ReflectPermission, Runtime, RuntimeConfig, SecurityPolicy,
    Signer,
};

fn read_all(mut stream: Box<dyn Read + Send>) -> String {
    let mut text = String::new();
    stream.read_to_string(&mut text).unwrap();
    text
}

// ============================================================================
// Configuration
// ============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_runtime_from_toml() {
        let config = RuntimeConfig::from_toml_str(
            r#"
[assertions]
default = false
packages = { "com.acme" = true }
classes = { "com.acme.Main" = false }

[loader]
system_name = "main"
"#,
        )
        .unwrap();
        let runtime = Runtime::with_config(&config).unwrap();
        assert_eq!(runtime.system_loader().name(), "main");

        let loader = runtime.system_loader();
        for name in ["com.acme.Main", "com.acme.core.Engine", "org.other.Tool"] {
            loader.define_class(ClassDescriptor::class(name)).unwrap();
        }

        let status = |name: &str| ClassHandle::for_name(&runtime, name).unwrap().desired_assertion_status();
        assert!(!status("com.acme.Main"));
        assert!(status("com.acme.core.Engine"));
        assert!(!status("org.other.Tool"));
        // Bootstrap classes follow the bootstrap loader, which has no overrides
        assert!(!status("java.lang.String"));
    }

    #[test]
    fn test_resource_dirs_from_config_file() {
        let resources = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(resources.path().join("com/acme")).unwrap();
        std::fs::write(resources.path().join("com/acme/banner.txt"), "hello").unwrap();

        let config_dir = tempfile::tempdir().unwrap();
        let config_path = config_dir.path().join("jreflect.toml");
        std::fs::write(
            &config_path,
            format!(
                "[loader]\nresource_dirs = [{:?}]\n",
                resources.path().display().to_string()
            ),
        )
        .unwrap();

        let config = RuntimeConfig::load(&config_path).unwrap();
        let runtime = Runtime::with_config(&config).unwrap();
        runtime
            .system_loader()
            .define_class(ClassDescriptor::class("com.acme.App"))
            .unwrap();

        let app = ClassHandle::for_name(&runtime, "com.acme.App").unwrap();
        assert_eq!(app.resource("banner.txt").unwrap().scheme(), "file");
        assert_eq!(read_all(app.resource_as_stream("banner.txt").unwrap()), "hello");
        assert!(app.resource("/banner.txt").is_none());
    }

    #[test]
    fn test_bad_security_config() {
        let config = RuntimeConfig::from_toml_str("").unwrap();
        let mut broken = config.clone();
        broken
            .security
            .packages
            .insert("com.acme".to_string(), "READ_EVERYTHING".to_string());

        assert!(matches!(
            Runtime::with_config(&broken),
            Err(ConfigError::Invalid(_))
        ));
    }
}

// ============================================================================
// Security policy
// ============================================================================

mod security {
    use super::*;

    fn restricted_runtime() -> Runtime {
        let config = RuntimeConfig::from_toml_str(
            r#"
[security.packages]
"com.untrusted.*" = "NONE"
"com.partner" = "ACCESS_DECLARED_MEMBERS|GET_CLASS_LOADER"
"#,
        )
        .unwrap();
        let runtime = Runtime::with_config(&config).unwrap();
        let loader = runtime.system_loader();
        for name in ["com.untrusted.plugin.Tool", "com.partner.Api", "com.acme.Open"] {
            loader
                .define_class(
                    ClassDescriptor::class(name)
                        .field(FieldDescriptor::new("hidden", "int", Modifiers::PRIVATE))
                        .field(FieldDescriptor::new("shown", "int", Modifiers::PUBLIC)),
                )
                .unwrap();
        }
        runtime
    }

    #[test]
    fn test_denied_declared_members() {
        let runtime = restricted_runtime();
        let tool = ClassHandle::for_name(&runtime, "com.untrusted.plugin.Tool").unwrap();

        assert!(matches!(tool.declared_fields(), Err(ReflectError::Security(_))));
        assert!(matches!(tool.declared_field("hidden"), Err(ReflectError::Security(_))));
        assert!(matches!(tool.declared_methods(), Err(ReflectError::Security(_))));
        assert!(matches!(tool.declared_classes(), Err(ReflectError::Security(_))));
        assert!(matches!(tool.class_loader(), Err(ReflectError::Security(_))));
        assert!(matches!(tool.protection_domain(), Err(ReflectError::Security(_))));

        // Public queries are never guarded
        assert_eq!(tool.fields().len(), 1);
        assert!(tool.field("shown").is_ok());

        // Arrays are checked against their element's package
        let tools = ClassHandle::new(tool.class().array_type());
        assert!(matches!(tools.class_loader(), Err(ReflectError::Security(_))));
    }

    #[test]
    fn test_partial_grant() {
        let runtime = restricted_runtime();
        let api = ClassHandle::for_name(&runtime, "com.partner.Api").unwrap();

        assert_eq!(api.declared_fields().unwrap().len(), 2);
        assert!(api.class_loader().unwrap().is_some());
        assert!(matches!(api.protection_domain(), Err(ReflectError::Security(_))));

        let open = ClassHandle::for_name(&runtime, "com.acme.Open").unwrap();
        assert!(open.protection_domain().is_ok());
    }

    #[test]
    fn test_policy_swap_at_runtime() {
        let runtime = Runtime::new();
        runtime
            .system_loader()
            .define_class(ClassDescriptor::class("com.acme.Thing"))
            .unwrap();
        let thing = ClassHandle::for_name(&runtime, "com.acme.Thing").unwrap();
        assert!(thing.declared_fields().is_ok());

        let mut policy = SecurityPolicy::new();
        policy.add_pattern("com.acme.**", ReflectPermission::NONE);
        runtime.set_security_policy(policy);
        assert!(matches!(thing.declared_fields(), Err(ReflectError::Security(_))));
    }
}

// ============================================================================
// Packages, signers, protection domains
// ============================================================================

mod provenance {
    use super::*;

    #[test]
    fn test_package_metadata() {
        let runtime = Runtime::new();
        let loader = runtime.system_loader();
        let mut package = Package::named("com.acme");
        package.implementation_title = Some("Acme Core".to_string());
        package.implementation_version = Some("1.4.2".to_string());
        loader.define_package(package).unwrap();
        loader.define_class(ClassDescriptor::class("com.acme.Widget")).unwrap();
        loader.define_class(ClassDescriptor::class("org.other.Gadget")).unwrap();

        let widget = ClassHandle::for_name(&runtime, "com.acme.Widget").unwrap();
        let package = widget.package().unwrap();
        assert_eq!(package.name, "com.acme");
        assert_eq!(package.implementation_version.as_deref(), Some("1.4.2"));

        let gadget = ClassHandle::for_name(&runtime, "org.other.Gadget").unwrap();
        assert_eq!(gadget.package(), Some(Package::named("org.other")));

        let string = ClassHandle::for_name(&runtime, "java.lang.String").unwrap();
        assert_eq!(string.package().unwrap().name, "java.lang");
    }

    #[test]
    fn test_signers_and_domain() {
        let runtime = Runtime::new();
        let code_source = url::Url::parse("file:///opt/acme/acme.jar").unwrap();
        runtime
            .system_loader()
            .define_class(
                ClassDescriptor::class("com.acme.Signed")
                    .signed_by(Signer::new("CN=Acme"))
                    .with_protection_domain(ProtectionDomain::with_code_source(code_source.clone())),
            )
            .unwrap();
        runtime
            .system_loader()
            .define_class(ClassDescriptor::class("com.acme.Plain"))
            .unwrap();

        let signed = ClassHandle::for_name(&runtime, "com.acme.Signed").unwrap();
        assert_eq!(signed.signers().unwrap()[0].subject, "CN=Acme");
        assert_eq!(signed.protection_domain().unwrap().code_source, Some(code_source.clone()));

        // Arrays share their element's domain but carry no signers
        let array = ClassHandle::new(signed.class().array_type());
        assert!(array.signers().is_none());
        assert_eq!(array.protection_domain().unwrap().code_source, Some(code_source));

        let plain = ClassHandle::for_name(&runtime, "com.acme.Plain").unwrap();
        assert!(plain.signers().is_none());
        assert_eq!(plain.protection_domain().unwrap(), ProtectionDomain::default());
    }
}

// ============================================================================
// Resources
// ============================================================================

mod resources {
    use super::*;

    #[test]
    fn test_class_relative_names() {
        let runtime = Runtime::new();
        let loader = runtime.system_loader();
        loader.define_class(ClassDescriptor::class("com.acme.Widget")).unwrap();
        loader.define_class(ClassDescriptor::class("Toplevel")).unwrap();
        loader.add_resource("com/acme/widget.css", "color: red");
        loader.add_resource("global.txt", "everywhere");

        let widget = ClassHandle::for_name(&runtime, "com.acme.Widget").unwrap();
        assert_eq!(read_all(widget.resource_as_stream("widget.css").unwrap()), "color: red");
        assert_eq!(read_all(widget.resource_as_stream("/global.txt").unwrap()), "everywhere");
        assert!(widget.resource("global.txt").is_none());

        let toplevel = ClassHandle::for_name(&runtime, "Toplevel").unwrap();
        assert!(toplevel.resource("global.txt").is_some());

        // Arrays resolve relative to their element type
        let widgets = ClassHandle::new(widget.class().array_type());
        assert!(widgets.resource("widget.css").is_some());
    }

    #[test]
    fn test_bootstrap_classes_use_bootstrap_resources() {
        let runtime = Runtime::new();
        runtime.system_loader().add_resource("java/lang/notes.txt", "app only");

        let string = ClassHandle::for_name(&runtime, "java.lang.String").unwrap();
        assert!(string.resource("notes.txt").is_none());

        runtime.bootstrap_loader().add_resource("java/lang/notes.txt", "core");
        assert_eq!(read_all(string.resource_as_stream("notes.txt").unwrap()), "core");
    }
}

// ============================================================================
// JSON class tables
// ============================================================================

mod json_tables {
    use super::*;

    #[test]
    fn test_define_from_json() {
        let runtime = Runtime::new();
        let classes = runtime
            .system_loader()
            .define_classes_json(
                r#"[
                    {
                        "name": "com.acme.Color",
                        "modifiers": 16401,
                        "superclass": "java.lang.Enum",
                        "fields": [
                            { "name": "RED", "type_name": "com.acme.Color", "modifiers": 16409 }
                        ]
                    },
                    {
                        "name": "com.acme.Palette",
                        "modifiers": 1,
                        "annotations": [ { "annotation_type": "java.lang.Deprecated" } ],
                        "fields": [
                            { "name": "colors", "type_name": "[Lcom.acme.Color;", "modifiers": 1 }
                        ]
                    }
                ]"#,
            )
            .unwrap();
        assert_eq!(classes.len(), 2);

        let color = ClassHandle::from(classes[0].clone());
        assert!(color.is_enum());
        assert_eq!(color.field("RED").unwrap().get_type().unwrap(), *color.class());

        let palette = ClassHandle::from(classes[1].clone());
        let colors = palette.field("colors").unwrap().get_type().unwrap();
        assert_eq!(colors.component_type().as_ref(), Some(color.class()));
        assert_eq!(palette.declared_annotations()[0].annotation_type, "java.lang.Deprecated");

        let err = runtime.system_loader().define_classes_json("[{]").unwrap_err();
        assert!(matches!(err, ReflectError::Definition(_)));
    }
}
