mod common;

use jgraph::indexer::extract::{AnnotationScope, SourceExtractor};
use jgraph::indexer::pattern::PatternExtractor;
use jgraph::model::JavaType;

#[test]
fn extract_two_file_scenario() {
    let mut extractor = PatternExtractor::new();
    let controller = extractor
        .extract(common::USER_CONTROLLER, "src/UserController.java")
        .unwrap();

    assert_eq!(controller.package, "com.example.web");
    assert_eq!(
        controller.imports,
        vec![
            "com.example.service.UserService",
            "org.springframework.web.bind.annotation.GetMapping",
            "org.springframework.web.bind.annotation.RestController",
        ]
    );
    assert_eq!(controller.classes.len(), 1);

    let class = &controller.classes[0];
    assert_eq!(class.record.qualname(), "com.example.web.UserController");
    assert_eq!(class.record.file_path, "src/UserController.java");
    assert_eq!(class.record.modifiers, vec!["public"]);
    let annotations: Vec<_> = class.record.annotation_names().collect();
    assert_eq!(annotations, vec!["RestController"]);

    let methods: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["getUser"]);
    let get_user = &class.methods[0];
    assert_eq!(get_user.return_type, "User");
    assert_eq!(get_user.signature, "getUser(Long id)");
    assert_eq!(get_user.parameters[0].type_name, "Long");
    assert_eq!(get_user.parameters[0].name, "id");
    let method_annotations: Vec<_> = get_user.annotation_names().collect();
    assert_eq!(method_annotations, vec!["GetMapping"]);
    assert_eq!(get_user.line_start, 18);
    assert_eq!(get_user.line_end, 21);
    assert!(
        get_user
            .body
            .as_deref()
            .is_some_and(|body| body.contains("userService.find(id)"))
    );

    assert_eq!(class.fields.len(), 1);
    assert_eq!(class.fields[0].name, "userService");
    assert_eq!(class.fields[0].field_type, "UserService");
    assert_eq!(class.fields[0].modifiers, vec!["private", "final"]);

    let service = extractor
        .extract(common::USER_SERVICE, "src/UserService.java")
        .unwrap();
    assert_eq!(service.classes.len(), 1);
    assert!(service.classes[0].methods.is_empty());
}

#[test]
fn declarations_in_comments_and_strings_are_ignored() {
    let source = r#"
package demo;

// class Commented {}
/* interface Blocked { void hidden(); } */
public class Real {
    private String sql = "class Quoted { void fake() {} }";
    private char brace = '{';

    public void run() {
        String text = """
            enum Block { A }
            """;
    }
}
"#;
    let file = PatternExtractor::new().extract(source, "Real.java").unwrap();
    let classes: Vec<_> = file.classes.iter().map(|c| c.record.name.as_str()).collect();
    assert_eq!(classes, vec!["Real"]);
    let class = &file.classes[0];
    let methods: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["run"]);
    assert_eq!(
        class.fields[0].initial_value.as_deref(),
        Some(r#""class Quoted { void fake() {} }""#)
    );
    assert_eq!(class.fields[1].name, "brace");
}

#[test]
fn header_clauses_and_kinds() {
    let source = r#"
package com.acme;

public abstract class Repository<T extends Entity> extends Base<T> implements Closeable, Iterable<T> {
}

interface Reader extends Source, AutoCloseable {
    String read() throws IOException;
}

enum Level implements Ranked { LOW, HIGH }

@interface Marker {}
"#;
    let file = PatternExtractor::new().extract(source, "Repository.java").unwrap();
    let kinds: Vec<_> = file
        .classes
        .iter()
        .map(|c| (c.record.name.as_str(), c.record.java_type))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("Repository", JavaType::Class),
            ("Reader", JavaType::Interface),
            ("Level", JavaType::Enum),
            ("Marker", JavaType::Annotation),
        ]
    );

    let repo = &file.classes[0].record;
    assert!(repo.is_abstract);
    assert_eq!(repo.superclass.as_deref(), Some("Base"));
    assert_eq!(repo.interfaces, vec!["Closeable", "Iterable"]);

    let reader = &file.classes[1];
    assert_eq!(reader.record.interfaces, vec!["Source", "AutoCloseable"]);
    assert!(reader.record.superclass.is_none());
    assert!(!reader.record.is_abstract);
    assert_eq!(reader.methods[0].name, "read");
    assert!(reader.methods[0].body.is_none());

    assert_eq!(file.classes[2].record.interfaces, vec!["Ranked"]);
}

#[test]
fn parameters_keep_generic_and_array_types() {
    let source = r#"
class Batch {
    public <T> Map<String, List<T>> group(final Map<String, List<T>> index, int[] sizes, @Valid String... names) throws IOException {
        return index;
    }

    void broken(String) {}
}
"#;
    let file = PatternExtractor::new().extract(source, "Batch.java").unwrap();
    let methods = &file.classes[0].methods;
    let group = &methods[0];
    assert_eq!(group.return_type, "Map<String, List<T>>");
    let params: Vec<_> = group
        .parameters
        .iter()
        .map(|p| (p.type_name.as_str(), p.name.as_str()))
        .collect();
    assert_eq!(
        params,
        vec![
            ("Map<String, List<T>>", "index"),
            ("int[]", "sizes"),
            ("String...", "names"),
        ]
    );
    assert_eq!(group.parameters[2].annotations[0].name, "Valid");
    assert!(group.body.is_some());

    let broken = &methods[1];
    assert_eq!(broken.name, "broken");
    assert!(broken.parameters.is_empty());
}

#[test]
fn annotations_attach_to_the_next_declaration() {
    let source = r#"
@Service
@Transactional(readOnly = true)
public class Billing {
    @Autowired
    private Ledger ledger;

    @Scheduled(cron = "0 0 * * * *")
    public void close() {}

    public void open() {}
}
"#;
    let class = PatternExtractor::new()
        .extract(source, "Billing.java")
        .unwrap()
        .classes
        .remove(0);
    let names: Vec<_> = class.record.annotation_names().collect();
    assert_eq!(names, vec!["Service", "Transactional"]);
    assert_eq!(
        class.record.annotations[1].arguments.as_deref(),
        Some("readOnly = true")
    );
    assert_eq!(class.fields[0].annotations[0].name, "Autowired");
    assert_eq!(
        class.methods[0].annotations[0].string_values("cron"),
        vec!["0 0 * * * *"]
    );
    assert!(class.methods[1].annotations.is_empty());

    let compat = PatternExtractor::with_scope(AnnotationScope::File)
        .extract(source, "Billing.java")
        .unwrap();
    let open = &compat.classes[0].methods[1];
    let names: Vec<_> = open.annotation_names().collect();
    assert_eq!(
        names,
        vec!["Service", "Transactional", "Autowired", "Scheduled"]
    );
}
