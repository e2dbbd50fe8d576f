mod common;

use jgraph::graph::Direction;
use jgraph::indexer::extract::ExtractorKind;
use jgraph::model::EdgeKind;
use jgraph::{ExtractError, ExtractOptions, ExtractReport, GraphStore, Indexer, Snapshot};
use std::path::Path;

const KINDS: [ExtractorKind; 2] = [ExtractorKind::Pattern, ExtractorKind::TreeSitter];

fn options(kind: ExtractorKind) -> ExtractOptions {
    ExtractOptions {
        extractor: kind,
        ..ExtractOptions::default()
    }
}

fn extract_dir(root: &Path, options: ExtractOptions) -> ExtractReport {
    Indexer::new(options).extract_path(root).unwrap()
}

fn user_project(root: &Path) {
    common::write_sources(
        root,
        &[
            (
                "src/UserController.java".to_string(),
                common::USER_CONTROLLER.to_string(),
            ),
            (
                "src/UserService.java".to_string(),
                common::USER_SERVICE.to_string(),
            ),
        ],
    );
}

#[test]
fn two_file_project_with_either_extractor() {
    let dir = tempfile::tempdir().unwrap();
    user_project(dir.path());

    for kind in KINDS {
        let report = extract_dir(dir.path(), options(kind));
        let stats = report.graph.stats();
        assert_eq!(stats.classes, 2, "{kind:?}");
        assert_eq!(stats.methods, 1, "{kind:?}");
        assert_eq!(stats.fields, 1, "{kind:?}");
        assert_eq!(stats.endpoints, 1, "{kind:?}");
        assert_eq!(report.stats.scanned, 2);
        assert_eq!(report.stats.extracted, 2);
        assert!(report.warnings.is_empty());

        let snapshot = report.snapshot();
        let endpoint = &snapshot.endpoints["endpoint:GET:/usercontroller/getuser"];
        assert_eq!(endpoint.handler(), "com.example.web.UserController.getUser");
        assert_eq!(endpoint.params.len(), 1);
        assert_eq!(
            report.graph.owner_of("endpoint:GET:/usercontroller/getuser"),
            Some("method:com.example.web.UserController.getUser")
        );
        let class = &snapshot.classes["class:com.example.web.UserController"];
        assert_eq!(class.file_path, "src/UserController.java");

        // userService.find is not declared anywhere, so no call edge
        assert_eq!(report.stats.links.calls, 0);
    }
}

#[test]
fn extractors_agree_on_the_shop_project() {
    let dir = tempfile::tempdir().unwrap();
    common::write_sources(dir.path(), &common::shop_sources());

    let pattern = extract_dir(dir.path(), options(ExtractorKind::Pattern)).snapshot();
    let grammar = extract_dir(dir.path(), options(ExtractorKind::TreeSitter)).snapshot();

    let keys = |snapshot: &Snapshot| {
        (
            snapshot.classes.keys().cloned().collect::<Vec<_>>(),
            snapshot.methods.keys().cloned().collect::<Vec<_>>(),
            snapshot.fields.keys().cloned().collect::<Vec<_>>(),
            snapshot.endpoints.keys().cloned().collect::<Vec<_>>(),
        )
    };
    assert_eq!(keys(&pattern), keys(&grammar));
    assert_eq!(pattern.classes, grammar.classes);
    assert_eq!(pattern.fields, grammar.fields);
    assert_eq!(pattern.endpoints, grammar.endpoints);
    for (id, method) in &pattern.methods {
        let other = &grammar.methods[id];
        assert_eq!(method.return_type, other.return_type, "{id}");
        assert_eq!(method.signature, other.signature, "{id}");
        assert_eq!(method.parameters, other.parameters, "{id}");
        assert_eq!(method.modifiers, other.modifiers, "{id}");
        assert_eq!(method.annotations, other.annotations, "{id}");
        assert_eq!(method.line_start, other.line_start, "{id}");
        assert_eq!(method.line_end, other.line_end, "{id}");
    }
    assert_eq!(pattern.edges, grammar.edges);
    assert_eq!(pattern.stats, grammar.stats);
}

#[test]
fn shop_project_model() {
    let dir = tempfile::tempdir().unwrap();
    common::write_sources(dir.path(), &common::shop_sources());
    let report = extract_dir(dir.path(), options(ExtractorKind::Pattern));
    let snapshot = report.snapshot();

    assert_eq!(snapshot.stats.classes, 7);
    assert_eq!(snapshot.stats.methods, 10);
    assert_eq!(snapshot.stats.fields, 3);
    assert_eq!(snapshot.stats.endpoints, 2);
    assert_eq!(snapshot.stats.total_nodes, 22);
    assert_eq!(snapshot.stats.total_edges, 22);

    let endpoints: Vec<_> = snapshot.endpoints.keys().map(String::as_str).collect();
    assert_eq!(
        endpoints,
        vec!["endpoint:GET:/ordercontroller/list", "endpoint:POST:/api/orders/create"]
    );
    let create = &snapshot.endpoints["endpoint:POST:/api/orders/create"];
    assert_eq!(create.consumes, vec!["application/xml"]);
    assert_eq!(create.produces, vec!["application/json"]);
    assert_eq!(create.params[0].type_name, "Order");

    // the commented-out mapping never shows up
    assert!(!snapshot.endpoints.keys().any(|id| id.starts_with("endpoint:DELETE")));
    assert!(snapshot.classes.contains_key("class:com.shop.api.Page"));
    assert!(snapshot.fields.contains_key("field:com.shop.api.Page.size"));
    assert!(snapshot.classes["class:com.shop.api.BaseController"].is_abstract);

    let counts = &snapshot.fields["field:com.shop.api.BaseController.counts"];
    assert_eq!(counts.field_type, "Map<String, Integer>");
    assert_eq!(
        counts.initial_value.as_deref(),
        Some("new HashMap<String, Integer>()")
    );
    let page = &snapshot.methods["method:com.shop.api.BaseController.page"];
    assert_eq!(page.return_type, "List<T>");
    assert_eq!(page.modifiers, vec!["protected"]);
    assert_eq!(page.parameters.len(), 3);
    // parameters of log/page are not fields
    assert!(
        !snapshot
            .fields
            .keys()
            .any(|id| id.ends_with(".message") || id.ends_with(".items"))
    );

    let links = report.stats.links;
    assert_eq!(links.extends, 1);
    assert_eq!(links.implements, 1);
    assert_eq!(links.annotated_with, 1);
    assert_eq!(links.calls, 4);

    let graph = &report.graph;
    let controller = "class:com.shop.api.OrderController";
    assert_eq!(
        graph.neighbors(controller, EdgeKind::Extends, Direction::Outgoing),
        vec!["class:com.shop.api.BaseController"]
    );
    assert_eq!(
        graph.neighbors(controller, EdgeKind::Implements, Direction::Outgoing),
        vec!["class:com.shop.api.Auditable"]
    );
    assert_eq!(
        graph.neighbors(
            "method:com.shop.api.OrderController.create",
            EdgeKind::Calls,
            Direction::Outgoing
        ),
        vec![
            "method:com.shop.api.BaseController.audit",
            "method:com.shop.service.OrderService.save",
        ]
    );
    assert_eq!(
        graph.neighbors(
            "method:com.shop.api.OrderController.create",
            EdgeKind::AnnotatedWith,
            Direction::Outgoing
        ),
        vec!["class:com.shop.api.Audited"]
    );
    assert_eq!(
        graph.neighbors(
            "method:com.shop.api.BaseController.log",
            EdgeKind::Calls,
            Direction::Incoming
        ),
        vec!["method:com.shop.api.BaseController.audit"]
    );
}

#[test]
fn parallel_and_sequential_runs_match() {
    let dir = tempfile::tempdir().unwrap();
    common::write_sources(dir.path(), &common::shop_sources());
    user_project(dir.path());

    for kind in KINDS {
        let parallel = extract_dir(dir.path(), options(kind)).snapshot();
        let sequential = extract_dir(
            dir.path(),
            ExtractOptions {
                parallel: false,
                ..options(kind)
            },
        )
        .snapshot();
        assert_eq!(parallel.digest().unwrap(), sequential.digest().unwrap());

        let again = extract_dir(dir.path(), options(kind)).snapshot();
        assert_eq!(parallel, again);
    }
}

#[test]
fn in_memory_sources_match_directory_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let sources = common::shop_sources();
    common::write_sources(dir.path(), &sources);

    let from_dir = extract_dir(dir.path(), ExtractOptions::default()).snapshot();
    let from_memory = Indexer::new(ExtractOptions::default())
        .extract_sources(&sources)
        .unwrap()
        .snapshot();
    assert_eq!(from_dir, from_memory);
}

#[test]
fn missing_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = Indexer::new(ExtractOptions::default())
        .extract_path(&missing)
        .unwrap_err();
    assert!(matches!(err, ExtractError::PathNotFound(ref path) if path == &missing));
    assert!(err.to_string().contains("not found"));
}

#[test]
fn unreadable_file_becomes_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    user_project(dir.path());
    std::fs::write(dir.path().join("src/Broken.java"), [0xff, 0xfe, 0x00, 0x81]).unwrap();

    let report = extract_dir(dir.path(), ExtractOptions::default());
    assert_eq!(report.stats.scanned, 3);
    assert_eq!(report.stats.extracted, 2);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].path, "src/Broken.java");
    assert_eq!(report.graph.stats().classes, 2);
}

#[test]
fn single_file_input() {
    let dir = tempfile::tempdir().unwrap();
    user_project(dir.path());
    let file = dir.path().join("src/UserController.java");

    let report = extract_dir(&file, ExtractOptions::default());
    assert_eq!(report.stats.scanned, 1);
    let snapshot = report.snapshot();
    assert_eq!(snapshot.stats.classes, 1);
    assert_eq!(
        snapshot.classes["class:com.example.web.UserController"].file_path,
        "UserController.java"
    );
}

#[test]
fn other_extensions_and_custom_mappings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Feed.jav"),
        "class Feed { @GetJson String items() { return \"\"; } }",
    )
    .unwrap();
    std::fs::write(dir.path().join("Skipped.java"), "class Skipped {}").unwrap();

    let mut options = ExtractOptions {
        extension: "jav".to_string(),
        ..ExtractOptions::default()
    };
    options.mappings.insert("GetJson", "GET");
    let report = extract_dir(dir.path(), options);
    let snapshot = report.snapshot();
    assert_eq!(snapshot.stats.classes, 1);
    assert!(snapshot.endpoints.contains_key("endpoint:GET:/feed/items"));
}

#[test]
fn walk_problems_are_reported_as_warnings() {
    let dir = tempfile::tempdir().unwrap();
    user_project(dir.path());
    std::fs::write(dir.path().join(".ignore"), "broken[\n").unwrap();

    let report = extract_dir(
        dir.path(),
        ExtractOptions {
            respect_ignore: true,
            ..ExtractOptions::default()
        },
    );
    assert_eq!(report.stats.extracted, 2);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].path.ends_with(".ignore"));
    assert_eq!(report.graph.stats().classes, 2);
}

#[test]
fn snapshot_reload_preserves_the_model() {
    let dir = tempfile::tempdir().unwrap();
    common::write_sources(dir.path(), &common::shop_sources());
    let snapshot = extract_dir(dir.path(), ExtractOptions::default()).snapshot();

    let json = serde_json::to_string_pretty(&snapshot).unwrap();
    let from_json: Snapshot = serde_json::from_str(&json).unwrap();
    let reloaded = GraphStore::from_snapshot(&from_json).export();
    assert_eq!(reloaded, snapshot);
    assert_eq!(reloaded.digest().unwrap(), snapshot.digest().unwrap());

    let yaml = serde_yaml_ng::to_string(&snapshot).unwrap();
    let from_yaml: Snapshot = serde_yaml_ng::from_str(&yaml).unwrap();
    assert_eq!(GraphStore::from_snapshot(&from_yaml).export().stats, snapshot.stats);
}
