use crate::indexer::extract::{CallSite, ExtractedClass, ExtractedFile, SourceExtractor};
use crate::indexer::pattern::is_modifier;
use crate::model::{Annotation, ClassRecord, FieldRecord, JavaType, MethodRecord, Parameter};
use crate::util;
use anyhow::Result;
use tree_sitter::{Node, Parser};

#[derive(Clone)]
struct Context {
    package: String,
    file_path: String,
}

/// Grammar-backed extractor producing the same record shapes as the pattern
/// extractor. Local classes are extracted; anonymous class bodies are not.
pub struct JavaExtractor {
    parser: Parser,
}

impl JavaExtractor {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_java::LANGUAGE;
        parser.set_language(&language.into())?;
        Ok(Self { parser })
    }
}

impl SourceExtractor for JavaExtractor {
    fn name(&self) -> &'static str {
        "tree-sitter"
    }

    fn extract(&mut self, source: &str, file_path: &str) -> Result<ExtractedFile> {
        let mut output = ExtractedFile::default();
        let Some(tree) = self.parser.parse(source, None) else {
            return Ok(output);
        };
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_declaration" => {
                    if let Some(name) = package_name(child, source) {
                        output.package = name;
                    }
                }
                "import_declaration" => {
                    if let Some(import) = import_path(child, source) {
                        output.imports.push(import);
                    }
                }
                _ => {}
            }
        }
        let ctx = Context {
            package: output.package.clone(),
            file_path: file_path.to_string(),
        };
        walk_node(root, &ctx, source, &mut output);
        Ok(output)
    }
}

fn walk_node(node: Node<'_>, ctx: &Context, source: &str, output: &mut ExtractedFile) {
    if let Some(java_type) = type_kind(node.kind()) {
        handle_type(node, java_type, ctx, source, output);
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk_node(child, ctx, source, output);
    }
}

fn type_kind(kind: &str) -> Option<JavaType> {
    match kind {
        "class_declaration" => Some(JavaType::Class),
        "interface_declaration" => Some(JavaType::Interface),
        "enum_declaration" => Some(JavaType::Enum),
        "annotation_type_declaration" => Some(JavaType::Annotation),
        _ => None,
    }
}

fn handle_type(
    node: Node<'_>,
    java_type: JavaType,
    ctx: &Context,
    source: &str,
    output: &mut ExtractedFile,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source);
    if name.is_empty() {
        return;
    }
    let mut record = ClassRecord::new(name, &ctx.package, java_type);
    record.file_path = ctx.file_path.clone();
    let (modifiers, annotations) = modifiers_for_node(node, source);
    record.is_abstract = modifiers.iter().any(|m| m == "abstract");
    record.modifiers = modifiers;
    record.annotations = annotations;

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match (java_type, child.kind()) {
            (JavaType::Class, "superclass") => {
                record.superclass = type_names(child, source).into_iter().next();
            }
            (JavaType::Class | JavaType::Enum, "super_interfaces") => {
                record.interfaces.extend(type_names(child, source));
            }
            (JavaType::Interface, "extends_interfaces") => {
                record.interfaces.extend(type_names(child, source));
            }
            _ => {}
        }
    }

    let class_name = record.qualname();
    let index = output.classes.len();
    output.classes.push(ExtractedClass::new(record));
    if let Some(body) = node.child_by_field_name("body") {
        walk_type_body(body, index, &class_name, ctx, source, output);
    }
}

fn walk_type_body(
    body: Node<'_>,
    index: usize,
    class_name: &str,
    ctx: &Context,
    source: &str,
    output: &mut ExtractedFile,
) {
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "method_declaration" | "annotation_type_element_declaration" => {
                handle_method(member, index, class_name, ctx, source, output);
            }
            "field_declaration" | "constant_declaration" => {
                let fields = fields_for_node(member, class_name, source);
                output.classes[index].fields.extend(fields);
            }
            "enum_body_declarations" => {
                walk_type_body(member, index, class_name, ctx, source, output);
            }
            kind => {
                if let Some(java_type) = type_kind(kind) {
                    handle_type(member, java_type, ctx, source, output);
                }
            }
        }
    }
}

fn handle_method(
    node: Node<'_>,
    index: usize,
    class_name: &str,
    ctx: &Context,
    source: &str,
    output: &mut ExtractedFile,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source);
    if name.is_empty() {
        return;
    }
    let return_type = node
        .child_by_field_name("type")
        .map(|ty| util::collapse_whitespace(&node_text(ty, source)))
        .unwrap_or_default();
    let mut method = MethodRecord::new(class_name, &name, return_type);
    let (modifiers, annotations) = modifiers_for_node(node, source);
    method.modifiers = modifiers;
    method.annotations = annotations;
    if let Some(params) = node.child_by_field_name("parameters") {
        method.parameters = parameters(params, source);
        let raw = node_text(params, source);
        let inner = raw
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(&raw);
        method.signature = format!("{name}({})", util::collapse_whitespace(inner));
    }
    let (start_line, end_line) = line_span(node);
    method.line_start = start_line;
    method.line_end = end_line;

    if let Some(body) = node.child_by_field_name("body") {
        method.body = Some(node_text(body, source));
        let mut calls = Vec::new();
        collect_calls(body, &name, source, &mut calls);
        for call in calls {
            if !output.classes[index].calls.contains(&call) {
                output.classes[index].calls.push(call);
            }
        }
        collect_local_types(body, ctx, source, output);
    }
    output.classes[index].methods.push(method);
}

fn parameters(node: Node<'_>, source: &str) -> Vec<Parameter> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "formal_parameter" => {
                let (Some(ty), Some(name)) = (
                    child.child_by_field_name("type"),
                    child.child_by_field_name("name"),
                ) else {
                    continue;
                };
                let mut param = Parameter::new(
                    util::collapse_whitespace(&node_text(ty, source)),
                    node_text(name, source),
                );
                param.annotations = modifiers_for_node(child, source).1;
                out.push(param);
            }
            "spread_parameter" => {
                if let Some(param) = spread_parameter(child, source) {
                    out.push(param);
                }
            }
            _ => {}
        }
    }
    out
}

fn spread_parameter(node: Node<'_>, source: &str) -> Option<Parameter> {
    let mut type_name = None;
    let mut name = None;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "modifiers" => {}
            "variable_declarator" => {
                name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source));
            }
            _ => {
                if type_name.is_none() {
                    type_name = Some(util::collapse_whitespace(&node_text(child, source)));
                }
            }
        }
    }
    let mut param = Parameter::new(format!("{}...", type_name?), name?);
    param.annotations = modifiers_for_node(node, source).1;
    Some(param)
}

fn fields_for_node(node: Node<'_>, class_name: &str, source: &str) -> Vec<FieldRecord> {
    let Some(ty) = node.child_by_field_name("type") else {
        return Vec::new();
    };
    let field_type = util::collapse_whitespace(&node_text(ty, source));
    let (modifiers, annotations) = modifiers_for_node(node, source);
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        let mut field = FieldRecord::new(class_name, node_text(name_node, source), &field_type);
        field.modifiers = modifiers.clone();
        field.annotations = annotations.clone();
        field.initial_value = declarator
            .child_by_field_name("value")
            .map(|value| node_text(value, source))
            .filter(|value| !value.is_empty());
        out.push(field);
    }
    out
}

/// Keyword modifiers and annotations from a declaration's `modifiers` child.
fn modifiers_for_node(node: Node<'_>, source: &str) -> (Vec<String>, Vec<Annotation>) {
    let mut modifiers = Vec::new();
    let mut annotations = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "modifiers" {
            continue;
        }
        let mut inner = child.walk();
        for item in child.children(&mut inner) {
            match item.kind() {
                "marker_annotation" | "annotation" => {
                    if let Some(annotation) = annotation_from_node(item, source) {
                        annotations.push(annotation);
                    }
                }
                _ => {
                    let text = node_text(item, source);
                    if is_modifier(&text) && !modifiers.contains(&text) {
                        modifiers.push(text);
                    }
                }
            }
        }
    }
    (modifiers, annotations)
}

fn annotation_from_node(node: Node<'_>, source: &str) -> Option<Annotation> {
    let name = node_text(node.child_by_field_name("name")?, source);
    let arguments = node.child_by_field_name("arguments").map(|args| {
        let raw = node_text(args, source);
        raw.strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .map(|inner| inner.to_string())
            .unwrap_or(raw)
    });
    Annotation::from_source(&name, arguments.as_deref())
}

/// Type names listed under a `superclass`, `super_interfaces` or
/// `extends_interfaces` node, generics removed.
fn type_names(node: Node<'_>, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "type_list" {
            let mut list_cursor = child.walk();
            for item in child.named_children(&mut list_cursor) {
                let name = util::strip_generics(&node_text(item, source));
                if !name.is_empty() {
                    out.push(name);
                }
            }
        } else {
            let name = util::strip_generics(&node_text(child, source));
            if !name.is_empty() {
                out.push(name);
            }
        }
    }
    out
}

fn collect_calls(node: Node<'_>, caller: &str, source: &str, out: &mut Vec<CallSite>) {
    if node.kind() == "method_invocation" {
        if let Some(call) = call_site(node, caller, source) {
            if !out.contains(&call) {
                out.push(call);
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if type_kind(child.kind()).is_some() {
            continue;
        }
        collect_calls(child, caller, source, out);
    }
}

fn call_site(node: Node<'_>, caller: &str, source: &str) -> Option<CallSite> {
    let callee = node_text(node.child_by_field_name("name")?, source);
    let receiver = match node.child_by_field_name("object") {
        None => None,
        Some(object) => match object.kind() {
            "this" | "super" | "identifier" => Some(node_text(object, source)),
            "field_access" => {
                let target = object.child_by_field_name("object")?;
                if target.kind() != "this" {
                    return None;
                }
                Some(node_text(object.child_by_field_name("field")?, source))
            }
            _ => return None,
        },
    };
    Some(CallSite {
        caller_method: caller.to_string(),
        receiver,
        callee_method: callee,
    })
}

fn collect_local_types(node: Node<'_>, ctx: &Context, source: &str, output: &mut ExtractedFile) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(java_type) = type_kind(child.kind()) {
            handle_type(child, java_type, ctx, source, output);
        } else if child.kind() != "class_body" {
            collect_local_types(child, ctx, source, output);
        }
    }
}

fn package_name(node: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    let name = node
        .named_children(&mut cursor)
        .find(|child| matches!(child.kind(), "scoped_identifier" | "identifier"))?;
    Some(strip_whitespace(&node_text(name, source)))
}

fn import_path(node: Node<'_>, source: &str) -> Option<String> {
    let text = node_text(node, source);
    let rest = text.strip_prefix("import")?.trim_start();
    if rest.starts_with("static") {
        return None;
    }
    let path = strip_whitespace(rest.trim_end_matches(';'));
    if path.is_empty() { None } else { Some(path) }
}

fn line_span(node: Node<'_>) -> (i64, i64) {
    (
        node.start_position().row as i64 + 1,
        node.end_position().row as i64 + 1,
    )
}

fn node_text(node: Node<'_>, source: &str) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    source.get(start..end).unwrap_or("").trim().to_string()
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|ch| !ch.is_whitespace()).collect()
}
