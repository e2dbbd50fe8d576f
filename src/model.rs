use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JavaType {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl JavaType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "class" => Some(JavaType::Class),
            "interface" => Some(JavaType::Interface),
            "enum" => Some(JavaType::Enum),
            "@interface" => Some(JavaType::Annotation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JavaType::Class => "class",
            JavaType::Interface => "interface",
            JavaType::Enum => "enum",
            JavaType::Annotation => "annotation",
        }
    }
}

/// An annotation usage. Only `name` takes part in counting; `arguments` keeps
/// the raw text between the parentheses for consumers that need element values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }

    /// Builds an annotation from source text such as `@org.acme.Audited` and the
    /// argument text found between its parentheses.
    pub fn from_source(raw_name: &str, arguments: Option<&str>) -> Option<Self> {
        let trimmed = raw_name.trim().trim_start_matches('@').trim();
        let name = trimmed.rsplit('.').next().unwrap_or(trimmed).trim();
        if name.is_empty() || name == "interface" {
            return None;
        }
        let arguments = arguments
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string());
        Some(Self {
            name: name.to_string(),
            arguments,
        })
    }

    /// Raw text of one annotation element. A bare argument is the `value` element.
    pub fn element(&self, key: &str) -> Option<&str> {
        let arguments = self.arguments.as_deref()?;
        for part in split_top_level(arguments, ',') {
            let (name, value) = match split_assignment(part) {
                Some((name, value)) => (name, value),
                None => ("value", part.trim()),
            };
            if name == key {
                return Some(value);
            }
        }
        None
    }

    /// String literals of an element, e.g. both paths of `path = {"/a", "/b"}`.
    pub fn string_values(&self, key: &str) -> Vec<String> {
        self.element(key).map(string_literals).unwrap_or_default()
    }
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

fn split_assignment(part: &str) -> Option<(&str, &str)> {
    let trimmed = part.trim();
    let eq = trimmed.find('=')?;
    let name = trimmed[..eq].trim();
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$');
    if !valid_name {
        return None;
    }
    Some((name, trimmed[eq + 1..].trim()))
}

pub(crate) fn string_literals(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_string = false;
    let mut escaped = false;
    for ch in text.chars() {
        if !in_string {
            in_string = ch == '"';
            continue;
        }
        if escaped {
            buf.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            out.push(std::mem::take(&mut buf));
            in_string = false;
        } else {
            buf.push(ch);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub package: String,
    pub file_path: String,
    pub java_type: JavaType,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub is_abstract: bool,
}

impl ClassRecord {
    pub fn new(name: impl Into<String>, package: impl Into<String>, java_type: JavaType) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            file_path: String::new(),
            java_type,
            modifiers: Vec::new(),
            annotations: Vec::new(),
            interfaces: Vec::new(),
            superclass: None,
            is_abstract: false,
        }
    }

    /// `package.Name`, or just `Name` for the default package.
    pub fn qualname(&self) -> String {
        qualify(&self.package, &self.name)
    }

    pub fn annotation_names(&self) -> impl Iterator<Item = &str> {
        self.annotations.iter().map(|a| a.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Parameter {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub name: String,
    /// Qualified name of the owning class.
    pub class_name: String,
    pub signature: String,
    pub return_type: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub line_start: i64,
    pub line_end: i64,
}

impl MethodRecord {
    pub fn new(
        class_name: impl Into<String>,
        name: impl Into<String>,
        return_type: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            signature: format!("{name}()"),
            name,
            class_name: class_name.into(),
            return_type: return_type.into(),
            parameters: Vec::new(),
            modifiers: Vec::new(),
            annotations: Vec::new(),
            body: None,
            line_start: 0,
            line_end: 0,
        }
    }

    pub fn qualname(&self) -> String {
        qualify(&self.class_name, &self.name)
    }

    pub fn annotation_names(&self) -> impl Iterator<Item = &str> {
        self.annotations.iter().map(|a| a.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    pub class_name: String,
    pub field_type: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<String>,
}

impl FieldRecord {
    pub fn new(
        class_name: impl Into<String>,
        name: impl Into<String>,
        field_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            field_type: field_type.into(),
            modifiers: Vec::new(),
            annotations: Vec::new(),
            initial_value: None,
        }
    }

    pub fn qualname(&self) -> String {
        qualify(&self.class_name, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub http_method: String,
    pub path: String,
    pub handler_class: String,
    pub handler_method: String,
    #[serde(default)]
    pub params: Vec<Parameter>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub produces: Vec<String>,
}

impl EndpointRecord {
    /// `handlerClass.handlerMethod`
    pub fn handler(&self) -> String {
        qualify(&self.handler_class, &self.handler_method)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Class,
    Method,
    Field,
    Endpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Declares,
    Handles,
    Calls,
    Implements,
    Extends,
    AnnotatedWith,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub classes: usize,
    pub methods: usize,
    pub fields: usize,
    pub endpoints: usize,
    pub total_nodes: usize,
    pub total_edges: usize,
}

/// Owned, serializable copy of a graph store. Record maps keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub classes: IndexMap<String, ClassRecord>,
    pub methods: IndexMap<String, MethodRecord>,
    pub fields: IndexMap<String, FieldRecord>,
    pub endpoints: IndexMap<String, EndpointRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    pub stats: GraphStats,
}

impl Snapshot {
    /// blake3 hex digest of the canonical JSON form.
    pub fn digest(&self) -> anyhow::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}

pub(crate) fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_from_qualified_source() {
        let ann = Annotation::from_source("@org.springframework.web.bind.annotation.GetMapping", None)
            .unwrap();
        assert_eq!(ann.name, "GetMapping");
        assert!(ann.arguments.is_none());
        assert!(Annotation::from_source("@interface", None).is_none());
    }

    #[test]
    fn annotation_elements() {
        let ann = Annotation::new("RequestMapping")
            .with_arguments(r#"value = {"/a", "/b"}, produces = "text/plain", method = RequestMethod.GET"#);
        assert_eq!(ann.string_values("value"), vec!["/a", "/b"]);
        assert_eq!(ann.string_values("produces"), vec!["text/plain"]);
        assert_eq!(ann.element("method"), Some("RequestMethod.GET"));
        assert!(ann.string_values("consumes").is_empty());

        let bare = Annotation::new("GetMapping").with_arguments(r#""/users/{id}""#);
        assert_eq!(bare.string_values("value"), vec!["/users/{id}"]);
    }

    #[test]
    fn default_package_qualname_has_no_leading_dot() {
        let class = ClassRecord::new("Main", "", JavaType::Class);
        assert_eq!(class.qualname(), "Main");
        let class = ClassRecord::new("Main", "com.acme", JavaType::Class);
        assert_eq!(class.qualname(), "com.acme.Main");
    }
}
