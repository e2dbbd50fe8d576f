//! Regex-based Java extractor.
//!
//! Comments and the contents of string/char literals are masked with spaces first,
//! so byte offsets in the masked text line up with the original source. Patterns
//! run over the masked text; annotation arguments, bodies and initializers are
//! sliced from the original at the same offsets.
//!
//! Members are attributed to the innermost type whose body directly contains them
//! (brace depth), and annotations to the declaration they precede. Abstractness
//! comes from the declaration's own modifiers. All of this is best effort: the
//! extractor recovers structural facts without a compiler front end.

use crate::indexer::extract::{
    AnnotationScope, CallSite, ExtractedClass, ExtractedFile, SourceExtractor,
};
use crate::model::{Annotation, ClassRecord, FieldRecord, JavaType, MethodRecord, Parameter};
use crate::util;
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

pub(crate) const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "synchronized",
    "native",
    "transient",
    "volatile",
    "strictfp",
    "default",
    "sealed",
    "non-sealed",
];

const KEYWORDS: &[&str] = &[
    "return",
    "new",
    "else",
    "if",
    "for",
    "while",
    "do",
    "switch",
    "case",
    "catch",
    "try",
    "finally",
    "throw",
    "throws",
    "class",
    "interface",
    "enum",
    "extends",
    "implements",
    "import",
    "package",
    "instanceof",
    "assert",
    "yield",
    "break",
    "continue",
    "super",
    "this",
    "null",
    "true",
    "false",
];

fn re_package() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bpackage\s+([A-Za-z_$][\w$]*(?:\s*\.\s*[A-Za-z_$][\w$]*)*)\s*;")
            .expect("package pattern")
    })
}

fn re_import() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bimport\s+(static\s+)?([A-Za-z_$][\w$]*(?:\s*\.\s*(?:[A-Za-z_$][\w$]*|\*))*)\s*;")
            .expect("import pattern")
    })
}

fn re_type_decl() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(@interface|\bclass|\binterface|\benum)\s+([A-Za-z_$][\w$]*)")
            .expect("type declaration pattern")
    })
}

fn re_annotation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"@\s*([A-Za-z_$][\w$]*(?:\s*\.\s*[A-Za-z_$][\w$]*)*)")
            .expect("annotation pattern")
    })
}

fn re_method() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?P<ret>[A-Za-z_$][\w$.]*(?:\s*<[^;{}()]*>)?(?:\s*\[\s*\])*)\s+(?P<name>[A-Za-z_$][\w$]*)\s*\((?P<params>(?:[^()]|\([^()]*\))*)\)",
        )
        .expect("method pattern")
    })
}

fn re_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?P<type>[A-Za-z_$][\w$.]*(?:\s*<[^;{}()=]*>)?(?:\s*\[\s*\])*)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?:\[\s*\]\s*)*(?P<term>[=;,])",
        )
        .expect("field pattern")
    })
}

fn re_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:(?P<recv>[A-Za-z_$][\w$]*)\s*\.\s*)?(?P<name>[A-Za-z_$][\w$]*)\s*\(")
            .expect("call pattern")
    })
}

pub struct PatternExtractor {
    scope: AnnotationScope,
}

impl PatternExtractor {
    pub fn new() -> Self {
        Self::with_scope(AnnotationScope::Declaration)
    }

    pub fn with_scope(scope: AnnotationScope) -> Self {
        Self { scope }
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceExtractor for PatternExtractor {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn extract(&mut self, source: &str, file_path: &str) -> Result<ExtractedFile> {
        let text = SourceText::new(source);
        let package = text.package();
        let imports = text.imports();

        let spans = text.type_declarations(&package, file_path);
        let mut classes: Vec<ExtractedClass> = spans
            .iter()
            .map(|span| ExtractedClass::new(span.record.clone()))
            .collect();

        for caps in re_method().captures_iter(&text.masked) {
            let (Some(whole), Some(ret), Some(name), Some(params)) = (
                caps.get(0),
                caps.name("ret"),
                caps.name("name"),
                caps.name("params"),
            ) else {
                continue;
            };
            if text.preceded_by_symbol(whole.start()) {
                continue;
            }
            let Some(type_offset) = return_type_start(ret.as_str()) else {
                continue;
            };
            let anchor = ret.start() + type_offset;
            let return_type = util::collapse_whitespace(&ret.as_str()[type_offset..]);
            if is_keyword(&return_type) || is_modifier(&return_type) || is_keyword(name.as_str())
            {
                continue;
            }
            let Some(owner) = owning_type(&spans, &text, whole.start()) else {
                continue;
            };
            let class_name = spans[owner].record.qualname();
            let mut method = MethodRecord::new(&class_name, name.as_str(), return_type);
            let prefix_start = text.declaration_start(whole.start());
            method.modifiers = text.modifiers_in(prefix_start, anchor);
            method.annotations = text.annotations_in(prefix_start, anchor);
            method.parameters = text.parameters(params.start(), params.end());
            method.signature = format!(
                "{}({})",
                name.as_str(),
                util::collapse_whitespace(&source[params.start()..params.end()])
            );
            method.line_start = text.line_of(text.skip_whitespace(prefix_start));
            let body = text.body_after(whole.end());
            method.line_end = text.line_of(body.map(|(_, close)| close).unwrap_or(whole.end()));
            if let Some((open, close)) = body {
                method.body = Some(source[open..=close].to_string());
                let calls = text.call_sites(open + 1, close, name.as_str());
                for call in calls {
                    if !classes[owner].calls.contains(&call) {
                        classes[owner].calls.push(call);
                    }
                }
            }
            classes[owner].methods.push(method);
        }

        for caps in re_field().captures_iter(&text.masked) {
            let (Some(whole), Some(ty), Some(name), Some(term)) = (
                caps.get(0),
                caps.name("type"),
                caps.name("name"),
                caps.name("term"),
            ) else {
                continue;
            };
            if text.preceded_by_symbol(whole.start()) || text.parens[whole.start()] != 0 {
                continue;
            }
            let field_type = util::collapse_whitespace(ty.as_str());
            if field_type == "void"
                || is_keyword(&field_type)
                || is_modifier(&field_type)
                || is_keyword(name.as_str())
            {
                continue;
            }
            let Some(owner) = owning_type(&spans, &text, whole.start()) else {
                continue;
            };
            let class_name = spans[owner].record.qualname();
            let mut field = FieldRecord::new(&class_name, name.as_str(), field_type);
            let prefix_start = text.declaration_start(whole.start());
            field.modifiers = text.modifiers_in(prefix_start, whole.start());
            field.annotations = text.annotations_in(prefix_start, whole.start());
            if term.as_str() == "=" {
                let end = text.statement_end(term.end());
                let end = split_spans(&text.masked, term.end(), end)
                    .first()
                    .map_or(end, |&(_, to)| to);
                let value = source[term.end()..end].trim();
                if !value.is_empty() {
                    field.initial_value = Some(value.to_string());
                }
            }
            classes[owner].fields.push(field);
        }

        if self.scope == AnnotationScope::File {
            let all: Vec<Annotation> = text
                .annotations
                .iter()
                .map(|span| span.annotation.clone())
                .collect();
            for class in &mut classes {
                class.record.annotations = all.clone();
                for method in &mut class.methods {
                    method.annotations = all.clone();
                }
            }
        }

        Ok(ExtractedFile {
            package,
            imports,
            classes,
        })
    }
}

struct AnnotationSpan {
    start: usize,
    end: usize,
    annotation: Annotation,
}

struct TypeSpan {
    record: ClassRecord,
    open: usize,
    close: usize,
    member_depth: u32,
}

struct SourceText<'a> {
    original: &'a str,
    masked: String,
    /// Brace depth before each byte.
    depth: Vec<u32>,
    /// Paren depth before each byte, counted from the innermost open brace.
    parens: Vec<u32>,
    line_starts: Vec<usize>,
    annotations: Vec<AnnotationSpan>,
}

impl<'a> SourceText<'a> {
    fn new(original: &'a str) -> Self {
        let masked = mask_source(original);
        let bytes = masked.as_bytes();
        let mut depth = Vec::with_capacity(bytes.len() + 1);
        let mut parens = Vec::with_capacity(bytes.len() + 1);
        let mut current = 0u32;
        let mut open_parens = 0u32;
        // paren depth outside each open brace, restored when it closes
        let mut saved = Vec::new();
        for &byte in bytes {
            depth.push(current);
            parens.push(open_parens);
            match byte {
                b'{' => {
                    current += 1;
                    saved.push(open_parens);
                    open_parens = 0;
                }
                b'}' => {
                    current = current.saturating_sub(1);
                    open_parens = saved.pop().unwrap_or(0);
                }
                b'(' => open_parens += 1,
                b')' => open_parens = open_parens.saturating_sub(1),
                _ => {}
            }
        }
        depth.push(current);
        parens.push(open_parens);
        let mut line_starts = vec![0];
        line_starts.extend(
            original
                .bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        let mut text = Self {
            original,
            masked,
            depth,
            parens,
            line_starts,
            annotations: Vec::new(),
        };
        text.annotations = text.scan_annotations();
        text
    }

    fn package(&self) -> String {
        re_package()
            .captures(&self.masked)
            .and_then(|caps| caps.get(1))
            .map(|m| strip_whitespace(m.as_str()))
            .unwrap_or_default()
    }

    fn imports(&self) -> Vec<String> {
        re_import()
            .captures_iter(&self.masked)
            .filter(|caps| caps.get(1).is_none())
            .filter_map(|caps| caps.get(2))
            .map(|m| strip_whitespace(m.as_str()))
            .collect()
    }

    fn scan_annotations(&self) -> Vec<AnnotationSpan> {
        let mut out = Vec::new();
        for caps in re_annotation().captures_iter(&self.masked) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let raw_name = strip_whitespace(name.as_str());
            let mut end = whole.end();
            let mut arguments = None;
            let next = self.skip_whitespace(end);
            if self.masked.as_bytes().get(next) == Some(&b'(') {
                if let Some(close) = matching(self.masked.as_bytes(), next, b'(', b')') {
                    arguments = Some(&self.original[next + 1..close]);
                    end = close + 1;
                }
            }
            if let Some(annotation) = Annotation::from_source(&raw_name, arguments) {
                out.push(AnnotationSpan {
                    start: whole.start(),
                    end,
                    annotation,
                });
            }
        }
        out
    }

    fn type_declarations(&self, package: &str, file_path: &str) -> Vec<TypeSpan> {
        let bytes = self.masked.as_bytes();
        let mut out = Vec::new();
        for caps in re_type_decl().captures_iter(&self.masked) {
            let (Some(keyword), Some(name)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let Some(java_type) = JavaType::from_keyword(keyword.as_str()) else {
                continue;
            };
            let Some(open) = self.masked[name.end()..]
                .find(['{', ';'])
                .map(|offset| name.end() + offset)
                .filter(|&idx| bytes[idx] == b'{')
            else {
                continue;
            };
            let close = matching(bytes, open, b'{', b'}').unwrap_or(bytes.len());
            let header = &self.masked[name.end()..open];
            let clauses = HeaderClauses::parse(header);

            let prefix_start = self.declaration_start(keyword.start());
            let mut record = ClassRecord::new(name.as_str(), package, java_type);
            record.file_path = file_path.to_string();
            record.modifiers = self.modifiers_in(prefix_start, keyword.start());
            record.annotations = self.annotations_in(prefix_start, keyword.start());
            record.is_abstract = record.modifiers.iter().any(|m| m == "abstract");
            match java_type {
                JavaType::Class => {
                    record.superclass = clauses.extends.first().cloned();
                    record.interfaces = clauses.implements;
                }
                JavaType::Interface => {
                    record.interfaces = clauses.extends;
                }
                JavaType::Enum => {
                    record.interfaces = clauses.implements;
                }
                JavaType::Annotation => {}
            }
            out.push(TypeSpan {
                record,
                open,
                close,
                member_depth: self.depth[open] + 1,
            });
        }
        out
    }

    fn annotations_in(&self, start: usize, end: usize) -> Vec<Annotation> {
        self.annotations
            .iter()
            .filter(|span| span.start >= start && span.start < end)
            .map(|span| span.annotation.clone())
            .collect()
    }

    fn modifiers_in(&self, start: usize, end: usize) -> Vec<String> {
        let mut text = self.masked[start..end].to_string().into_bytes();
        for span in &self.annotations {
            if span.start >= start && span.start < end {
                let to = span.end.min(end);
                for byte in &mut text[span.start - start..to - start] {
                    *byte = b' ';
                }
            }
        }
        let text = String::from_utf8_lossy(&text);
        let mut out: Vec<String> = Vec::new();
        for token in text.split_whitespace() {
            if is_modifier(token) && !out.iter().any(|m| m == token) {
                out.push(token.to_string());
            }
        }
        out
    }

    fn parameters(&self, start: usize, end: usize) -> Vec<Parameter> {
        let mut out = Vec::new();
        for (from, to) in split_spans(&self.masked, start, end) {
            let mut annotations = Vec::new();
            let mut cleaned = self.masked[from..to].to_string().into_bytes();
            for span in &self.annotations {
                if span.start >= from && span.start < to {
                    annotations.push(span.annotation.clone());
                    let stop = span.end.min(to);
                    for byte in &mut cleaned[span.start - from..stop - from] {
                        *byte = b' ';
                    }
                }
            }
            let cleaned = String::from_utf8_lossy(&cleaned);
            let tokens: Vec<&str> = cleaned
                .split_whitespace()
                .filter(|token| *token != "final")
                .collect();
            if tokens.len() < 2 {
                continue;
            }
            let name = tokens[tokens.len() - 1];
            let type_name = tokens[..tokens.len() - 1].join(" ");
            let mut param = Parameter::new(type_name, name);
            param.annotations = annotations;
            out.push(param);
        }
        out
    }

    /// `{`..`}` of a method body following the parameter list, if any.
    fn body_after(&self, from: usize) -> Option<(usize, usize)> {
        let bytes = self.masked.as_bytes();
        let mut idx = self.skip_whitespace(from);
        if self.masked[idx..].starts_with("throws") {
            idx = from + self.masked[from..].find(['{', ';'])?;
        }
        if bytes.get(idx) != Some(&b'{') {
            return None;
        }
        let close = matching(bytes, idx, b'{', b'}')?;
        Some((idx, close))
    }

    fn call_sites(&self, start: usize, end: usize, caller: &str) -> Vec<CallSite> {
        let mut out = Vec::new();
        let body = &self.masked[start..end];
        for caps in re_call().captures_iter(body) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
                continue;
            };
            let callee = name.as_str();
            if is_keyword(callee) || is_modifier(callee) {
                continue;
            }
            let absolute = start + whole.start();
            let before = self.previous_token(absolute);
            let receiver = match caps.name("recv") {
                Some(recv) => {
                    if before.as_deref() == Some(".") {
                        let qualifier = self.previous_token(self.previous_token_start(absolute));
                        if qualifier.as_deref() != Some("this") {
                            continue;
                        }
                    }
                    Some(recv.as_str().to_string())
                }
                None => {
                    if matches!(before.as_deref(), Some(".") | Some("new") | Some("@")) {
                        continue;
                    }
                    None
                }
            };
            let call = CallSite {
                caller_method: caller.to_string(),
                receiver,
                callee_method: callee.to_string(),
            };
            if !out.contains(&call) {
                out.push(call);
            }
        }
        out
    }

    /// Start of the declaration ending at `pos`: just past the previous `;`, `{`
    /// or `}` outside parentheses.
    fn declaration_start(&self, pos: usize) -> usize {
        let bytes = self.masked.as_bytes();
        let mut parens = 0u32;
        let mut idx = pos;
        while idx > 0 {
            idx -= 1;
            match bytes[idx] {
                b')' => parens += 1,
                b'(' => parens = parens.saturating_sub(1),
                b';' | b'{' | b'}' if parens == 0 => return idx + 1,
                _ => {}
            }
        }
        0
    }

    /// End of the statement starting at `from`: the next `;` outside brackets.
    /// End of the statement starting at `from`: the next `;` outside brackets,
    /// or the bracket that closes the enclosing one.
    fn statement_end(&self, from: usize) -> usize {
        let bytes = self.masked.as_bytes();
        let mut depth = 0i32;
        for (offset, &byte) in bytes[from..].iter().enumerate() {
            match byte {
                b'(' | b'{' | b'[' => depth += 1,
                b')' | b'}' | b']' => {
                    depth -= 1;
                    if depth < 0 {
                        return from + offset;
                    }
                }
                b';' if depth == 0 => return from + offset,
                _ => {}
            }
        }
        bytes.len()
    }

    fn skip_whitespace(&self, from: usize) -> usize {
        let bytes = self.masked.as_bytes();
        let mut idx = from;
        while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
            idx += 1;
        }
        idx
    }

    fn preceded_by_symbol(&self, pos: usize) -> bool {
        matches!(self.previous_token(pos).as_deref(), Some("@") | Some("."))
    }

    fn previous_token_start(&self, pos: usize) -> usize {
        let bytes = self.masked.as_bytes();
        let mut idx = pos;
        while idx > 0 && bytes[idx - 1].is_ascii_whitespace() {
            idx -= 1;
        }
        if idx == 0 {
            return 0;
        }
        if is_ident_byte(bytes[idx - 1]) {
            while idx > 0 && is_ident_byte(bytes[idx - 1]) {
                idx -= 1;
            }
            idx
        } else {
            idx - 1
        }
    }

    /// The identifier or single symbol immediately before `pos`.
    fn previous_token(&self, pos: usize) -> Option<String> {
        let bytes = self.masked.as_bytes();
        let mut end = pos;
        while end > 0 && bytes[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        if end == 0 {
            return None;
        }
        let start = self.previous_token_start(pos);
        Some(self.masked[start..end].to_string())
    }

    fn line_of(&self, offset: usize) -> i64 {
        self.line_starts.partition_point(|&start| start <= offset) as i64
    }
}

fn owning_type(spans: &[TypeSpan], text: &SourceText<'_>, pos: usize) -> Option<usize> {
    let depth = text.depth[pos];
    spans
        .iter()
        .rposition(|span| span.open < pos && pos < span.close && span.member_depth == depth)
}

#[derive(Default)]
struct HeaderClauses {
    extends: Vec<String>,
    implements: Vec<String>,
}

impl HeaderClauses {
    fn parse(header: &str) -> Self {
        let mut clauses = HeaderClauses::default();
        let mut current: Option<&str> = None;
        let mut buffer = String::new();
        let mut angle = 0i32;
        for token in tokenize_header(header) {
            if angle == 0 && matches!(token.as_str(), "extends" | "implements" | "permits") {
                clauses.flush(current, &mut buffer);
                current = match token.as_str() {
                    "extends" => Some("extends"),
                    "implements" => Some("implements"),
                    _ => Some("permits"),
                };
                continue;
            }
            angle += token.matches('<').count() as i32;
            angle -= token.matches('>').count() as i32;
            buffer.push_str(&token);
            buffer.push(' ');
        }
        clauses.flush(current, &mut buffer);
        clauses
    }

    fn flush(&mut self, clause: Option<&str>, buffer: &mut String) {
        let types = split_type_list(buffer);
        match clause {
            Some("extends") => self.extends.extend(types),
            Some("implements") => self.implements.extend(types),
            _ => {}
        }
        buffer.clear();
    }
}

fn tokenize_header(header: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in header.chars() {
        if ch.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else if ch == '<' || ch == '>' || ch == ',' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(ch.to_string());
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn split_type_list(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '<' => {
                depth += 1;
                current.push(ch);
            }
            '>' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                let name = util::strip_generics(&current);
                if !name.is_empty() {
                    out.push(name);
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    let name = util::strip_generics(&current);
    if !name.is_empty() {
        out.push(name);
    }
    out
}

/// Spans of comma-separated items between `start` and `end`, ignoring commas
/// nested in brackets or generics.
fn split_spans(text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut depth = 0i32;
    let mut from = start;
    for idx in start..end {
        match bytes[idx] {
            b'(' | b'{' | b'[' | b'<' => depth += 1,
            b')' | b'}' | b']' | b'>' => depth -= 1,
            b',' if depth == 0 => {
                spans.push((from, idx));
                from = idx + 1;
            }
            _ => {}
        }
    }
    if from < end {
        spans.push((from, end));
    }
    spans
}

fn matching(bytes: &[u8], open_at: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0u32;
    for (idx, &byte) in bytes.iter().enumerate().skip(open_at) {
        if byte == open {
            depth += 1;
        } else if byte == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// Blanks comments and literal contents, keeping byte offsets and newlines.
pub(crate) fn mask_source(source: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str,
        TextBlock,
        Char,
    }

    let bytes = source.as_bytes();
    let mut out = bytes.to_vec();
    let mut state = State::Code;
    let mut idx = 0;
    let blank = |out: &mut Vec<u8>, idx: usize| {
        if out[idx] != b'\n' {
            out[idx] = b' ';
        }
    };
    while idx < bytes.len() {
        let byte = bytes[idx];
        let next = bytes.get(idx + 1).copied();
        match state {
            State::Code => match byte {
                b'/' if next == Some(b'/') => {
                    state = State::LineComment;
                    blank(&mut out, idx);
                    blank(&mut out, idx + 1);
                    idx += 2;
                    continue;
                }
                b'/' if next == Some(b'*') => {
                    state = State::BlockComment;
                    blank(&mut out, idx);
                    blank(&mut out, idx + 1);
                    idx += 2;
                    continue;
                }
                b'"' if bytes[idx..].starts_with(b"\"\"\"") => {
                    state = State::TextBlock;
                    idx += 3;
                    continue;
                }
                b'"' => state = State::Str,
                b'\'' => state = State::Char,
                _ => {}
            },
            State::LineComment => {
                if byte == b'\n' {
                    state = State::Code;
                } else {
                    blank(&mut out, idx);
                }
            }
            State::BlockComment => {
                blank(&mut out, idx);
                if byte == b'*' && next == Some(b'/') {
                    blank(&mut out, idx + 1);
                    state = State::Code;
                    idx += 2;
                    continue;
                }
            }
            State::Str | State::Char => {
                let quote = if state == State::Str { b'"' } else { b'\'' };
                if byte == b'\\' {
                    blank(&mut out, idx);
                    if idx + 1 < bytes.len() {
                        blank(&mut out, idx + 1);
                    }
                    idx += 2;
                    continue;
                }
                if byte == quote || byte == b'\n' {
                    state = State::Code;
                } else {
                    blank(&mut out, idx);
                }
            }
            State::TextBlock => {
                if byte == b'\\' {
                    blank(&mut out, idx);
                    if idx + 1 < bytes.len() {
                        blank(&mut out, idx + 1);
                    }
                    idx += 2;
                    continue;
                }
                if bytes[idx..].starts_with(b"\"\"\"") {
                    state = State::Code;
                    idx += 3;
                    continue;
                }
                blank(&mut out, idx);
            }
        }
        idx += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|ch| !ch.is_whitespace()).collect()
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

fn is_keyword(value: &str) -> bool {
    KEYWORDS.contains(&value)
}

/// Offset of the actual return type inside a method match. The match can start
/// at a modifier when the return type is generic, as in `public <T> List<T>`,
/// so leading modifiers and type-parameter lists are skipped.
fn return_type_start(raw: &str) -> Option<usize> {
    let bytes = raw.as_bytes();
    let mut pos = 0;
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return None;
        }
        if bytes[pos] == b'<' {
            let mut depth = 0i32;
            let close = bytes[pos..].iter().position(|&byte| {
                match byte {
                    b'<' => depth += 1,
                    b'>' => depth -= 1,
                    _ => {}
                }
                depth == 0
            })?;
            pos += close + 1;
            continue;
        }
        let word_len = bytes[pos..]
            .iter()
            .position(|&byte| !(byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'))
            .unwrap_or(bytes.len() - pos);
        if word_len > 0 && pos + word_len < bytes.len() && is_modifier(&raw[pos..pos + word_len]) {
            pos += word_len;
            continue;
        }
        return Some(pos);
    }
}

pub(crate) fn is_modifier(value: &str) -> bool {
    MODIFIERS.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> ExtractedFile {
        PatternExtractor::new()
            .extract(source, "src/Sample.java")
            .unwrap()
    }

    #[test]
    fn masking_keeps_offsets() {
        let source = "int a; // class Hidden {}\nString s = \"class Fake {\"; /* enum X {} */";
        let masked = mask_source(source);
        assert_eq!(masked.len(), source.len());
        assert!(!masked.contains("Hidden"));
        assert!(!masked.contains("Fake"));
        assert!(!masked.contains("enum"));
        assert_eq!(masked.matches('\n').count(), 1);
    }

    #[test]
    fn header_clauses_split_generics() {
        let clauses =
            HeaderClauses::parse(" extends Base<Map<String, Integer>> implements Runnable, Comparable<Foo> ");
        assert_eq!(clauses.extends, vec!["Base"]);
        assert_eq!(clauses.implements, vec!["Runnable", "Comparable"]);
    }

    #[test]
    fn members_are_attributed_to_innermost_type() {
        let file = extract(
            r#"
package com.acme;

public class Outer {
    private int count = 0;

    public void run() {
        helper(1);
    }

    static class Inner {
        String label;
        String label() { return label; }
    }

    private void helper(int times) {}
}
"#,
        );
        assert_eq!(file.classes.len(), 2);
        let outer = &file.classes[0];
        let inner = &file.classes[1];
        let outer_methods: Vec<_> = outer.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(outer_methods, vec!["run", "helper"]);
        assert_eq!(outer.fields.len(), 1);
        assert_eq!(outer.fields[0].initial_value.as_deref(), Some("0"));
        let inner_methods: Vec<_> = inner.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(inner_methods, vec!["label"]);
        assert_eq!(inner.fields[0].name, "label");
        assert_eq!(inner.fields[0].class_name, "com.acme.Inner");
        assert_eq!(
            outer.calls,
            vec![CallSite {
                caller_method: "run".into(),
                receiver: None,
                callee_method: "helper".into(),
            }]
        );
    }

    #[test]
    fn constructors_and_control_flow_are_not_methods() {
        let file = extract(
            r#"
class Service {
    @Autowired
    Service(Repo repo) { this.repo = repo; }
    public Service() {}
    void work() {
        if (ready()) { return; }
        for (int i = 0; i < 3; i++) { new Thread(task()).start(); }
    }
}
"#,
        );
        let names: Vec<_> = file.classes[0]
            .methods
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["work"]);
        let callees: Vec<_> = file.classes[0]
            .calls
            .iter()
            .map(|c| c.callee_method.as_str())
            .collect();
        assert_eq!(callees, vec!["ready", "task"]);
    }

    #[test]
    fn file_scope_attributes_every_annotation() {
        let source = r#"
@RestController
class Api {
    @GetMapping
    String list() { return ""; }
    String other() { return ""; }
}
"#;
        let file = PatternExtractor::with_scope(AnnotationScope::File)
            .extract(source, "Api.java")
            .unwrap();
        let class = &file.classes[0];
        let names: Vec<_> = class.record.annotation_names().collect();
        assert_eq!(names, vec!["RestController", "GetMapping"]);
        assert_eq!(class.methods[1].annotations.len(), 2);
    }

    #[test]
    fn parameters_are_not_fields() {
        let file = extract(
            r#"
class Calc {
    private int total;
    public int add(int a, int b) { return a + b; }
    void run() { submit(new Runnable() { int runs; public void run() {} }); }
}
"#,
        );
        let fields: Vec<_> = file.classes[0]
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(fields, vec!["total"]);
    }

    #[test]
    fn generic_methods_keep_modifiers_out_of_the_return_type() {
        let file = extract(
            r#"
class Boxes {
    public <T> List<T> wrap(T item) { return List.of(item); }
    public static <K, V extends Comparable<V>> Map<K, V> index(List<V> values) { return null; }
    protected <T> T first(List<T> items) { return items.get(0); }
}
"#,
        );
        let methods = &file.classes[0].methods;
        let shapes: Vec<_> = methods
            .iter()
            .map(|m| (m.name.as_str(), m.return_type.as_str(), m.modifiers.clone()))
            .collect();
        assert_eq!(
            shapes,
            vec![
                ("wrap", "List<T>", vec!["public".to_string()]),
                (
                    "index",
                    "Map<K, V>",
                    vec!["public".to_string(), "static".to_string()]
                ),
                ("first", "T", vec!["protected".to_string()]),
            ]
        );
        assert_eq!(return_type_start("List<T>"), Some(0));
        assert_eq!(return_type_start("static <T> T[]"), Some(11));
    }

    #[test]
    fn initializers_keep_commas_inside_generics() {
        let file = extract(
            r#"
class Registry {
    private final Map<String, Integer> counts = new HashMap<String, Integer>();
    int low = 1, high = 2;
    Comparator<User> order = (a, b) -> a.compareTo(b);
}
"#,
        );
        let values: Vec<_> = file.classes[0]
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.initial_value.as_deref()))
            .collect();
        assert_eq!(
            values,
            vec![
                ("counts", Some("new HashMap<String, Integer>()")),
                ("low", Some("1")),
                ("order", Some("(a, b) -> a.compareTo(b)")),
            ]
        );
        assert_eq!(file.classes[0].fields[0].field_type, "Map<String, Integer>");
    }
}
