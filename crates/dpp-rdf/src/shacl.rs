//! # SHACL Core Subset
//!
//! Shapes are compiled once from a shapes graph into [`CompiledShape`]
//! values; malformed constraint parameters (a non-numeric `sh:minCount`, an
//! invalid `sh:pattern`, an unsupported path expression) fail compilation
//! with [`RdfError::Shapes`]. Validation itself cannot fail.
//!
//! ## Supported
//!
//! | Feature | Terms |
//! |---------|-------|
//! | Targets | `sh:targetClass`, `sh:targetNode`, `sh:targetSubjectsOf`, `sh:targetObjectsOf`, implicit class targets |
//! | Paths | predicate IRI, `sh:inversePath` of a predicate IRI |
//! | Cardinality | `sh:minCount`, `sh:maxCount` |
//! | Value type | `sh:datatype`, `sh:class`, `sh:nodeKind` |
//! | String | `sh:pattern` with `sh:flags`, `sh:minLength`, `sh:maxLength` |
//! | Other | `sh:in`, `sh:hasValue` |
//! | Shape | `sh:property`, `sh:deactivated`, `sh:severity`, `sh:message` |
//!
//! Class membership follows `rdfs:subClassOf` chains found in either the
//! data graph or the shapes graph.

use std::collections::{BTreeSet, HashSet, VecDeque};

use dpp_core::Artifact;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::RdfError;
use crate::graph::{Node, RdfGraph};
use crate::jsonld::ContextSet;
use crate::vocab::{sh, RDFS_CLASS, RDFS_SUBCLASS_OF, RDF_FIRST, RDF_LANG_STRING, RDF_NIL, RDF_REST, RDF_TYPE, XSD};

/// Nested `sh:property` chains deeper than this are rejected.
const MAX_SHAPE_DEPTH: usize = 16;
/// `sh:in` lists longer than this are rejected.
const MAX_LIST_LEN: usize = 10_000;

/// `sh:severity` levels, ordered by gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ShaclSeverity {
    Info,
    Warning,
    Violation,
}

impl ShaclSeverity {
    fn from_iri(iri: &str) -> Option<Self> {
        match iri.strip_prefix(crate::vocab::SH)? {
            "Info" => Some(Self::Info),
            "Warning" => Some(Self::Warning),
            "Violation" => Some(Self::Violation),
            _ => None,
        }
    }
}

/// One validation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub focus_node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub source_shape: String,
    /// Local name of the constraint component, e.g. `MinCountConstraintComponent`.
    pub constraint_component: &'static str,
    pub severity: ShaclSeverity,
    pub message: String,
}

/// Outcome of validating one data graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShaclReport {
    pub conforms: bool,
    pub results: Vec<ValidationResult>,
}

impl ShaclReport {
    /// Most severe result, if any.
    pub fn max_severity(&self) -> Option<ShaclSeverity> {
        self.results.iter().map(|r| r.severity).max()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Class(Node),
    Node(Node),
    SubjectsOf(String),
    ObjectsOf(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PropertyPath {
    Predicate(String),
    Inverse(String),
}

impl PropertyPath {
    fn display(&self) -> String {
        match self {
            PropertyPath::Predicate(p) => format!("<{p}>"),
            PropertyPath::Inverse(p) => format!("^<{p}>"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Iri,
    BlankNode,
    Literal,
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    IriOrLiteral,
}

impl NodeKind {
    fn from_iri(iri: &str) -> Option<Self> {
        match iri.strip_prefix(crate::vocab::SH)? {
            "IRI" => Some(Self::Iri),
            "BlankNode" => Some(Self::BlankNode),
            "Literal" => Some(Self::Literal),
            "BlankNodeOrIRI" => Some(Self::BlankNodeOrIri),
            "BlankNodeOrLiteral" => Some(Self::BlankNodeOrLiteral),
            "IRIOrLiteral" => Some(Self::IriOrLiteral),
            _ => None,
        }
    }

    fn matches(self, node: &Node) -> bool {
        match (self, node) {
            (Self::Iri | Self::BlankNodeOrIri | Self::IriOrLiteral, Node::Iri(_)) => true,
            (Self::BlankNode | Self::BlankNodeOrIri | Self::BlankNodeOrLiteral, Node::Blank(_)) => true,
            (Self::Literal | Self::BlankNodeOrLiteral | Self::IriOrLiteral, Node::Literal(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
enum Constraint {
    MinCount(usize),
    MaxCount(usize),
    Datatype(String),
    Class(Node),
    NodeKind(NodeKind),
    Pattern { regex: Regex, source: String },
    MinLength(usize),
    MaxLength(usize),
    In(Vec<Node>),
    HasValue(Node),
}

impl Constraint {
    fn component(&self) -> &'static str {
        match self {
            Constraint::MinCount(_) => "MinCountConstraintComponent",
            Constraint::MaxCount(_) => "MaxCountConstraintComponent",
            Constraint::Datatype(_) => "DatatypeConstraintComponent",
            Constraint::Class(_) => "ClassConstraintComponent",
            Constraint::NodeKind(_) => "NodeKindConstraintComponent",
            Constraint::Pattern { .. } => "PatternConstraintComponent",
            Constraint::MinLength(_) => "MinLengthConstraintComponent",
            Constraint::MaxLength(_) => "MaxLengthConstraintComponent",
            Constraint::In(_) => "InConstraintComponent",
            Constraint::HasValue(_) => "HasValueConstraintComponent",
        }
    }
}

/// A node or property shape with its constraints resolved.
#[derive(Debug, Clone)]
pub struct CompiledShape {
    id: Node,
    targets: Vec<Target>,
    path: Option<PropertyPath>,
    deactivated: bool,
    severity: ShaclSeverity,
    message: Option<String>,
    constraints: Vec<Constraint>,
    properties: Vec<CompiledShape>,
}

/// A compiled shapes graph, ready to validate data graphs.
#[derive(Debug, Clone)]
pub struct ShapesGraph {
    graph: RdfGraph,
    shapes: Vec<CompiledShape>,
}

impl ShapesGraph {
    /// Parse and compile a shapes artifact.
    pub fn from_artifact(artifact: &Artifact) -> Result<Self, RdfError> {
        let graph = crate::to_rdf_graph(artifact, &ContextSet::new())?;
        Self::from_graph(graph)
    }

    /// Compile every targeted shape in `graph`.
    pub fn from_graph(graph: RdfGraph) -> Result<Self, RdfError> {
        let mut roots = BTreeSet::new();
        for kind in ["NodeShape", "PropertyShape"] {
            let class = Node::Iri(sh(kind));
            roots.extend(graph.subjects(RDF_TYPE, &class).cloned());
        }
        for predicate in ["targetClass", "targetNode", "targetSubjectsOf", "targetObjectsOf"] {
            roots.extend(graph.with_predicate(&sh(predicate)).map(|(s, _)| s.clone()));
        }

        let mut shapes = Vec::new();
        for root in roots {
            let shape = compile_shape(&graph, &root, 0)?;
            if !shape.targets.is_empty() {
                shapes.push(shape);
            }
        }
        tracing::debug!(shapes = shapes.len(), triples = graph.len(), "compiled shapes graph");
        Ok(Self { graph, shapes })
    }

    /// Number of targeted shapes.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Validate a data graph.
    pub fn validate(&self, data: &RdfGraph) -> ShaclReport {
        let ctx = Validation {
            data,
            shapes: &self.graph,
        };
        let mut results = Vec::new();
        for shape in &self.shapes {
            if shape.deactivated {
                continue;
            }
            for focus in ctx.focus_nodes(&shape.targets) {
                ctx.validate_shape(shape, &focus, &mut results);
            }
        }
        ShaclReport {
            conforms: results.is_empty(),
            results,
        }
    }
}

fn compile_shape(graph: &RdfGraph, id: &Node, depth: usize) -> Result<CompiledShape, RdfError> {
    if depth > MAX_SHAPE_DEPTH {
        return Err(RdfError::Shapes(format!("sh:property nesting too deep at {id}")));
    }

    let mut targets = Vec::new();
    for class in graph.objects(id, &sh("targetClass")) {
        targets.push(Target::Class(class.clone()));
    }
    for node in graph.objects(id, &sh("targetNode")) {
        targets.push(Target::Node(node.clone()));
    }
    for predicate in graph.objects(id, &sh("targetSubjectsOf")) {
        targets.push(Target::SubjectsOf(expect_iri(predicate, "sh:targetSubjectsOf")?));
    }
    for predicate in graph.objects(id, &sh("targetObjectsOf")) {
        targets.push(Target::ObjectsOf(expect_iri(predicate, "sh:targetObjectsOf")?));
    }
    let is_shape = [sh("NodeShape"), sh("PropertyShape")]
        .iter()
        .any(|t| graph.contains(id, RDF_TYPE, &Node::Iri(t.clone())));
    if is_shape && graph.contains(id, RDF_TYPE, &Node::iri(RDFS_CLASS)) {
        targets.push(Target::Class(id.clone()));
    }

    let path = match graph.object(id, &sh("path")) {
        None => None,
        Some(path) => Some(compile_path(graph, path)?),
    };

    let deactivated = graph
        .object(id, &sh("deactivated"))
        .and_then(Node::as_literal)
        .is_some_and(|lit| lit.lexical == "true" || lit.lexical == "1");

    let severity = match graph.object(id, &sh("severity")) {
        None => ShaclSeverity::Violation,
        Some(node) => node
            .as_iri()
            .and_then(ShaclSeverity::from_iri)
            .ok_or_else(|| RdfError::Shapes(format!("unknown sh:severity {node} on {id}")))?,
    };

    let message = graph
        .object(id, &sh("message"))
        .and_then(Node::as_literal)
        .map(|lit| lit.lexical.clone());

    let mut constraints = Vec::new();
    if let Some(n) = graph.object(id, &sh("minCount")) {
        constraints.push(Constraint::MinCount(expect_count(n, "sh:minCount")?));
    }
    if let Some(n) = graph.object(id, &sh("maxCount")) {
        constraints.push(Constraint::MaxCount(expect_count(n, "sh:maxCount")?));
    }
    for dt in graph.objects(id, &sh("datatype")) {
        constraints.push(Constraint::Datatype(expect_iri(dt, "sh:datatype")?));
    }
    for class in graph.objects(id, &sh("class")) {
        constraints.push(Constraint::Class(class.clone()));
    }
    for kind in graph.objects(id, &sh("nodeKind")) {
        let parsed = kind
            .as_iri()
            .and_then(NodeKind::from_iri)
            .ok_or_else(|| RdfError::Shapes(format!("unknown sh:nodeKind {kind} on {id}")))?;
        constraints.push(Constraint::NodeKind(parsed));
    }
    let flags = graph
        .object(id, &sh("flags"))
        .and_then(Node::as_literal)
        .map(|lit| lit.lexical.as_str())
        .unwrap_or("");
    for pattern in graph.objects(id, &sh("pattern")) {
        let source = pattern
            .as_literal()
            .map(|lit| lit.lexical.clone())
            .ok_or_else(|| RdfError::Shapes(format!("sh:pattern on {id} must be a literal")))?;
        constraints.push(Constraint::Pattern {
            regex: build_regex(&source, flags)?,
            source,
        });
    }
    if let Some(n) = graph.object(id, &sh("minLength")) {
        constraints.push(Constraint::MinLength(expect_count(n, "sh:minLength")?));
    }
    if let Some(n) = graph.object(id, &sh("maxLength")) {
        constraints.push(Constraint::MaxLength(expect_count(n, "sh:maxLength")?));
    }
    for list in graph.objects(id, &sh("in")) {
        constraints.push(Constraint::In(read_list(graph, list)?));
    }
    for value in graph.objects(id, &sh("hasValue")) {
        constraints.push(Constraint::HasValue(value.clone()));
    }

    let mut properties = Vec::new();
    for property in graph.objects(id, &sh("property")) {
        let compiled = compile_shape(graph, property, depth + 1)?;
        if compiled.path.is_none() {
            return Err(RdfError::Shapes(format!("property shape {property} has no sh:path")));
        }
        properties.push(compiled);
    }

    Ok(CompiledShape {
        id: id.clone(),
        targets,
        path,
        deactivated,
        severity,
        message,
        constraints,
        properties,
    })
}

fn compile_path(graph: &RdfGraph, path: &Node) -> Result<PropertyPath, RdfError> {
    if let Some(iri) = path.as_iri() {
        return Ok(PropertyPath::Predicate(iri.to_string()));
    }
    match graph.object(path, &sh("inversePath")).and_then(Node::as_iri) {
        Some(iri) => Ok(PropertyPath::Inverse(iri.to_string())),
        None => Err(RdfError::Shapes(format!("unsupported sh:path expression {path}"))),
    }
}

fn expect_iri(node: &Node, what: &str) -> Result<String, RdfError> {
    node.as_iri()
        .map(str::to_string)
        .ok_or_else(|| RdfError::Shapes(format!("{what} must be an IRI, got {node}")))
}

fn expect_count(node: &Node, what: &str) -> Result<usize, RdfError> {
    node.as_literal()
        .and_then(|lit| lit.lexical.trim().parse().ok())
        .ok_or_else(|| RdfError::Shapes(format!("{what} must be a non-negative integer, got {node}")))
}

fn build_regex(source: &str, flags: &str) -> Result<Regex, RdfError> {
    let mut builder = RegexBuilder::new(source);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => return Err(RdfError::Shapes(format!("unsupported sh:flags character {other:?}"))),
        };
    }
    builder
        .build()
        .map_err(|e| RdfError::Shapes(format!("invalid sh:pattern {source:?}: {e}")))
}

fn read_list(graph: &RdfGraph, head: &Node) -> Result<Vec<Node>, RdfError> {
    let nil = Node::iri(RDF_NIL);
    let mut items = Vec::new();
    let mut cursor = head.clone();
    while cursor != nil {
        if items.len() > MAX_LIST_LEN {
            return Err(RdfError::Shapes("sh:in list too long or cyclic".to_string()));
        }
        let first = graph
            .object(&cursor, RDF_FIRST)
            .ok_or_else(|| RdfError::Shapes(format!("malformed RDF list at {cursor}")))?;
        items.push(first.clone());
        cursor = graph
            .object(&cursor, RDF_REST)
            .cloned()
            .ok_or_else(|| RdfError::Shapes(format!("malformed RDF list at {cursor}")))?;
    }
    Ok(items)
}

struct Validation<'a> {
    data: &'a RdfGraph,
    shapes: &'a RdfGraph,
}

impl Validation<'_> {
    fn focus_nodes(&self, targets: &[Target]) -> BTreeSet<Node> {
        let mut focus = BTreeSet::new();
        for target in targets {
            match target {
                Target::Node(node) => {
                    focus.insert(node.clone());
                }
                Target::Class(class) => {
                    for sub in self.subclasses(class) {
                        focus.extend(self.data.subjects(RDF_TYPE, &sub).cloned());
                    }
                }
                Target::SubjectsOf(p) => {
                    focus.extend(self.data.with_predicate(p).map(|(s, _)| s.clone()));
                }
                Target::ObjectsOf(p) => {
                    focus.extend(self.data.with_predicate(p).map(|(_, o)| o.clone()));
                }
            }
        }
        focus
    }

    /// `class` and every class declared a subclass of it, transitively.
    fn subclasses(&self, class: &Node) -> HashSet<Node> {
        let mut seen = HashSet::from([class.clone()]);
        let mut queue = VecDeque::from([class.clone()]);
        while let Some(current) = queue.pop_front() {
            let direct = self
                .data
                .subjects(RDFS_SUBCLASS_OF, &current)
                .chain(self.shapes.subjects(RDFS_SUBCLASS_OF, &current));
            for sub in direct {
                if seen.insert(sub.clone()) {
                    queue.push_back(sub.clone());
                }
            }
        }
        seen
    }

    fn is_instance(&self, node: &Node, class: &Node) -> bool {
        if node.is_literal() {
            return false;
        }
        let subclasses = self.subclasses(class);
        self.data
            .objects(node, RDF_TYPE)
            .any(|t| subclasses.contains(t))
    }

    fn value_nodes(&self, focus: &Node, path: &PropertyPath) -> Vec<Node> {
        let values: BTreeSet<Node> = match path {
            PropertyPath::Predicate(p) => self.data.objects(focus, p).cloned().collect(),
            PropertyPath::Inverse(p) => self.data.subjects(p, focus).cloned().collect(),
        };
        values.into_iter().collect()
    }

    fn validate_shape(&self, shape: &CompiledShape, focus: &Node, out: &mut Vec<ValidationResult>) {
        if shape.deactivated {
            return;
        }
        let values = match &shape.path {
            None => vec![focus.clone()],
            Some(path) => self.value_nodes(focus, path),
        };
        let result = |constraint: &Constraint, value: Option<&Node>, detail: String| ValidationResult {
            focus_node: focus.to_string(),
            result_path: shape.path.as_ref().map(PropertyPath::display),
            value: value.map(Node::to_string),
            source_shape: shape.id.to_string(),
            constraint_component: constraint.component(),
            severity: shape.severity,
            message: shape.message.clone().unwrap_or(detail),
        };

        for constraint in &shape.constraints {
            match constraint {
                Constraint::MinCount(min) if values.len() < *min => {
                    out.push(result(constraint, None, format!("less than {min} values ({})", values.len())));
                }
                Constraint::MaxCount(max) if values.len() > *max => {
                    out.push(result(constraint, None, format!("more than {max} values ({})", values.len())));
                }
                Constraint::HasValue(expected) if !values.contains(expected) => {
                    out.push(result(constraint, None, format!("missing required value {expected}")));
                }
                Constraint::MinCount(_) | Constraint::MaxCount(_) | Constraint::HasValue(_) => {}
                _ => {
                    for value in &values {
                        if let Some(detail) = self.check_value(constraint, value) {
                            out.push(result(constraint, Some(value), detail));
                        }
                    }
                }
            }
        }

        for property in &shape.properties {
            self.validate_shape(property, focus, out);
        }
    }

    /// `Some(message)` when `value` violates a value-level constraint.
    fn check_value(&self, constraint: &Constraint, value: &Node) -> Option<String> {
        let ok = match constraint {
            Constraint::Datatype(dt) => value.as_literal().is_some_and(|lit| {
                lit.datatype == *dt && (dt == RDF_LANG_STRING || lit.language.is_none())
                    && lexically_valid(&lit.lexical, dt)
            }),
            Constraint::Class(class) => self.is_instance(value, class),
            Constraint::NodeKind(kind) => kind.matches(value),
            Constraint::Pattern { regex, .. } => string_form(value).is_some_and(|s| regex.is_match(s)),
            Constraint::MinLength(min) => string_form(value).is_some_and(|s| s.chars().count() >= *min),
            Constraint::MaxLength(max) => string_form(value).is_some_and(|s| s.chars().count() <= *max),
            Constraint::In(allowed) => allowed.contains(value),
            Constraint::MinCount(_) | Constraint::MaxCount(_) | Constraint::HasValue(_) => true,
        };
        if ok {
            return None;
        }
        Some(match constraint {
            Constraint::Datatype(dt) => format!("value {value} is not a valid <{dt}>"),
            Constraint::Class(class) => format!("value {value} is not an instance of {class}"),
            Constraint::NodeKind(kind) => format!("value {value} is not of node kind {kind:?}"),
            Constraint::Pattern { source, .. } => format!("value {value} does not match pattern {source:?}"),
            Constraint::MinLength(min) => format!("value {value} is shorter than {min}"),
            Constraint::MaxLength(max) => format!("value {value} is longer than {max}"),
            Constraint::In(_) => format!("value {value} is not in the allowed list"),
            _ => format!("value {value} violates {}", constraint.component()),
        })
    }
}

/// Lexical form of literals and IRIs; blank nodes have none.
fn string_form(node: &Node) -> Option<&str> {
    match node {
        Node::Iri(iri) => Some(iri),
        Node::Literal(lit) => Some(&lit.lexical),
        Node::Blank(_) => None,
    }
}

/// Well-formedness of common XSD lexical spaces. Unknown datatypes pass.
fn lexically_valid(lexical: &str, datatype: &str) -> bool {
    let Some(local) = datatype.strip_prefix(XSD) else {
        return true;
    };
    match local {
        "integer" | "int" | "long" | "short" | "byte" | "nonNegativeInteger" | "positiveInteger"
        | "negativeInteger" | "nonPositiveInteger" | "unsignedInt" | "unsignedLong"
        | "unsignedShort" | "unsignedByte" => {
            let Ok(n) = lexical.trim().parse::<i128>() else {
                return false;
            };
            match local {
                "nonNegativeInteger" | "unsignedInt" | "unsignedLong" | "unsignedShort" | "unsignedByte" => n >= 0,
                "positiveInteger" => n > 0,
                "negativeInteger" => n < 0,
                "nonPositiveInteger" => n <= 0,
                "int" => i32::try_from(n).is_ok(),
                "long" => i64::try_from(n).is_ok(),
                "short" => i16::try_from(n).is_ok(),
                "byte" => i8::try_from(n).is_ok(),
                _ => true,
            }
        }
        "decimal" => {
            let s = lexical.trim();
            let s = s.strip_prefix(['+', '-']).unwrap_or(s);
            let (int, frac) = s.split_once('.').unwrap_or((s, ""));
            !(int.is_empty() && frac.is_empty())
                && int.chars().all(|c| c.is_ascii_digit())
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        "double" | "float" => {
            matches!(lexical.trim(), "INF" | "-INF" | "+INF" | "NaN") || lexical.trim().parse::<f64>().is_ok()
        }
        "boolean" => matches!(lexical.trim(), "true" | "false" | "1" | "0"),
        "date" => {
            let s = lexical.trim();
            let date = s.get(..10).unwrap_or(s);
            chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() && valid_tz(&s[date.len()..])
        }
        "dateTime" => {
            let s = lexical.trim();
            chrono::DateTime::parse_from_rfc3339(s).is_ok()
                || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        }
        _ => true,
    }
}

fn valid_tz(suffix: &str) -> bool {
    suffix.is_empty()
        || suffix == "Z"
        || chrono::NaiveTime::parse_from_str(suffix.get(1..).unwrap_or(""), "%H:%M").is_ok()
            && suffix.starts_with(['+', '-'])
}
