//! JUnit XML ingestion.
//!
//! Accepts either a `<testsuites>` root or a single `<testsuite>` root. The
//! document is first read into a small element tree and then mapped onto
//! [`Suite`] / [`Case`].

use crate::errors::LedgerError;
use crate::model::{Case, CaseError, Properties, Status, Suite};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parses every file in order and concatenates their suites.
pub fn parse_files(paths: &[PathBuf]) -> Result<Vec<Suite>, LedgerError> {
    let mut suites = Vec::new();
    for path in paths {
        suites.extend(parse_file(path)?);
    }
    Ok(suites)
}

pub fn parse_file(path: &Path) -> Result<Vec<Suite>, LedgerError> {
    let xml = std::fs::read_to_string(path).map_err(|e| LedgerError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let suites = parse_str(&xml, &path.display().to_string())?;
    tracing::debug!(
        event = "junit_parsed",
        path = %path.display(),
        suites = suites.len()
    );
    Ok(suites)
}

/// `origin` names the input in error messages.
pub fn parse_str(xml: &str, origin: &str) -> Result<Vec<Suite>, LedgerError> {
    let parse_err = |message: String| LedgerError::Parse {
        path: origin.to_string(),
        message,
    };

    let root = read_tree(xml).map_err(parse_err)?;
    match root.name.as_str() {
        "testsuites" => Ok(root
            .children
            .iter()
            .filter(|n| n.name == "testsuite")
            .map(ingest_suite)
            .collect()),
        "testsuite" => Ok(vec![ingest_suite(&root)]),
        other => Err(parse_err(format!(
            "unexpected root element <{}>, expected <testsuites> or <testsuite>",
            other
        ))),
    }
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn attr(&self, key: &str) -> &str {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    fn attr_map(&self) -> Properties {
        self.attrs.iter().cloned().collect()
    }
}

fn read_tree(xml: &str) -> Result<Node, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(open_node(&e)?),
            Ok(Event::Empty(e)) => {
                let node = open_node(&e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::End(_)) => {
                let node = stack.pop().ok_or("unbalanced closing tag")?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "malformed XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unexpected end of document inside <{}>", open.name));
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

fn open_node(e: &BytesStart<'_>) -> Result<Node, String> {
    let mut node = Node {
        name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        node.attrs.push((key, value.into_owned()));
    }
    Ok(node)
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(format!("second root element <{}>", node.name));
    }
    *root = Some(node);
    Ok(())
}

fn ingest_suite(node: &Node) -> Suite {
    let mut suite = Suite {
        name: node.attr("name").to_string(),
        package: node.attr("package").to_string(),
        properties: node.attr_map(),
        ..Default::default()
    };

    for child in &node.children {
        match child.name.as_str() {
            "testsuite" => suite.suites.push(ingest_suite(child)),
            "testcase" => suite.tests.push(ingest_case(child)),
            "properties" => suite.properties.extend(ingest_properties(child)),
            "system-out" => suite.system_out = child.text.clone(),
            "system-err" => suite.system_err = child.text.clone(),
            _ => {}
        }
    }

    suite.aggregate();
    suite
}

fn ingest_case(node: &Node) -> Case {
    let mut case = Case {
        name: node.attr("name").to_string(),
        classname: node.attr("classname").to_string(),
        duration: parse_seconds(node.attr("time")),
        status: Status::Passed,
        properties: node.attr_map(),
        ..Default::default()
    };

    for child in &node.children {
        match child.name.as_str() {
            "skipped" => {
                case.status = Status::Skipped;
                case.message = child.attr("message").to_string();
            }
            "failure" => {
                case.status = Status::Failed;
                case.message = child.attr("message").to_string();
                case.error = Some(ingest_error(child));
            }
            "error" => {
                case.status = Status::Error;
                case.message = child.attr("message").to_string();
                case.error = Some(ingest_error(child));
            }
            "properties" => case.properties.extend(ingest_properties(child)),
            "system-out" => case.system_out = child.text.clone(),
            "system-err" => case.system_err = child.text.clone(),
            _ => {}
        }
    }
    case
}

fn ingest_error(node: &Node) -> CaseError {
    CaseError {
        message: node.attr("message").to_string(),
        kind: node.attr("type").to_string(),
        body: node.text.clone(),
    }
}

fn ingest_properties(node: &Node) -> Properties {
    node.children
        .iter()
        .filter(|p| p.name == "property")
        .map(|p| (p.attr("name").to_string(), p.attr("value").to_string()))
        .collect()
}

/// JUnit `time` attributes are seconds; some producers use `,` as decimal mark.
/// Values past the `Duration` range saturate.
fn parse_seconds(raw: &str) -> Duration {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| Duration::try_from_secs_f64(s).unwrap_or(Duration::MAX))
        .unwrap_or_default()
}
