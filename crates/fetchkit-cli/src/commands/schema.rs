use std::fmt::Write;

use fetchkit_core::{AttributeSpec, NodeKind, NodeRule};
use serde::Serialize;

pub struct SchemaArgs {
    pub json: bool,
}

pub fn run(args: SchemaArgs) {
    if args.json {
        match schema_json() {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("error: {}", err);
                std::process::exit(1);
            }
        }
        return;
    }
    print!("{}", schema_text());
}

#[derive(Serialize)]
struct ElementSchema {
    tag: &'static str,
    kind: NodeKind,
    order: u32,
    /// `None` accepts any parent, empty means document root only.
    allowed_parents: Option<&'static [NodeKind]>,
    mandatory_child: Option<NodeKind>,
    attributes: &'static [AttributeSpec],
    rules: &'static [NodeRule],
}

fn elements() -> impl Iterator<Item = ElementSchema> {
    NodeKind::KNOWN.iter().filter_map(|&kind| {
        Some(ElementSchema {
            tag: kind.tag_name()?,
            kind,
            order: kind.order(),
            allowed_parents: kind.allowed_parents(),
            mandatory_child: kind.mandatory_child(),
            attributes: kind.attributes(),
            rules: kind.rules(),
        })
    })
}

pub fn schema_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&elements().collect::<Vec<_>>())
}

pub fn schema_text() -> String {
    let mut out = String::new();
    for element in elements() {
        let _ = write!(out, "<{}>", element.tag);
        match element.allowed_parents {
            Some([]) => out.push_str("  root"),
            Some(parents) => {
                let _ = write!(out, "  in {}", tags(parents));
            }
            None => {}
        }
        if let Some(child) = element.mandatory_child {
            let _ = write!(out, ", adds {}", tags(&[child]));
        }
        out.push('\n');

        let width = element
            .attributes
            .iter()
            .map(|spec| spec.name.len())
            .max()
            .unwrap_or(0);
        for spec in element.attributes {
            let _ = write!(
                out,
                "  {:width$}  {}",
                spec.name,
                spec.value_kind.describe(),
                width = width
            );
            if spec.content {
                out.push_str(" (element text)");
            }
            out.push('\n');
        }
    }
    out
}

fn tags(kinds: &[NodeKind]) -> String {
    kinds
        .iter()
        .filter_map(|kind| kind.tag_name())
        .map(|tag| format!("<{tag}>"))
        .collect::<Vec<_>>()
        .join(", ")
}
