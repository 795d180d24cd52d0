//! # Dependency-Ordered Emission
//!
//! Turns a fully translated [`DiscoveredSet`] into module text. Each root is
//! visited depth-first; its dependencies are emitted before it, in the order
//! its body first referenced them. A declaration is emitted at most once.
//!
//! ## Layout
//!
//! ```text
//! /**
//!  * This file is generated by zodgen. Do not edit it by hand.
//!  */
//!
//! import { z } from 'zod';
//!
//! export const AddressSchema = z.object({...});
//! export type Address = z.infer<typeof AddressSchema>;
//!
//! export const UserSchema = z.object({...});
//! export type User = z.infer<typeof UserSchema>;
//! ```

use std::collections::HashSet;

use tracing::warn;
use zodgen_core::QualifiedName;

use crate::discovered::{DiscoveredSet, Entry};

/// Comment block opening every generated module.
pub const BANNER: &str = "/**\n * This file is generated by zodgen. Do not edit it by hand.\n */\n";

/// Import of the validation library.
pub const IMPORT: &str = "import { z } from 'zod';\n";

/// Module text and the declarations it contains, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    /// Declarations the unit itself makes, in extraction order.
    pub roots: Vec<QualifiedName>,
    /// Declarations in the order their constants appear.
    pub declarations: Vec<QualifiedName>,
    /// Complete module text, newline-terminated.
    pub text: String,
}

/// Schema constant and inferred type alias for one declaration.
pub fn render_block(entry: &Entry, body: &str) -> String {
    let identifier = entry.declaration.schema_identifier();
    format!(
        "export const {identifier} = {body};\nexport type {} = z.infer<typeof {identifier}>;",
        entry.declaration.type_alias()
    )
}

/// Emit every declaration reachable from `roots`, dependencies first.
pub fn emit(set: &DiscoveredSet, roots: &[QualifiedName]) -> CompiledUnit {
    let mut emitter = Emitter {
        set,
        visiting: HashSet::new(),
        emitted: HashSet::new(),
        declarations: Vec::with_capacity(set.len()),
        blocks: Vec::with_capacity(set.len()),
    };
    for root in roots {
        emitter.visit(root);
    }

    CompiledUnit {
        roots: roots.to_vec(),
        declarations: emitter.declarations,
        text: format!("{BANNER}\n{IMPORT}\n{}\n", emitter.blocks.join("\n\n")),
    }
}

struct Emitter<'a> {
    set: &'a DiscoveredSet,
    visiting: HashSet<&'a QualifiedName>,
    emitted: HashSet<&'a QualifiedName>,
    declarations: Vec<QualifiedName>,
    blocks: Vec<String>,
}

impl<'a> Emitter<'a> {
    fn visit(&mut self, name: &QualifiedName) {
        let set = self.set;
        let Some(entry) = set.get(name) else {
            return;
        };
        let name = &entry.declaration.name;
        if self.emitted.contains(name) || !self.visiting.insert(name) {
            return;
        }

        for dependency in &entry.dependencies {
            if self.visiting.contains(dependency) {
                warn!(
                    declaration = %name,
                    dependency = %dependency,
                    "reference cycle; {dependency} is emitted after a declaration that uses it"
                );
                continue;
            }
            self.visit(dependency);
        }

        self.visiting.remove(name);
        self.emitted.insert(name);
        if let Some(body) = &entry.body {
            self.blocks.push(render_block(entry, body));
            self.declarations.push(name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zodgen_core::Declaration;

    fn set_with(entries: &[(&str, &str, &[&str])]) -> DiscoveredSet {
        let mut set = DiscoveredSet::new();
        for (name, body, deps) in entries {
            let name = QualifiedName::new(name);
            set.insert(Declaration::record(name.clone(), vec![])).unwrap();
            set.complete(
                &name,
                body.to_string(),
                deps.iter().map(QualifiedName::new).collect(),
            );
        }
        set
    }

    fn names(unit: &CompiledUnit) -> Vec<&str> {
        unit.declarations.iter().map(|n| n.as_str()).collect()
    }

    #[test]
    fn layout_matches_module_format() {
        let set = set_with(&[("User", "z.object({})", &[])]);
        let unit = emit(&set, &[QualifiedName::new("User")]);
        assert_eq!(
            unit.text,
            "/**\n * This file is generated by zodgen. Do not edit it by hand.\n */\n\n\
             import { z } from 'zod';\n\n\
             export const UserSchema = z.object({});\n\
             export type User = z.infer<typeof UserSchema>;\n"
        );
    }

    #[test]
    fn dependencies_precede_dependents() {
        let set = set_with(&[
            ("Order", "A", &["Order::Line", "Customer"]),
            ("Order::Line", "B", &["Product"]),
            ("Customer", "C", &[]),
            ("Product", "D", &[]),
        ]);
        let unit = emit(&set, &[QualifiedName::new("Order")]);
        assert_eq!(names(&unit), vec!["Product", "Order::Line", "Customer", "Order"]);
    }

    #[test]
    fn shared_dependency_is_emitted_once() {
        let set = set_with(&[
            ("A", "a", &["Shared"]),
            ("B", "b", &["Shared"]),
            ("Shared", "s", &[]),
        ]);
        let unit = emit(&set, &[QualifiedName::new("A"), QualifiedName::new("B")]);
        assert_eq!(names(&unit), vec!["Shared", "A", "B"]);
        assert_eq!(unit.text.matches("export const SharedSchema").count(), 1);
    }

    #[test]
    fn cycles_emit_each_declaration_once() {
        let set = set_with(&[("Node", "n", &["Edge"]), ("Edge", "e", &["Node", "Edge"])]);
        let unit = emit(&set, &[QualifiedName::new("Node")]);
        assert_eq!(names(&unit), vec!["Edge", "Node"]);
    }

    #[test]
    fn blocks_are_separated_by_one_blank_line() {
        let set = set_with(&[("A", "a", &[]), ("B", "b", &[])]);
        let unit = emit(&set, &[QualifiedName::new("A"), QualifiedName::new("B")]);
        assert!(unit
            .text
            .contains("typeof ASchema>;\n\nexport const BSchema = b;"));
        assert!(unit.text.ends_with(">;\n"));
    }
}
