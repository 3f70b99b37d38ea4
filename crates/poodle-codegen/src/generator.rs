//! The AST walker.
//!
//! A first pass over each node list registers mixin definitions so calls
//! may precede them; the walk then emits literals, escaped and raw
//! expression writes, control statements, host blocks, and inlined mixin
//! bodies through the output writer.

use std::collections::HashMap;

use crate::output_writer::OutputWriter;
use crate::{CodegenError, CodegenErrorKind, Options};
use poodle_parser::ast::{
    Attribute, File, GoStatement, MixinCall, MixinDef, Node, StatementKeyword, Tag, Value,
};

struct Context<'a> {
    w: OutputWriter,
    opts: &'a Options,
    mixins: HashMap<String, &'a MixinDef>,
    mixin_call_stack: Vec<&'a MixinDef>,
}

/// Generate the Go source for one template file.
pub fn generate(file: &File, opts: &Options) -> Result<String, CodegenError> {
    let mut ctx = Context {
        w: OutputWriter::new(),
        opts,
        mixins: HashMap::new(),
        mixin_call_stack: Vec::new(),
    };
    ctx.visit_file(file)?;
    Ok(ctx.w.into_output())
}

impl<'a> Context<'a> {
    fn visit_file(&mut self, f: &'a File) -> Result<(), CodegenError> {
        let mut imports: Vec<String> = vec!["\"bufio\"".to_string(), "\"html\"".to_string()];
        imports.extend(f.imports.iter().cloned());
        imports.sort();
        imports.dedup();
        self.w.write_file_header(&self.opts.package, &imports);

        let mut name = f.name.clone();
        if self.opts.force_export {
            let mut chars = name.chars();
            if let Some(first) = chars.next() {
                name = first.to_uppercase().collect::<String>() + chars.as_str();
            }
        }
        self.w.write_func_header(&name, &f.args);

        self.visit_nodes(&f.nodes)?;

        self.w.write_block_end(true);
        Ok(())
    }

    fn visit_nodes(&mut self, nodes: &'a [Node]) -> Result<(), CodegenError> {
        // first pass, so mixins can be called before they are defined
        for node in nodes {
            if let Node::MixinDef(def) = node {
                self.mixins.insert(def.name.clone(), def);
            }
        }

        for node in nodes {
            self.visit_node(node)?;
        }
        Ok(())
    }

    fn visit_node(&mut self, node: &'a Node) -> Result<(), CodegenError> {
        match node {
            Node::Comment(n) => {
                self.w
                    .write_literal_unescaped(&format!("<!-- {} -->", n.text));
                Ok(())
            }

            Node::Doctype(n) => {
                self.w
                    .write_literal_unescaped(&format!("<!DOCTYPE {}>", n.value));
                Ok(())
            }

            Node::Tag(n) => self.visit_tag(n),

            Node::Text(n) => {
                self.visit_value(&n.value);
                Ok(())
            }

            Node::GoStatement(n) => self.visit_statement(n),

            Node::GoBlock(n) => {
                self.w.write_go_block(&n.contents);
                Ok(())
            }

            Node::MixinCall(n) => self.visit_mixin_call(n),

            // an include splices the target file's nodes in place
            Node::Include(n) => self.visit_nodes(&n.file.nodes),

            // registered in the first pass
            Node::MixinDef(_) => Ok(()),
        }
    }

    fn visit_tag(&mut self, n: &'a Tag) -> Result<(), CodegenError> {
        self.w.write_literal_unescaped(&format!("<{}", n.name));

        for attr in &n.attributes {
            if let Some(condition) = &attr.condition {
                self.w.write_statement_start(true, "if", condition);
                self.write_attribute(attr);
                self.w.write_block_end(true);
            } else {
                self.write_attribute(attr);
            }
        }

        if n.self_closing {
            self.w.write_literal_unescaped("/>");
        } else {
            self.w.write_literal_unescaped(">");
            for child in &n.nodes {
                self.visit_node(child)?;
            }
            self.w.write_literal_unescaped(&format!("</{}>", n.name));
        }
        Ok(())
    }

    fn write_attribute(&mut self, attr: &'a Attribute) {
        self.w
            .write_literal_unescaped(&format!(" {}=\"", attr.name));
        self.visit_value(&attr.value);
        self.w.write_literal_unescaped("\"");
    }

    fn visit_statement(&mut self, n: &'a GoStatement) -> Result<(), CodegenError> {
        let keyword = n.keyword.to_string();
        self.w.write_statement_start(
            n.keyword != StatementKeyword::Else,
            &keyword,
            &n.argument,
        );
        self.visit_nodes(&n.nodes)?;
        // when an else follows, its keyword continues the closing brace
        self.w.write_block_end(!n.has_else);
        Ok(())
    }

    fn visit_mixin_call(&mut self, n: &'a MixinCall) -> Result<(), CodegenError> {
        let def = match self.mixins.get(&n.name) {
            Some(def) => *def,
            None => {
                return Err(CodegenError {
                    kind: CodegenErrorKind::MixinNotFound {
                        name: n.name.clone(),
                    },
                    location: n.pos.clone(),
                });
            }
        };

        if self.mixin_call_stack.iter().any(|d| std::ptr::eq(*d, def)) {
            return Err(CodegenError {
                kind: CodegenErrorKind::RecursiveMixin,
                location: n.pos.clone(),
            });
        }

        if n.args.len() != def.args.len() {
            return Err(CodegenError {
                kind: CodegenErrorKind::MixinArity {
                    name: n.name.clone(),
                    want: def.args.len(),
                    got: n.args.len(),
                },
                location: n.pos.clone(),
            });
        }

        // a scope block keeps the argument bindings from leaking
        let has_args = !def.args.is_empty();
        if has_args {
            self.w.write_block_start();
        }
        for (formal, actual) in def.args.iter().zip(&n.args) {
            self.w.write_variable(&formal.name, &formal.typ, actual);
        }

        self.mixin_call_stack.push(def);
        self.visit_nodes(&def.nodes)?;
        self.mixin_call_stack.pop();

        if has_args {
            self.w.write_block_end(true);
        }
        Ok(())
    }

    fn visit_value(&mut self, value: &'a Value) {
        match value {
            Value::Literal { contents, .. } => self.w.write_literal_unescaped(contents),
            Value::GoExpr {
                contents,
                escape_html,
                ..
            } => {
                if *escape_html {
                    self.w.write_go_escaped(contents);
                } else {
                    self.w.write_go_unescaped(contents);
                }
            }
            Value::Concat { a, b, .. } => {
                self.visit_value(a);
                self.visit_value(b);
            }
        }
    }
}
