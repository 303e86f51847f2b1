//! Diagnostic and namespace-maintenance traversals over parse trees.

use crate::{
    grammar::Construct,
    interpreter::Interpreter,
    tree::{NodeValue, Tree, Visitor},
    Handler,
};
use core::fmt;
use log::debug;

/// Dumps the tree as an indented layout, one node per line, with leaf values
/// and deferred-range annotations. Writes into any `fmt::Write`; formatting
/// errors are latched in `result`.
pub struct PrintLayoutVisitor<'w, W: fmt::Write> {
    out: &'w mut W,
    depth: usize,
    pub result: fmt::Result,
}

impl<'w, W: fmt::Write> PrintLayoutVisitor<'w, W> {
    pub fn new(out: &'w mut W) -> PrintLayoutVisitor<'w, W> {
        PrintLayoutVisitor { out, depth: 0, result: Ok(()) }
    }
}

/// Renders `tree` into `out`.
pub fn print_layout<W: fmt::Write>(tree: &Tree, out: &mut W) -> fmt::Result {
    let mut visitor = PrintLayoutVisitor::new(out);
    tree.walk(&mut visitor);
    visitor.result
}

impl<'w, W: fmt::Write> Visitor for PrintLayoutVisitor<'w, W> {
    fn visit(&mut self, tree: &Tree) -> bool {
        let mut print = || -> fmt::Result {
            for _ in 0..self.depth {
                self.out.write_str("  ")?;
            }
            write!(self.out, "{:?}", tree.construct)?;
            match &tree.value {
                NodeValue::None => (),
                NodeValue::Integer(value) => write!(self.out, " {:#x}", value)?,
                NodeValue::String(string) => write!(self.out, " {:?}", string)?,
                NodeValue::Bytes(bytes) => write!(self.out, " [{} bytes]", bytes.len())?,
                NodeValue::Name(name) => write!(self.out, " {}", name)?,
            }
            if let Some(range) = &tree.deferred {
                write!(self.out, " (deferred {:#x}..{:#x})", range.start, range.end)?;
            }
            self.out.write_str("\n")
        };
        if self.result.is_ok() {
            self.result = print();
        }
        self.depth += 1;
        true
    }

    fn depart(&mut self, _tree: &Tree) {
        self.depth -= 1;
    }
}

/// Prunes symbols declared in statically-dead `If`/`Else` arms.
///
/// Firmware commonly guards alternative device declarations behind mutually
/// exclusive predicates over static configuration. Re-evaluating each
/// predicate lets the dead arm's `Name`/`Method`/`Device` symbols be dropped
/// from the namespace, so device enumeration only sees the live variant. A
/// predicate that fails to evaluate leaves its branch untouched.
pub struct ConditionallyUnregisterSymbolVisitor<'c, H: Handler> {
    pub interpreter: Interpreter<'c, H>,
}

impl<'c, H: Handler> ConditionallyUnregisterSymbolVisitor<'c, H> {
    pub fn new(interpreter: Interpreter<'c, H>) -> ConditionallyUnregisterSymbolVisitor<'c, H> {
        ConditionallyUnregisterSymbolVisitor { interpreter }
    }

    pub fn run(&mut self, tree: &Tree) {
        self.walk(tree);
    }

    fn walk(&mut self, tree: &Tree) {
        if tree.construct == Construct::DefIfElse {
            if let Some(live) = self.split_arms(tree) {
                let (live_arm, dead_arm) = live;
                if let Some(dead) = dead_arm {
                    self.unregister_branch(dead);
                }
                if let Some(live) = live_arm {
                    self.walk(live);
                }
                return;
            }
        }
        for child in &tree.children {
            self.walk(child);
        }
    }

    /// Evaluates the predicate and returns `(live arm, dead arm)`, or `None`
    /// when the predicate cannot be decided statically.
    fn split_arms<'t>(&mut self, tree: &'t Tree) -> Option<(Option<&'t Tree>, Option<&'t Tree>)> {
        let predicate = tree.child("Predicate")?;
        let value = match self.interpreter.eval_expression(predicate) {
            Ok(value) => value,
            Err(err) => {
                debug!("predicate not statically evaluable, keeping both arms: {:?}", err);
                return None;
            }
        };
        let taken = match value.to_integer() {
            Ok(value) => value != 0,
            Err(_) => return None,
        };

        let then_arm = tree.child("TermList");
        let else_arm =
            tree.child("DefElse").and_then(|else_node| else_node.child("TermList"));
        if taken {
            Some((then_arm, else_arm))
        } else {
            Some((else_arm, then_arm))
        }
    }

    fn unregister_branch(&mut self, tree: &Tree) {
        match tree.construct {
            Construct::DefName | Construct::DefMethod | Construct::DefDevice => {
                let path = tree
                    .child("NameString")
                    .and_then(|child| child.as_name().ok())
                    .and_then(|name| name.resolve(&tree.scope).ok());
                if let Some(path) = path {
                    debug!("unregistering {} from a dead branch", path);
                    self.interpreter.context.unregister_symbol(&path);
                }
            }
            _ => (),
        }
        // Everything below a dead arm is dead too.
        for child in &tree.children {
            self.unregister_branch(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::Context,
        namespace::AmlName,
        parser::parse_table,
        test_utils::{make_test_table, TestHandler},
    };
    use alloc::string::String;

    #[test]
    fn test_print_layout() {
        let mut context = Context::new();
        let table = make_test_table(&[0x08, b'F', b'O', b'O', b'_', 0x0a, 0x2a]);
        let tree = parse_table(&mut context, &table).unwrap();

        let mut rendered = String::new();
        print_layout(&tree, &mut rendered).unwrap();
        assert!(rendered.starts_with("AmlCode\n"));
        assert!(rendered.contains("DefName"));
        assert!(rendered.contains("NameString FOO_"));
        assert!(rendered.contains("ByteData 0x2a"));
    }

    #[test]
    fn test_dead_branch_is_pruned() {
        // If (Zero) { Name(DEAD, One) } Else { Name(LIVE, One) }
        let body = [
            0xa0, 0x08, 0x00, 0x08, b'D', b'E', b'A', b'D', 0x01,
            0xa1, 0x07, 0x08, b'L', b'I', b'V', b'E', 0x01,
        ];
        let mut context = Context::new();
        let table = make_test_table(&body);
        let tree = parse_table(&mut context, &table).unwrap();

        let dead = AmlName::from_str("\\DEAD").unwrap();
        let live = AmlName::from_str("\\LIVE").unwrap();
        assert!(context.symbol(&dead).is_some());

        let interpreter = Interpreter::new(&mut context, TestHandler::new());
        let mut visitor = ConditionallyUnregisterSymbolVisitor::new(interpreter);
        visitor.run(&tree);

        assert!(context.symbol(&dead).is_none());
        assert!(context.symbol(&live).is_some());
    }

    #[test]
    fn test_undecidable_predicate_keeps_both_arms() {
        // If (DerefOf(Zero)) { Name(KEPT, One) }: the predicate fails to
        // evaluate, so the branch must not be pruned.
        let body = [0xa0, 0x09, 0x83, 0x00, 0x08, b'K', b'E', b'P', b'T', 0x01];
        let mut context = Context::new();
        let table = make_test_table(&body);
        let tree = parse_table(&mut context, &table).unwrap();

        let interpreter = Interpreter::new(&mut context, TestHandler::new());
        let mut visitor = ConditionallyUnregisterSymbolVisitor::new(interpreter);
        visitor.run(&tree);

        assert!(context.symbol(&AmlName::from_str("\\KEPT").unwrap()).is_some());
    }
}
