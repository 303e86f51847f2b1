use crate::{
    grammar::{self, Construct},
    namespace::AmlName,
    AmlError,
};
use alloc::{string::String, vec::Vec};

/// The payload a tree node carries besides its children.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NodeValue {
    None,
    Integer(u64),
    String(String),
    Bytes(Vec<u8>),
    Name(AmlName),
}

/// A byte range whose expansion was postponed to the second parsing pass,
/// either because it is a method body or because its first parse tripped over
/// a name that was not yet defined.
#[derive(Clone, Debug)]
pub struct DeferredRange {
    /// Absolute offset of the construct's opcode in the table stream.
    pub start: usize,
    /// Absolute offset one past the end of the construct's package.
    pub end: usize,
    /// The namespace scope that was current when the range was recorded.
    pub scope: AmlName,
    /// Expansion attempts so far. A range is abandoned after two.
    pub attempts: u8,
}

/// A node of the AML parse tree. The tree mirrors the grammar: a sequence
/// construct's children appear in layout order, so the accessor names from
/// [`grammar::field_names`] index into `children` directly.
#[derive(Clone, Debug)]
pub struct Tree {
    pub construct: Construct,
    pub value: NodeValue,
    pub children: Vec<Tree>,
    /// The absolute namespace scope this node was parsed (or built) under.
    pub scope: AmlName,
    pub deferred: Option<DeferredRange>,
}

impl Tree {
    pub fn new(construct: Construct, scope: AmlName) -> Tree {
        Tree { construct, value: NodeValue::None, children: Vec::new(), scope, deferred: None }
    }

    pub fn with_value(construct: Construct, scope: AmlName, value: NodeValue) -> Tree {
        Tree { construct, value, children: Vec::new(), scope, deferred: None }
    }

    pub fn push_child(&mut self, child: Tree) {
        self.children.push(child);
    }

    /// Looks up a direct child by its grammar accessor name.
    pub fn child(&self, name: &str) -> Option<&Tree> {
        let index = grammar::field_names(self.construct).iter().position(|&n| n == name)?;
        self.children.get(index)
    }

    /// Like [`Tree::child`], but a missing child is an error.
    pub fn required(&self, name: &'static str) -> Result<&Tree, AmlError> {
        self.child(name).ok_or(AmlError::MissingTreeField(self.construct, name))
    }

    pub fn as_integer(&self) -> Result<u64, AmlError> {
        match self.value {
            NodeValue::Integer(value) => Ok(value),
            _ => Err(AmlError::WrongNodeValue(self.construct)),
        }
    }

    pub fn as_name(&self) -> Result<&AmlName, AmlError> {
        match &self.value {
            NodeValue::Name(name) => Ok(name),
            _ => Err(AmlError::WrongNodeValue(self.construct)),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], AmlError> {
        match &self.value {
            NodeValue::Bytes(bytes) => Ok(bytes),
            _ => Err(AmlError::WrongNodeValue(self.construct)),
        }
    }

    pub fn as_str(&self) -> Result<&str, AmlError> {
        match &self.value {
            NodeValue::String(string) => Ok(string),
            _ => Err(AmlError::WrongNodeValue(self.construct)),
        }
    }

    /// Depth-first walk. `visit` returning `false` skips the node's children;
    /// `depart` runs after a node's children have been walked.
    pub fn walk<V: Visitor>(&self, visitor: &mut V) {
        if visitor.visit(self) {
            for child in &self.children {
                child.walk(visitor);
            }
        }
        visitor.depart(self);
    }
}

pub trait Visitor {
    fn visit(&mut self, tree: &Tree) -> bool;
    fn depart(&mut self, _tree: &Tree) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_child() {
        let scope = AmlName::root();
        let mut node = Tree::new(Construct::DefOpRegion, scope.clone());
        node.push_child(Tree::with_value(
            Construct::NameString,
            scope.clone(),
            NodeValue::Name(AmlName::from_str("GPIO").unwrap()),
        ));
        node.push_child(Tree::with_value(Construct::ByteData, scope.clone(), NodeValue::Integer(1)));

        assert_eq!(node.child("RegionSpace").unwrap().as_integer(), Ok(1));
        assert_eq!(
            node.child("NameString").unwrap().as_name().unwrap().as_string(),
            "GPIO"
        );
        assert!(node.child("RegionLen").is_none());
        assert!(node.child("NoSuchField").is_none());
    }

    #[test]
    fn test_walk_order() {
        struct Collect(Vec<Construct>);
        impl Visitor for Collect {
            fn visit(&mut self, tree: &Tree) -> bool {
                self.0.push(tree.construct);
                true
            }
        }

        let scope = AmlName::root();
        let mut root = Tree::new(Construct::TermList, scope.clone());
        let mut device = Tree::new(Construct::DefDevice, scope.clone());
        device.push_child(Tree::new(Construct::NameString, scope.clone()));
        root.push_child(device);
        root.push_child(Tree::new(Construct::DefNoop, scope));

        let mut collect = Collect(Vec::new());
        root.walk(&mut collect);
        assert_eq!(
            collect.0,
            alloc::vec![
                Construct::TermList,
                Construct::DefDevice,
                Construct::NameString,
                Construct::DefNoop
            ]
        );
    }
}
