//! The namespace context: every declaration the parser encounters, keyed by
//! absolute path, plus the scope stack tracking where in the namespace the
//! parser or interpreter currently sits, and the binding table holding the
//! evaluated value of each named object.

use crate::{
    namespace::AmlName,
    object::Object,
    tree::Tree,
    AmlError,
};
use alloc::{collections::BTreeMap, string::String, vec::Vec};
use log::debug;

#[derive(Clone, Debug)]
pub struct NamedDecl {
    pub name: AmlName,
    /// The defining `DefName` node, absent for predefined names.
    pub tree: Option<Tree>,
}

#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub name: AmlName,
    pub arg_count: usize,
    pub flags: u8,
    /// The defining `DefMethod` node, attached once deferred expansion is done.
    pub tree: Option<Tree>,
}

type NativeMethod = fn(&[Object]) -> Result<Object, AmlError>;

#[derive(Clone)]
pub struct PredefinedMethodDecl {
    pub name: AmlName,
    pub arg_count: usize,
    pub handler: NativeMethod,
}

impl core::fmt::Debug for PredefinedMethodDecl {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PredefinedMethodDecl({}, args={})", self.name, self.arg_count)
    }
}

#[derive(Clone, Debug)]
pub struct OperationRegionDecl {
    pub name: AmlName,
    /// The defining `DefOpRegion` node; space, offset and length live in it
    /// and are evaluated when the region is first accessed.
    pub tree: Option<Tree>,
}

/// Where an operation field's bits actually live.
#[derive(Clone, Debug)]
pub enum FieldSource {
    /// A plain `Field` over an operation region.
    Region(AmlName),
    /// An `IndexField` pair: write the index field, access the data field.
    Index { index_field: AmlName, data_field: AmlName },
}

#[derive(Clone, Debug)]
pub struct OperationFieldDecl {
    pub name: AmlName,
    pub source: FieldSource,
    pub bit_offset: u64,
    pub bit_length: u64,
    /// Access width in bits, decoded from the field flags.
    pub access_width: usize,
    pub flags: u8,
}

#[derive(Clone, Debug)]
pub struct AliasDecl {
    pub name: AmlName,
    pub target: AmlName,
}

#[derive(Clone, Debug)]
pub struct DeviceDecl {
    pub name: AmlName,
    pub tree: Option<Tree>,
}

#[derive(Clone, Debug)]
pub struct ExternalDecl {
    pub name: AmlName,
    pub object_type: u8,
    pub arg_count: u8,
}

#[derive(Clone, Debug)]
pub enum Symbol {
    Name(NamedDecl),
    Method(MethodDecl),
    PredefinedMethod(PredefinedMethodDecl),
    OpRegion(OperationRegionDecl),
    OpField(OperationFieldDecl),
    Alias(AliasDecl),
    Device(DeviceDecl),
    External(ExternalDecl),
}

impl Symbol {
    pub fn name(&self) -> &AmlName {
        match self {
            Symbol::Name(decl) => &decl.name,
            Symbol::Method(decl) => &decl.name,
            Symbol::PredefinedMethod(decl) => &decl.name,
            Symbol::OpRegion(decl) => &decl.name,
            Symbol::OpField(decl) => &decl.name,
            Symbol::Alias(decl) => &decl.name,
            Symbol::Device(decl) => &decl.name,
            Symbol::External(decl) => &decl.name,
        }
    }

    /// The number of arguments this symbol consumes when invoked by name, if
    /// it is invocable.
    pub fn arg_count(&self) -> Option<usize> {
        match self {
            Symbol::Method(decl) => Some(decl.arg_count),
            Symbol::PredefinedMethod(decl) => Some(decl.arg_count),
            Symbol::External(decl) if decl.object_type == 8 => Some(decl.arg_count as usize),
            _ => None,
        }
    }
}

pub struct Context {
    symbols: BTreeMap<AmlName, Symbol>,
    bindings: BTreeMap<AmlName, Object>,
    scope_stack: Vec<AmlName>,
    /// Once a definition block has been fully loaded, remaining `External`
    /// declarations refer to symbols no table provides, and lookups treat
    /// them as undefined.
    pub skip_external_on_lookup: bool,
}

impl Context {
    pub fn new() -> Context {
        let mut context = Context {
            symbols: BTreeMap::new(),
            bindings: BTreeMap::new(),
            scope_stack: Vec::new(),
            skip_external_on_lookup: false,
        };
        context.register_predefined();
        context
    }

    fn register_predefined(&mut self) {
        for name in ["\\_GL_", "\\_OS_", "\\_REV", "\\_DLM"] {
            let name = AmlName::from_str(name).unwrap();
            self.register_symbol(Symbol::Name(NamedDecl { name, tree: None }));
        }
        self.register_symbol(Symbol::PredefinedMethod(PredefinedMethodDecl {
            name: AmlName::from_str("\\_OSI").unwrap(),
            arg_count: 1,
            handler: predefined_osi,
        }));
    }

    pub fn current_scope(&self) -> AmlName {
        self.scope_stack.last().cloned().unwrap_or_else(AmlName::root)
    }

    pub fn push_scope(&mut self, scope: AmlName) {
        assert!(scope.is_absolute());
        self.scope_stack.push(scope);
    }

    pub fn pop_scope(&mut self) {
        self.scope_stack.pop();
    }

    /// Registers a symbol under its absolute name.
    ///
    /// An `External` declaration never displaces a real definition, and a real
    /// definition always displaces a placeholder `External`. A genuine
    /// redefinition keeps the newer symbol.
    pub fn register_symbol(&mut self, symbol: Symbol) {
        let name = symbol.name().clone();
        assert!(name.is_absolute() && name.is_normal());

        match self.symbols.get(&name) {
            Some(Symbol::External(_)) | None => {
                self.symbols.insert(name, symbol);
            }
            Some(_existing) => {
                if matches!(symbol, Symbol::External(_)) {
                    return;
                }
                debug!("redefinition of {}, keeping the newer symbol", name);
                self.symbols.insert(name, symbol);
            }
        }
    }

    pub fn unregister_symbol(&mut self, name: &AmlName) {
        self.symbols.remove(name);
        self.bindings.remove(name);
    }

    /// Looks up a name from the current scope, applying the outward search
    /// rules for single-segment relative names.
    pub fn lookup(&self, name: &AmlName) -> Result<(AmlName, &Symbol), AmlError> {
        self.lookup_in(name, &self.current_scope())
    }

    pub fn lookup_in(
        &self,
        name: &AmlName,
        scope: &AmlName,
    ) -> Result<(AmlName, &Symbol), AmlError> {
        if name.search_rules_apply() {
            let mut search = scope.clone();
            loop {
                let candidate = name.resolve(&search)?;
                if let Some(symbol) = self.visible_symbol(&candidate) {
                    return Ok((candidate, symbol));
                }
                match search.parent() {
                    Ok(parent) => search = parent,
                    Err(_) => break,
                }
            }
            Err(AmlError::UndefinedSymbol(name.as_string()))
        } else {
            let resolved = name.resolve(scope)?;
            self.visible_symbol(&resolved)
                .map(|symbol| (resolved, symbol))
                .ok_or(AmlError::UndefinedSymbol(name.as_string()))
        }
    }

    fn visible_symbol(&self, name: &AmlName) -> Option<&Symbol> {
        match self.symbols.get(name) {
            Some(Symbol::External(_)) if self.skip_external_on_lookup => None,
            other => other,
        }
    }

    /// Direct lookup by absolute path, externals included.
    pub fn symbol(&self, name: &AmlName) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn symbol_mut(&mut self, name: &AmlName) -> Option<&mut Symbol> {
        self.symbols.get_mut(name)
    }

    /// Whether `name` resolves to anything from `scope`, under the current
    /// lookup mode.
    pub fn has_symbol(&self, name: &AmlName, scope: &AmlName) -> bool {
        self.lookup_in(name, scope).is_ok()
    }

    /// All declared devices in namespace order.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceDecl> {
        self.symbols.values().filter_map(|symbol| match symbol {
            Symbol::Device(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn symbols(&self) -> impl Iterator<Item = (&AmlName, &Symbol)> {
        self.symbols.iter()
    }

    pub fn set_binding(&mut self, name: AmlName, value: Object) {
        assert!(name.is_absolute());
        self.bindings.insert(name, value);
    }

    pub fn binding(&self, name: &AmlName) -> Option<&Object> {
        self.bindings.get(name)
    }

}

impl Default for Context {
    fn default() -> Context {
        Context::new()
    }
}

/// `_OSI` is answered permissively: every feature string is supported except
/// the operating-system families that guests should not impersonate.
fn predefined_osi(args: &[Object]) -> Result<Object, AmlError> {
    let feature = match args.first() {
        Some(Object::String(string)) => string.clone(),
        Some(other) => other.to_aml_string()?,
        None => String::new(),
    };

    let denied = ["Windows", "FreeBSD", "HP-UX", "OpenVMS"];
    if denied.iter().any(|prefix| feature.starts_with(prefix)) {
        Ok(Object::Integer(0))
    } else {
        Ok(Object::Integer(0xffff_ffff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(path: &str) -> Symbol {
        Symbol::Name(NamedDecl { name: AmlName::from_str(path).unwrap(), tree: None })
    }

    fn external(path: &str) -> Symbol {
        Symbol::External(ExternalDecl {
            name: AmlName::from_str(path).unwrap(),
            object_type: 8,
            arg_count: 2,
        })
    }

    #[test]
    fn test_external_precedence() {
        let mut context = Context::new();
        context.register_symbol(external("\\FOO_"));
        context.register_symbol(Symbol::Method(MethodDecl {
            name: AmlName::from_str("\\FOO_").unwrap(),
            arg_count: 1,
            flags: 1,
            tree: None,
        }));
        // The real definition wins over the placeholder.
        assert!(matches!(context.symbol(&AmlName::from_str("\\FOO_").unwrap()), Some(Symbol::Method(_))));

        // And a later External does not displace it.
        context.register_symbol(external("\\FOO_"));
        assert!(matches!(context.symbol(&AmlName::from_str("\\FOO_").unwrap()), Some(Symbol::Method(_))));
    }

    #[test]
    fn test_outward_search() {
        let mut context = Context::new();
        context.register_symbol(named("\\_SB_.HPET"));
        context.push_scope(AmlName::from_str("\\_SB_.PCI0.ISA_").unwrap());

        let (path, _) = context.lookup(&AmlName::from_str("HPET").unwrap()).unwrap();
        assert_eq!(path.as_string(), "\\_SB_.HPET");

        // Multi-segment relative names do not search outward.
        assert!(context.lookup(&AmlName::from_str("PCI0.HPET").unwrap()).is_err());
    }

    #[test]
    fn test_skip_external() {
        let mut context = Context::new();
        context.register_symbol(external("\\EXT_"));
        assert!(context.lookup(&AmlName::from_str("\\EXT_").unwrap()).is_ok());
        context.skip_external_on_lookup = true;
        assert!(context.lookup(&AmlName::from_str("\\EXT_").unwrap()).is_err());
        // Predefined methods stay visible.
        assert!(context.lookup(&AmlName::from_str("\\_OSI").unwrap()).is_ok());
    }

    #[test]
    fn test_predefined_osi() {
        let call = |s: &str| {
            predefined_osi(&[Object::String(String::from(s))]).unwrap().to_integer().unwrap()
        };
        assert_eq!(call("Linux"), 0xffff_ffff);
        assert_eq!(call("Windows 2015"), 0);
        assert_eq!(call("FreeBSD"), 0);
        assert_eq!(call("Extended Address Space Descriptor"), 0xffff_ffff);
    }
}
