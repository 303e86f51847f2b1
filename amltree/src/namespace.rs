use crate::AmlError;
use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::{fmt, str};

/// A name path in the ACPI namespace, e.g. `\_SB_.PCI0._CRS` or `^^FOO`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmlName(pub(crate) Vec<NameComponent>);

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum NameComponent {
    Root,
    Prefix,
    Segment(NameSeg),
}

impl AmlName {
    pub fn root() -> AmlName {
        AmlName(alloc::vec![NameComponent::Root])
    }

    pub fn from_components(components: Vec<NameComponent>) -> AmlName {
        assert!(!components.is_empty());
        AmlName(components)
    }

    pub fn from_name_seg(seg: NameSeg) -> AmlName {
        AmlName(alloc::vec![NameComponent::Segment(seg)])
    }

    /// Parses a dotted textual path: optional leading `\` or `^` prefixes,
    /// then 4-char-or-shorter segments separated by `.`.
    pub fn from_str(string: &str) -> Result<AmlName, AmlError> {
        if string.is_empty() {
            return Err(AmlError::EmptyNamesAreInvalid);
        }

        let mut components = Vec::new();
        let mut rest = string;
        if let Some(stripped) = rest.strip_prefix('\\') {
            components.push(NameComponent::Root);
            rest = stripped;
        }

        if !rest.is_empty() {
            for mut part in rest.split('.') {
                // Prefix chars may appear on any part, not just the first.
                while let Some(stripped) = part.strip_prefix('^') {
                    components.push(NameComponent::Prefix);
                    part = stripped;
                }
                components.push(NameComponent::Segment(NameSeg::from_str(part)?));
            }
        }

        if components.is_empty() {
            return Err(AmlError::EmptyNamesAreInvalid);
        }
        Ok(AmlName(components))
    }

    pub fn as_string(&self) -> String {
        self.0
            .iter()
            .fold(String::new(), |name, component| match component {
                NameComponent::Root => name + "\\",
                NameComponent::Prefix => name + "^",
                NameComponent::Segment(seg) => {
                    if name.is_empty() || name.ends_with('\\') || name.ends_with('^') {
                        name + seg.as_str()
                    } else {
                        name + "." + seg.as_str()
                    }
                }
            })
    }

    pub fn is_absolute(&self) -> bool {
        self.0.first() == Some(&NameComponent::Root)
    }

    /// A normal name contains no prefix carets and no interior roots.
    pub fn is_normal(&self) -> bool {
        !self.0.iter().any(|component| *component == NameComponent::Prefix)
            && !self.0[1..].contains(&NameComponent::Root)
    }

    pub fn segment_count(&self) -> usize {
        self.0.iter().filter(|c| matches!(c, NameComponent::Segment(_))).count()
    }

    /// Whether the ACPI relative-name search rules apply: only single-segment
    /// names are searched outward through enclosing scopes.
    pub fn search_rules_apply(&self) -> bool {
        self.0.len() == 1 && matches!(self.0[0], NameComponent::Segment(_))
    }

    /// Collapses prefix carets by stripping segments. Fails if a caret climbs
    /// above the root.
    pub fn normalize(&self) -> Result<AmlName, AmlError> {
        let mut normalized: Vec<NameComponent> = Vec::with_capacity(self.0.len());
        for &component in &self.0 {
            match component {
                seg @ NameComponent::Segment(_) => normalized.push(seg),
                NameComponent::Root => normalized.push(NameComponent::Root),
                NameComponent::Prefix => match normalized.pop() {
                    Some(NameComponent::Segment(_)) => (),
                    _ => return Err(AmlError::InvalidNormalizedName(self.as_string())),
                },
            }
        }
        Ok(AmlName(normalized))
    }

    /// The parent scope of this (absolute, normal) name.
    pub fn parent(&self) -> Result<AmlName, AmlError> {
        assert!(self.is_absolute() && self.is_normal());
        if self.0.len() == 1 {
            return Err(AmlError::RootHasNoParent);
        }
        let mut parent = self.clone();
        parent.0.pop();
        Ok(parent)
    }

    /// Resolves this name against an absolute scope, producing an absolute,
    /// normal name. This is the scope algebra: absolute names ignore the
    /// scope, carets strip trailing scope segments, bare names append.
    pub fn resolve(&self, scope: &AmlName) -> Result<AmlName, AmlError> {
        assert!(scope.is_absolute());
        if self.is_absolute() {
            return self.normalize();
        }
        let mut combined = scope.clone().0;
        combined.extend_from_slice(&self.0);
        AmlName(combined).normalize()
    }

    /// The final segment, if the name ends in one.
    pub fn last_segment(&self) -> Option<NameSeg> {
        match self.0.last() {
            Some(NameComponent::Segment(seg)) => Some(*seg),
            _ => None,
        }
    }
}

impl fmt::Display for AmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl fmt::Debug for AmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AmlName({:?})", self.as_string())
    }
}

/// A single 4-character name segment, padded with underscores.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameSeg(pub(crate) [u8; 4]);

impl NameSeg {
    pub fn from_str(string: &str) -> Result<NameSeg, AmlError> {
        if string.is_empty() || string.len() > 4 {
            return Err(AmlError::InvalidNameSeg);
        }

        let bytes = string.as_bytes();
        if !is_lead_name_char(bytes[0]) {
            return Err(AmlError::InvalidNameSeg);
        }

        // Pre-filling with '_' makes short segments come out correctly padded.
        let mut seg = [b'_'; 4];
        seg[0] = bytes[0];
        for i in 1..bytes.len() {
            if !is_name_char(bytes[i]) {
                return Err(AmlError::InvalidNameSeg);
            }
            seg[i] = bytes[i];
        }
        Ok(NameSeg(seg))
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Result<NameSeg, AmlError> {
        if !is_lead_name_char(bytes[0])
            || !bytes[1..].iter().all(|&b| is_name_char(b))
        {
            return Err(AmlError::InvalidNameSeg);
        }
        Ok(NameSeg(bytes))
    }

    pub fn as_str(&self) -> &str {
        // Always ASCII by construction.
        unsafe { str::from_utf8_unchecked(&self.0) }
    }

    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Debug for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

pub(crate) fn is_lead_name_char(byte: u8) -> bool {
    byte.is_ascii_uppercase() || byte == b'_'
}

pub(crate) fn is_name_char(byte: u8) -> bool {
    is_lead_name_char(byte) || byte.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_seg() {
        assert_eq!(NameSeg::from_str("_CRS").unwrap().bytes(), *b"_CRS");
        assert_eq!(NameSeg::from_str("AB").unwrap().bytes(), *b"AB__");
        assert!(NameSeg::from_str("").is_err());
        assert!(NameSeg::from_str("1ABC").is_err());
        assert!(NameSeg::from_str("TOOLONG").is_err());
        assert!(NameSeg::from_bytes(*b"ab__").is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(AmlName::from_str("\\").unwrap(), AmlName::root());
        assert_eq!(
            AmlName::from_str("\\_SB_.PCI0").unwrap().as_string(),
            "\\_SB_.PCI0"
        );
        assert_eq!(AmlName::from_str("^^FOO").unwrap().as_string(), "^^FOO_");
        assert_eq!(
            AmlName::from_str("\\_SB_.^PCI0").unwrap(),
            AmlName(alloc::vec![
                NameComponent::Root,
                NameComponent::Segment(NameSeg::from_str("_SB_").unwrap()),
                NameComponent::Prefix,
                NameComponent::Segment(NameSeg::from_str("PCI0").unwrap()),
            ])
        );
        assert!(AmlName::from_str("").is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            AmlName::from_str("\\_SB_.^PCI0").unwrap().normalize().unwrap(),
            AmlName::from_str("\\PCI0").unwrap()
        );
        assert!(AmlName::from_str("^FOO_").unwrap().normalize().is_err());
    }

    #[test]
    fn test_resolve() {
        let scope = AmlName::from_str("\\A___.B___").unwrap();
        assert_eq!(
            AmlName::from_str("^C___").unwrap().resolve(&scope).unwrap().as_string(),
            "\\A___.C___"
        );
        assert_eq!(
            AmlName::from_str("\\D___").unwrap().resolve(&scope).unwrap().as_string(),
            "\\D___"
        );
        assert_eq!(
            AmlName::from_str("X___").unwrap().resolve(&AmlName::root()).unwrap().as_string(),
            "\\X___"
        );
    }

    #[test]
    fn test_parent() {
        let name = AmlName::from_str("\\_SB_.PCI0").unwrap();
        assert_eq!(name.parent().unwrap().as_string(), "\\_SB_");
        assert_eq!(name.parent().unwrap().parent().unwrap(), AmlName::root());
        assert!(AmlName::root().parent().is_err());
    }

    #[test]
    fn test_search_rules() {
        assert!(AmlName::from_str("_HID").unwrap().search_rules_apply());
        assert!(!AmlName::from_str("\\_HID").unwrap().search_rules_apply());
        assert!(!AmlName::from_str("A___.B___").unwrap().search_rules_apply());
    }
}
